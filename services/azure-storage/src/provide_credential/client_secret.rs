// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use sasflow_core::time::now;
use sasflow_core::utils::Redact;
use sasflow_core::{Context, Error, ErrorKind, ProvideCredential, Result};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};

use crate::constants::*;
use crate::{BearerToken, Config};

/// Exchange a service principal's client secret for a bearer token.
///
/// Every field is passed in explicitly; the provider never looks at the
/// environment.
///
/// Reference: <https://learn.microsoft.com/en-us/entra/identity-platform/v2-oauth2-client-creds-grant-flow>
#[derive(Clone)]
pub struct ClientSecretCredentialProvider {
    authority_host: String,
    tenant_id: String,
    grant_type: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

impl Debug for ClientSecretCredentialProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredentialProvider")
            .field("authority_host", &self.authority_host)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &Redact::from(&self.client_secret))
            .field("scope", &self.scope)
            .finish()
    }
}

impl ClientSecretCredentialProvider {
    /// Create a provider for the public cloud with the storage scope.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            authority_host: AZURE_PUBLIC_CLOUD.to_string(),
            tenant_id: tenant_id.into(),
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: DEFAULT_STORAGE_SCOPE.to_string(),
        }
    }

    /// Create a provider from the identity part of [`Config`].
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            authority_host: cfg.authority_host.clone(),
            tenant_id: cfg.tenant_id.clone(),
            grant_type: cfg.grant_type.clone(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            scope: cfg.scope.clone(),
        }
    }

    /// Set the authority host, e.g. `https://login.microsoftonline.com/`.
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into();
        self
    }

    fn token_url(&self) -> String {
        let host = self.authority_host.trim_end_matches('/');
        format!("{host}/{}/oauth2/v2.0/token", self.tenant_id)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[async_trait]
impl ProvideCredential for ClientSecretCredentialProvider {
    type Credential = BearerToken;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let url = self.token_url();
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", &self.grant_type)
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .append_pair("scope", &self.scope)
            .finish();

        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(&url)
            .header(
                http::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Bytes::from(body))
            .map_err(|e| {
                Error::request_invalid("failed to build token request").with_source(e)
            })?;

        debug!("requesting bearer token from {url}");
        let resp = ctx
            .http_send(req)
            .await
            .map_err(|e| e.with_kind(ErrorKind::Auth))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = String::from_utf8_lossy(resp.body());
            return Err(Error::auth(format!(
                "token request failed with status {status}: {body}"
            ))
            .with_context(format!("url: {url}")));
        }

        let token: TokenResponse = serde_json::from_slice(resp.body())
            .map_err(|e| Error::auth("failed to parse token response").with_source(e))?;
        let access_token = match token.access_token {
            Some(v) if !v.is_empty() => v,
            _ => return Err(Error::auth("token response has no access_token")),
        };
        let expires_in = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let lifetime = chrono::TimeDelta::try_seconds(expires_in as i64)
            .unwrap_or_else(|| chrono::TimeDelta::seconds(DEFAULT_TOKEN_LIFETIME_SECS as i64));
        let expires_at = now() + lifetime;

        debug!(
            "got bearer token {} expiring at {expires_at}",
            Redact::from(&access_token)
        );
        Ok(Some(BearerToken::new(access_token, expires_at)))
    }
}
