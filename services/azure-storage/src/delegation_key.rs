use std::fmt::{Debug, Formatter};
use std::time::Duration;

use bytes::Bytes;
use log::debug;
use sasflow_core::time::{format_rfc3339, now};
use sasflow_core::utils::Redact;
use sasflow_core::{CredentialCache, Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::constants::*;
use crate::BearerToken;

/// A user delegation key issued by the storage account.
///
/// `signed_start`/`signed_expiry` bound the key's own validity. `value` is
/// the base64 signing secret; it is zeroed on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct UserDelegationKey {
    /// Object id of the principal the key was issued to.
    pub signed_oid: String,
    /// Tenant id of that principal.
    pub signed_tid: String,
    /// Start of the key's validity window.
    pub signed_start: String,
    /// End of the key's validity window.
    pub signed_expiry: String,
    /// Service the key is valid for, `b` for blob.
    pub signed_service: String,
    /// Storage version used to issue the key.
    pub signed_version: String,
    value: Zeroizing<String>,
}

impl UserDelegationKey {
    /// Assemble a key from its components, e.g. one obtained out of band.
    pub fn new(
        signed_oid: impl Into<String>,
        signed_tid: impl Into<String>,
        signed_start: impl Into<String>,
        signed_expiry: impl Into<String>,
        signed_service: impl Into<String>,
        signed_version: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            signed_oid: signed_oid.into(),
            signed_tid: signed_tid.into(),
            signed_start: signed_start.into(),
            signed_expiry: signed_expiry.into(),
            signed_service: signed_service.into(),
            signed_version: signed_version.into(),
            value: Zeroizing::new(value.into()),
        }
    }

    /// The base64 encoded key value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Debug for UserDelegationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDelegationKey")
            .field("signed_oid", &self.signed_oid)
            .field("signed_tid", &self.signed_tid)
            .field("signed_start", &self.signed_start)
            .field("signed_expiry", &self.signed_expiry)
            .field("signed_service", &self.signed_service)
            .field("signed_version", &self.signed_version)
            .field("value", &Redact::from(self.value.as_str()))
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename = "KeyInfo", rename_all = "PascalCase")]
struct KeyInfo {
    start: String,
    expiry: String,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct UserDelegationKeyResponse {
    signed_oid: Option<String>,
    signed_tid: Option<String>,
    signed_start: Option<String>,
    signed_expiry: Option<String>,
    signed_service: Option<String>,
    signed_version: Option<String>,
    value: Option<String>,
}

impl TryFrom<UserDelegationKeyResponse> for UserDelegationKey {
    type Error = Error;

    fn try_from(resp: UserDelegationKeyResponse) -> Result<Self> {
        fn required(v: Option<String>, name: &str) -> Result<String> {
            v.filter(|v| !v.is_empty()).ok_or_else(|| {
                Error::delegation_key(format!("delegation key response is missing {name}"))
            })
        }

        Ok(Self {
            signed_oid: required(resp.signed_oid, "SignedOid")?,
            signed_tid: required(resp.signed_tid, "SignedTid")?,
            signed_start: required(resp.signed_start, "SignedStart")?,
            signed_expiry: required(resp.signed_expiry, "SignedExpiry")?,
            signed_service: required(resp.signed_service, "SignedService")?,
            signed_version: required(resp.signed_version, "SignedVersion")?,
            value: Zeroizing::new(required(resp.value, "Value")?),
        })
    }
}

/// Parse the body of a Get User Delegation Key response.
fn parse_delegation_key(body: &str) -> Result<UserDelegationKey> {
    let body = body.trim_start_matches('\u{feff}');
    let resp: UserDelegationKeyResponse = quick_xml::de::from_str(body).map_err(|e| {
        Error::delegation_key("failed to parse delegation key response").with_source(e)
    })?;
    resp.try_into()
}

/// Requests user delegation keys from a storage account.
///
/// Reference: <https://learn.microsoft.com/en-us/rest/api/storageservices/get-user-delegation-key>
#[derive(Clone, Debug)]
pub struct DelegationKeyClient {
    cache: CredentialCache<BearerToken>,
    root: String,
}

impl DelegationKeyClient {
    /// Create a client for the storage account at `root`.
    pub fn new(cache: CredentialCache<BearerToken>, root: impl Into<String>) -> Self {
        let mut root = root.into();
        if !root.ends_with('/') {
            root.push('/');
        }
        Self { cache, root }
    }

    /// Request a key valid from now for `valid_for`.
    pub async fn get_delegation_key(&self, valid_for: Duration) -> Result<UserDelegationKey> {
        let valid_for = chrono::TimeDelta::from_std(valid_for)
            .map_err(|e| Error::delegation_key("key validity is out of range").with_source(e))?;
        let start = now();
        let expiry = start + valid_for;

        let key_info = KeyInfo {
            start: format_rfc3339(start),
            expiry: format_rfc3339(expiry),
        };
        let xml = quick_xml::se::to_string(&key_info).map_err(|e| {
            Error::delegation_key("failed to serialize key info").with_source(e)
        })?;
        let body = format!(r#"<?xml version="1.0" encoding="utf-8"?>{xml}"#);

        let token = self.cache.get().await?;
        let url = format!("{}?restype=service&comp=userdelegationkey", self.root);
        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(&url)
            .header(http::header::AUTHORIZATION, token.authorization())
            .header(X_MS_VERSION, DELEGATION_KEY_VERSION)
            .header(http::header::CONTENT_TYPE, "application/xml")
            .body(Bytes::from(body))
            .map_err(|e| {
                Error::request_invalid("failed to build delegation key request").with_source(e)
            })?;

        debug!(
            "requesting delegation key from {url} valid {} to {}",
            key_info.start, key_info.expiry
        );
        let resp = self
            .cache
            .context()
            .http_send_as_string(req)
            .await
            .map_err(|e| e.with_kind(ErrorKind::DelegationKey))?;

        if !resp.status().is_success() {
            return Err(Error::delegation_key(format!(
                "delegation key request failed with status {}: {}",
                resp.status(),
                resp.body()
            ))
            .with_context(format!("url: {url}")));
        }

        let key = parse_delegation_key(resp.body())?;
        debug!("got delegation key {key:?}");
        Ok(key)
    }
}
