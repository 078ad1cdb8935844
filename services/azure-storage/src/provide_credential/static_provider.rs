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
use sasflow_core::{Context, ProvideCredential, Result};

use crate::BearerToken;

/// Hands out a fixed bearer token.
///
/// Useful when the token is obtained out of band, and in tests.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    credential: BearerToken,
}

impl StaticCredentialProvider {
    /// Create a provider that always returns `token`.
    pub fn new(token: BearerToken) -> Self {
        Self { credential: token }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = BearerToken;

    async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use sasflow_core::time::now;

    #[tokio::test]
    async fn test_static_credential_provider() {
        let expires_at = now() + TimeDelta::hours(1);
        let provider = StaticCredentialProvider::new(BearerToken::new("token", expires_at));

        let cred = provider
            .provide_credential(&Context::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cred.token(), "token");
        assert_eq!(cred.expires_at(), expires_at);
    }
}
