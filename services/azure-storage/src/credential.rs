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

use std::fmt::{Debug, Formatter};

use sasflow_core::time::{now, DateTime};
use sasflow_core::utils::Redact;
use sasflow_core::SigningCredential;

use crate::constants::TOKEN_EXPIRY_MARGIN_SECS;

/// An OAuth2 bearer token issued by the identity endpoint.
///
/// Tokens are immutable values. A refresh produces a new token which replaces
/// the old one in its holder.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
    expires_at: DateTime,
}

impl BearerToken {
    /// Create a bearer token which expires at `expires_at`.
    pub fn new(token: impl Into<String>, expires_at: DateTime) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// The raw token value, ready for an `Authorization: Bearer` header.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The instant reported by the identity endpoint.
    pub fn expires_at(&self) -> DateTime {
        self.expires_at
    }

    /// The last instant this token may be handed out.
    pub fn refresh_at(&self) -> DateTime {
        self.expires_at - chrono::TimeDelta::seconds(TOKEN_EXPIRY_MARGIN_SECS)
    }

    pub(crate) fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl Debug for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &Redact::from(&self.token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl SigningCredential for BearerToken {
    fn is_valid(&self) -> bool {
        !self.token.is_empty() && now() < self.refresh_at()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_fresh_token_is_valid() {
        let token = BearerToken::new("eyJ0eXAi", now() + TimeDelta::seconds(3600));
        assert!(token.is_valid());
    }

    #[test]
    fn test_token_inside_margin_is_invalid() {
        let token = BearerToken::new("eyJ0eXAi", now() + TimeDelta::seconds(59));
        assert!(!token.is_valid());

        let token = BearerToken::new("eyJ0eXAi", now() + TimeDelta::seconds(61));
        assert!(token.is_valid());
    }

    #[test]
    fn test_empty_token_is_invalid() {
        let token = BearerToken::new("", now() + TimeDelta::seconds(3600));
        assert!(!token.is_valid());
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = BearerToken::new("eyJ0eXAiOiJKV1QiLCJhbGciOi", now());
        let out = format!("{token:?}");
        assert!(!out.contains("eyJ0eXAiOiJKV1QiLCJhbGciOi"));
        assert!(out.contains("eyJ***iOi"));
    }
}
