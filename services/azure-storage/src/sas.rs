//! User delegation shared access signatures.
//!
//! Reference: <https://learn.microsoft.com/en-us/rest/api/storageservices/create-user-delegation-sas>

use std::fmt::{Debug, Display, Formatter};

use log::debug;
use percent_encoding::utf8_percent_encode;
use sasflow_core::hash::{base64_decode, base64_hmac_sha256};
use sasflow_core::time::{format_rfc3339, DateTime};
use sasflow_core::utils::redact_query_param;
use sasflow_core::{Error, Result};
use zeroize::Zeroizing;

use crate::constants::*;
use crate::{BlobPath, UserDelegationKey};

/// Permissions granted by a SAS.
///
/// Only read access can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SasPermissions {
    read: bool,
}

impl SasPermissions {
    /// Read the content, properties and metadata of a blob.
    pub fn read() -> Self {
        Self { read: true }
    }

    fn as_str(&self) -> &'static str {
        if self.read {
            "r"
        } else {
            ""
        }
    }
}

/// A signed blob url.
///
/// The url is a credential: `Debug` and `Display` redact the signature.
#[derive(Clone, PartialEq, Eq)]
pub struct SasToken {
    url: String,
    expiry: String,
}

impl SasToken {
    /// The full url including the signed query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The query string alone, without the leading `?`.
    pub fn query(&self) -> &str {
        self.url
            .split_once('?')
            .map(|(_, q)| q)
            .unwrap_or_default()
    }

    /// The signed expiry (`se`) of this token.
    pub fn expiry(&self) -> &str {
        &self.expiry
    }
}

impl Debug for SasToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SasToken")
            .field("url", &redact_query_param(&self.url, "sig"))
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl Display for SasToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&redact_query_param(&self.url, "sig"))
    }
}

/// Signs read-only blob SAS urls with a user delegation key.
///
/// Signing is pure: the same key, path and window always yield the same url.
#[derive(Clone, Debug)]
pub struct UserDelegationSasSigner {
    permissions: SasPermissions,
}

impl Default for UserDelegationSasSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDelegationSasSigner {
    /// Create a signer granting read access.
    pub fn new() -> Self {
        Self {
            permissions: SasPermissions::read(),
        }
    }

    /// Sign a url valid for the key's own window.
    pub fn sign(&self, key: &UserDelegationKey, path: &BlobPath) -> Result<SasToken> {
        self.sign_with_window(key, path, &key.signed_start, &key.signed_expiry)
    }

    /// Sign a url valid between `start` and `expiry`.
    ///
    /// Use this to grant a window shorter than the key's. Storage rejects a
    /// token whose window falls outside the key's.
    pub fn sign_for(
        &self,
        key: &UserDelegationKey,
        path: &BlobPath,
        start: DateTime,
        expiry: DateTime,
    ) -> Result<SasToken> {
        if expiry <= start {
            return Err(Error::signing("sas expiry must be after its start"));
        }
        self.sign_with_window(
            key,
            path,
            &format_rfc3339(start),
            &format_rfc3339(expiry),
        )
    }

    fn sign_with_window(
        &self,
        key: &UserDelegationKey,
        path: &BlobPath,
        start: &str,
        expiry: &str,
    ) -> Result<SasToken> {
        let string_to_sign = self.string_to_sign(key, &path.canonical_resource(), start, expiry);
        debug!("calculated sas string to sign: {string_to_sign:?}");

        let key_bytes = Zeroizing::new(base64_decode(key.value()).map_err(|e| {
            Error::signing("delegation key value is not valid base64").with_source(e)
        })?);
        let signature = base64_hmac_sha256(&key_bytes, string_to_sign.as_bytes())
            .map_err(|e| Error::signing("failed to compute sas signature").with_source(e))?;
        let signature = utf8_percent_encode(&signature, &SAS_SIGNATURE_ENCODE_SET);

        let url = format!(
            "{}?sp={}&st={start}&se={expiry}&skoid={}&sktid={}&skt={}&ske={}&sks={SAS_SIGNED_KEY_SERVICE}&skv={}&spr={SAS_SIGNED_PROTOCOL}&sv={SAS_STORAGE_VERSION}&sr={SAS_SIGNED_RESOURCE_BLOB}&sig={signature}",
            path.url(),
            self.permissions.as_str(),
            key.signed_oid,
            key.signed_tid,
            key.signed_start,
            key.signed_expiry,
            key.signed_version,
        );

        Ok(SasToken {
            url,
            expiry: expiry.to_string(),
        })
    }

    /// Build the canonical string for version 2020-12-06.
    ///
    /// Unused optional fields are kept as empty lines; the final field is
    /// empty and has no trailing newline.
    pub fn string_to_sign(
        &self,
        key: &UserDelegationKey,
        canonical_resource: &str,
        start: &str,
        expiry: &str,
    ) -> String {
        [
            self.permissions.as_str(),
            start,
            expiry,
            canonical_resource,
            &key.signed_oid,
            &key.signed_tid,
            &key.signed_start,
            &key.signed_expiry,
            SAS_SIGNED_KEY_SERVICE,
            &key.signed_version,
            // authorized user, unauthorized user, correlation id, ip range
            "",
            "",
            "",
            "",
            SAS_SIGNED_PROTOCOL,
            SAS_STORAGE_VERSION,
            SAS_SIGNED_RESOURCE_BLOB,
            // snapshot time, encryption scope, rscc, rscd, rsce, rscl, rsct
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use sasflow_core::ErrorKind;

    const KEY_VALUE: &str = "dGhpcyBpcyBhIHRlc3QgZGVsZWdhdGlvbiBrZXkhISE=";
    const EXPECTED_SIG: &str = "NXHCERZ70rrJ8X40IkF5DUXlqvet5PsO5s8nh2e%2FLOc%3D";

    fn key(value: &str) -> UserDelegationKey {
        UserDelegationKey::new(
            "00000000-0000-0000-0000-000000000001",
            "00000000-0000-0000-0000-000000000002",
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00Z",
            "b",
            "2020-12-06",
            value,
        )
    }

    fn path() -> BlobPath {
        BlobPath::new(
            "https://acct.blob.core.windows.net/",
            "container",
            "prefix",
            "file.png",
        )
        .unwrap()
    }

    #[test]
    fn test_string_to_sign() {
        let signer = UserDelegationSasSigner::new();
        let s = signer.string_to_sign(
            &key(KEY_VALUE),
            "/blob/acct/container/prefix/file.png",
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00Z",
        );

        let expected = [
            "r",
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00Z",
            "/blob/acct/container/prefix/file.png",
            "00000000-0000-0000-0000-000000000001",
            "00000000-0000-0000-0000-000000000002",
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00Z",
            "b",
            "2020-12-06",
            "\n\n\n\nhttps",
            "2020-12-06",
            "b\n\n\n\n\n\n\n",
        ]
        .join("\n");
        assert_eq!(s, expected);
        assert_eq!(s.split('\n').count(), 24);
        assert!(s.ends_with("b\n\n\n\n\n\n\n"));
    }

    #[test]
    fn test_sign_pinned_signature() {
        let token = UserDelegationSasSigner::new()
            .sign(&key(KEY_VALUE), &path())
            .unwrap();

        assert_eq!(
            token.url(),
            format!(
                "https://acct.blob.core.windows.net/container/prefix/file.png\
                 ?sp=r&st=2024-01-01T00:00:00Z&se=2024-01-01T01:00:00Z\
                 &skoid=00000000-0000-0000-0000-000000000001\
                 &sktid=00000000-0000-0000-0000-000000000002\
                 &skt=2024-01-01T00:00:00Z&ske=2024-01-01T01:00:00Z\
                 &sks=b&skv=2020-12-06&spr=https&sv=2020-12-06&sr=b\
                 &sig={EXPECTED_SIG}"
            )
        );
        assert_eq!(token.expiry(), "2024-01-01T01:00:00Z");
    }

    #[test]
    fn test_sign_is_deterministic() {
        let signer = UserDelegationSasSigner::new();
        let a = signer.sign(&key(KEY_VALUE), &path()).unwrap();
        let b = signer.sign(&key(KEY_VALUE), &path()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_decodes_to_digest() {
        let token = UserDelegationSasSigner::new()
            .sign(&key(KEY_VALUE), &path())
            .unwrap();

        let sig = token
            .query()
            .split('&')
            .find_map(|kv| kv.strip_prefix("sig="))
            .unwrap();
        assert!(!sig.contains('/'));
        assert!(!sig.contains('+'));
        assert!(!sig.contains('='));

        let decoded = percent_encoding::percent_decode_str(sig)
            .decode_utf8()
            .unwrap();
        assert_eq!(base64_decode(&decoded).unwrap().len(), 32);
    }

    #[test]
    fn test_sign_for_narrower_window() {
        let start = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 15, 0).unwrap();
        let expiry = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap();
        let token = UserDelegationSasSigner::new()
            .sign_for(&key(KEY_VALUE), &path(), start, expiry)
            .unwrap();

        assert!(token
            .query()
            .starts_with("sp=r&st=2024-01-01T00:15:00Z&se=2024-01-01T00:30:00Z&"));
        assert!(token.query().contains("&skt=2024-01-01T00:00:00Z&ske=2024-01-01T01:00:00Z&"));
        assert_eq!(token.expiry(), "2024-01-01T00:30:00Z");
    }

    #[test]
    fn test_sign_for_rejects_inverted_window() {
        let start = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let err = UserDelegationSasSigner::new()
            .sign_for(&key(KEY_VALUE), &path(), start, start)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signing);
    }

    #[test]
    fn test_invalid_key_value() {
        let err = UserDelegationSasSigner::new()
            .sign(&key("not base64!"), &path())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Signing);
    }

    #[test]
    fn test_display_redacts_signature() {
        let token = UserDelegationSasSigner::new()
            .sign(&key(KEY_VALUE), &path())
            .unwrap();

        let shown = token.to_string();
        assert!(!shown.contains(EXPECTED_SIG));
        assert!(shown.ends_with("&sig=NXH***%3D"));
        assert!(!format!("{token:?}").contains(EXPECTED_SIG));
    }
}
