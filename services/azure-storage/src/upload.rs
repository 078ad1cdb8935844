use bytes::Bytes;
use log::{debug, info};
use sasflow_core::hash::hex_sha256;
use sasflow_core::time::{format_http_date, now};
use sasflow_core::{CredentialCache, Error, ErrorKind, Result};

use crate::constants::*;
use crate::{BearerToken, BlobPath};

/// Writes small files as block blobs in a single `Put Blob` request.
///
/// Failures are returned to the caller as-is; nothing is retried and a blob
/// that was written before a later step failed is left in place.
///
/// Reference: <https://learn.microsoft.com/en-us/rest/api/storageservices/put-blob>
#[derive(Clone, Debug)]
pub struct BlobUploader {
    cache: CredentialCache<BearerToken>,
}

impl BlobUploader {
    /// Create an uploader authenticating through `cache`.
    pub fn new(cache: CredentialCache<BearerToken>) -> Self {
        Self { cache }
    }

    /// Upload `content` to `path`.
    ///
    /// `tags` is sent verbatim as `x-ms-tags` when present.
    pub async fn upload(
        &self,
        path: &BlobPath,
        content_type: &str,
        content: Bytes,
        tags: Option<&str>,
    ) -> Result<()> {
        let token = self.cache.get().await?;
        let url = path.url();

        let mut req = http::Request::builder()
            .method(http::Method::PUT)
            .uri(&url)
            .header(http::header::AUTHORIZATION, token.authorization())
            .header(X_MS_DATE, format_http_date(now()))
            .header(X_MS_VERSION, BLOB_UPLOAD_VERSION)
            .header(X_MS_BLOB_TYPE, "BlockBlob")
            .header(http::header::CONTENT_TYPE, content_type)
            .header(http::header::CONTENT_LENGTH, content.len());
        if let Some(tags) = tags.filter(|t| !t.is_empty()) {
            req = req.header(X_MS_TAGS, tags);
        }

        debug!(
            "uploading {} bytes to {url}, sha256 {}",
            content.len(),
            hex_sha256(&content)
        );
        let req = req.body(content).map_err(|e| {
            Error::request_invalid("failed to build upload request")
                .with_source(e)
                .with_context(format!("url: {url}"))
        })?;

        let resp = self
            .cache
            .context()
            .http_send_as_string(req)
            .await
            .map_err(|e| e.with_kind(ErrorKind::Upload))?;

        if !resp.status().is_success() {
            return Err(Error::upload(format!(
                "put blob returned status {}: {}",
                resp.status(),
                resp.body()
            ))
            .with_context(format!("url: {url}")));
        }

        info!("uploaded {url}");
        Ok(())
    }
}
