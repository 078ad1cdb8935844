use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use log::{debug, info};
use sasflow_core::{CancellationToken, Context, Error, JobPoller, Result};

use crate::azure::{
    self, BlobPath, BlobUploader, DelegationKeyClient, UserDelegationSasSigner,
};
use crate::ocr::DocumentAnalysisClient;
use crate::{sniff_content_type, Config};

/// The outcome of processing one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// Where the document was uploaded, without any signature.
    pub blob_url: String,
    /// Detected content type of the document.
    pub content_type: &'static str,
    /// Text extracted from the document.
    pub content: String,
}

/// Runs documents through upload, SAS issuance and text extraction.
///
/// A failure at any step aborts processing of that document. A blob that was
/// already uploaded is left in place.
#[derive(Clone, Debug)]
pub struct Pipeline {
    ctx: Context,
    config: Config,
    uploader: BlobUploader,
    keys: DelegationKeyClient,
    signer: UserDelegationSasSigner,
    ocr: DocumentAnalysisClient,
    poller: JobPoller,
}

impl Pipeline {
    /// Build a pipeline; all storage calls share one token cache.
    pub fn new(ctx: Context, config: Config) -> Self {
        let cache = azure::credential_cache(ctx.clone(), &config.storage);

        Self {
            uploader: BlobUploader::new(cache.clone()),
            keys: DelegationKeyClient::new(cache, config.storage.account_url.clone()),
            signer: UserDelegationSasSigner::new(),
            ocr: DocumentAnalysisClient::new(ctx.clone(), config.ocr.clone()),
            poller: JobPoller::new(config.poll.clone()),
            ctx,
            config,
        }
    }

    /// Abandon the wait for text extraction once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.poller = self.poller.with_cancellation(token);
        self
    }

    /// Process the document at `path`.
    pub async fn process(&self, path: &str) -> Result<Extraction> {
        let name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::request_invalid("document path has no file name")
                    .with_context(format!("path: {path}"))
            })?;

        let content = self.ctx.file_read(path).await?;
        let content_type =
            sniff_content_type(&content).map_err(|e| e.with_context(format!("path: {path}")))?;
        info!("processing {path} as {content_type}, {} bytes", content.len());

        let storage = &self.config.storage;
        let blob = BlobPath::new(
            &storage.account_url,
            &storage.container,
            &storage.prefix,
            name,
        )?;

        self.uploader
            .upload(
                &blob,
                content_type,
                Bytes::from(content),
                storage.file_tags.as_deref(),
            )
            .await?;

        let valid_for = Duration::from_secs(u64::from(storage.sas_valid_hours) * 3600);
        let key = self.keys.get_delegation_key(valid_for).await?;
        let sas = self.signer.sign(&key, &blob)?;
        info!("issued read sas for {}, expires {}", blob.url(), sas.expiry());
        debug!("sas url: {sas}");

        let result = self.ocr.analyze(sas.url(), &self.poller).await?;

        Ok(Extraction {
            blob_url: blob.url(),
            content_type,
            content: result.content,
        })
    }
}
