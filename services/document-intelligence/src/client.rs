use bytes::Bytes;
use log::{debug, info, warn};
use sasflow_core::{Context, Error, JobPoller, JobStatus, PollableJob, Result};

use crate::constants::*;
use crate::model::{AnalyzeOperation, AnalyzeRequest, OperationStatus};
use crate::{AnalyzeResult, Config};

/// Client for the Document Intelligence analyze api.
///
/// Documents are passed by url, so the service fetches them itself; the url
/// is treated as a secret and never logged.
#[derive(Clone, Debug)]
pub struct DocumentAnalysisClient {
    ctx: Context,
    config: Config,
}

impl DocumentAnalysisClient {
    /// Create a client sending requests through `ctx`.
    pub fn new(ctx: Context, config: Config) -> Self {
        Self { ctx, config }
    }

    /// Submit `url_source` for analysis and wait for the result.
    pub async fn analyze(&self, url_source: &str, poller: &JobPoller) -> Result<AnalyzeResult> {
        let result = poller
            .submit_and_wait(
                || self.submit(url_source),
                |location: String| async move { self.poll(&location).await },
            )
            .await?;

        info!(
            "analyze finished with model {}, {} chars extracted",
            result.model_id,
            result.content.chars().count()
        );
        Ok(result)
    }

    /// Start an analyze operation, returning the url to poll it at.
    pub async fn submit(&self, url_source: &str) -> Result<String> {
        let url = self.config.analyze_url();
        let body = serde_json::to_vec(&AnalyzeRequest { url_source })
            .map_err(|e| Error::unexpected("failed to serialize analyze request").with_source(e))?;

        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(&url)
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(OCP_APIM_SUBSCRIPTION_KEY, &self.config.key)
            .body(Bytes::from(body))
            .map_err(|e| {
                Error::request_invalid("failed to build analyze request").with_source(e)
            })?;

        debug!("submitting analyze request to {url}");
        let resp = self.ctx.http_send_as_string(req).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::job_failed(format!(
                "analyze request rejected with status {status}: {}",
                resp.body()
            ))
            .with_context(format!("url: {url}"))
            .set_retryable(is_transient(status)));
        }

        let location = resp
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::unexpected(format!("analyze response has no {OPERATION_LOCATION} header"))
            })?;
        Ok(location.to_string())
    }

    /// Fetch the current state of the operation at `location`.
    ///
    /// Throttling and server errors are returned as retryable errors.
    pub async fn poll(&self, location: &str) -> Result<PollableJob<AnalyzeResult>> {
        let req = http::Request::builder()
            .method(http::Method::GET)
            .uri(location)
            .header(OCP_APIM_SUBSCRIPTION_KEY, &self.config.key)
            .body(Bytes::new())
            .map_err(|e| {
                Error::request_invalid("failed to build poll request")
                    .with_source(e)
                    .with_context(format!("location: {location}"))
            })?;

        let resp = self.ctx.http_send_as_string(req).await?;
        let status = resp.status();
        if !status.is_success() {
            let err = if is_transient(status) {
                Error::unexpected(format!("poll returned status {status}")).set_retryable(true)
            } else {
                Error::job_failed(format!("poll rejected with status {status}: {}", resp.body()))
            };
            return Err(err.with_context(format!("location: {location}")));
        }

        let op: AnalyzeOperation = serde_json::from_str(resp.body()).map_err(|e| {
            Error::unexpected("failed to parse analyze operation")
                .with_source(e)
                .with_context(format!("location: {location}"))
        })?;

        Ok(match op.status {
            OperationStatus::NotStarted => PollableJob::in_progress(location, JobStatus::Pending),
            OperationStatus::Running => PollableJob::in_progress(location, JobStatus::Running),
            OperationStatus::Unknown => {
                warn!("analyze operation reported an unknown status, still waiting");
                PollableJob::in_progress(location, JobStatus::Running)
            }
            OperationStatus::Succeeded => match op.analyze_result {
                Some(result) => PollableJob::succeeded(location, result),
                None => PollableJob::failed(location, "operation succeeded without analyzeResult"),
            },
            OperationStatus::Failed | OperationStatus::Canceled => PollableJob::failed(
                location,
                op.error
                    .map(|e| e.describe())
                    .unwrap_or_else(|| format!("analyze operation {:?}", op.status)),
            ),
        })
    }
}

fn is_transient(status: http::StatusCode) -> bool {
    status == http::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
