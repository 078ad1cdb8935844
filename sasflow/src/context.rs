use std::time::Duration;

use sasflow_core::{Context, OsEnv};
use sasflow_file_read_tokio::TokioFileRead;
use sasflow_http_send_reqwest::ReqwestHttpSend;

/// Per-request timeout of the default http client.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Create a [`Context`] that reads files with tokio, sends requests with
/// reqwest and reads the process environment.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::new(default_client()))
        .with_env(OsEnv)
}

fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_default()
}
