//! Reqwest-based HTTP sending for sasflow.
//!
//! `ReqwestHttpSend` implements [`sasflow_core::HttpSend`] on top of a
//! [`reqwest::Client`], so every outbound call made through a
//! [`sasflow_core::Context`] goes through one shared connection pool.
//!
//! ## Example
//!
//! ```no_run
//! use sasflow_core::Context;
//! use sasflow_http_send_reqwest::ReqwestHttpSend;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), reqwest::Error> {
//! let client = reqwest::Client::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Client, Request};
use sasflow_core::{Error, HttpSend, Result};

/// HttpSend implementation backed by reqwest.
///
/// Transport failures (connect, timeout, body read) are returned as
/// retryable errors. Responses are returned as-is whatever their status.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let uri = req.uri().clone();
        let req = Request::try_from(req).map_err(|e| {
            Error::request_invalid("failed to convert request")
                .with_source(e)
                .with_context(format!("url: {}", redact_query(&uri)))
        })?;

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| {
                Error::unexpected("failed to send request")
                    .with_source(e)
                    .with_context(format!("url: {}", redact_query(&uri)))
                    .set_retryable(true)
            })?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| {
                Error::unexpected("failed to read response body")
                    .with_source(e)
                    .set_retryable(true)
            })?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

/// Query strings may carry signatures; keep them out of error messages.
fn redact_query(uri: &http::Uri) -> String {
    match uri.query() {
        Some(_) => format!(
            "{}://{}{}?<redacted>",
            uri.scheme_str().unwrap_or("https"),
            uri.authority().map(|a| a.as_str()).unwrap_or_default(),
            uri.path()
        ),
        None => uri.to_string(),
    }
}
