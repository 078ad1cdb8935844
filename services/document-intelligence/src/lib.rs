//! Azure AI Document Intelligence client.
//!
//! Submits a document url to a prebuilt model and waits for the extracted
//! text with [`sasflow_core::JobPoller`].
//!
//! # Example
//!
//! ```rust,no_run
//! use sasflow_core::{Context, JobPoller, PollPolicy, Result};
//! use sasflow_document_intelligence::{Config, DocumentAnalysisClient};
//!
//! async fn extract(ctx: Context, sas_url: &str) -> Result<String> {
//!     let cfg = Config::new("https://ocr.cognitiveservices.azure.com/", "key");
//!     let client = DocumentAnalysisClient::new(ctx, cfg);
//!
//!     let result = client
//!         .analyze(sas_url, &JobPoller::new(PollPolicy::default()))
//!         .await?;
//!     Ok(result.content)
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod model;
pub use model::AnalyzeResult;

mod client;
pub use client::DocumentAnalysisClient;
