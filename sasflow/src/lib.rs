//! Upload a document to Azure Blob Storage, hand it to Document Intelligence
//! through a short-lived user delegation SAS and collect the extracted text.
//!
//! The building blocks live in their own crates and are re-exported here:
//!
//! - [`sasflow_core`]: context, errors, credential cache and job poller.
//! - [`azure`]: token exchange, blob upload, delegation keys and SAS signing.
//! - [`ocr`]: the analyze client.
//!
//! [`Pipeline`] wires them together for one file at a time.
//!
//! # Example
//!
//! ```no_run
//! use sasflow::{default_context, Config, Pipeline};
//!
//! # async fn example() -> sasflow::Result<()> {
//! let ctx = default_context();
//! let config = Config::from_context(&ctx)?;
//!
//! let extraction = Pipeline::new(ctx, config).process("resume.pdf").await?;
//! println!("{}", extraction.content);
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub use sasflow_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::default_context;

pub mod azure;
pub mod ocr;

mod config;
pub use config::Config;

mod sniff;
pub use sniff::sniff_content_type;

mod pipeline;
pub use pipeline::{Extraction, Pipeline};
