//! Core components for delegated blob access and remote job orchestration.
//!
//! This crate provides the foundational types and traits shared by the
//! sasflow service crates.
//!
//! ## Overview
//!
//! - **Context**: a container that holds implementations for file reading,
//!   HTTP sending, and environment access.
//! - **Traits**: `ProvideCredential` performs a credential exchange,
//!   `SigningCredential` reports whether a held credential is still usable.
//! - **CredentialCache**: holds one credential and refreshes it single-flight.
//! - **JobPoller**: waits for a remote job with a bounded, cancellable loop.
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use sasflow_core::{Context, CredentialCache, ProvideCredential, Result, SigningCredential};
//!
//! #[derive(Clone, Debug)]
//! struct Token(String);
//!
//! impl SigningCredential for Token {
//!     fn is_valid(&self) -> bool {
//!         !self.0.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct StaticToken;
//!
//! #[async_trait]
//! impl ProvideCredential for StaticToken {
//!     type Credential = Token;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<Token>> {
//!         Ok(Some(Token("token".to_string())))
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let cache = CredentialCache::new(Context::new(), StaticToken);
//! let token = cache.get().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: HMAC and digest helpers
//! - [`time`]: time formatting shared by every signed value
//! - [`utils`]: redaction of secrets for logs

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{
    Context, Env, FileRead, HttpSend, NoopEnv, NoopFileRead, NoopHttpSend, OsEnv, StaticEnv,
};

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SigningCredential};

mod cache;
pub use cache::CredentialCache;

mod cancel;
pub use cancel::CancellationToken;

mod poll;
pub use poll::{JobPoller, JobStatus, PollPolicy, PollableJob};
