//! Azure Blob Storage access through user delegation.
//!
//! This crate covers the storage side of the pipeline:
//!
//! - [`ClientSecretCredentialProvider`] exchanges a service principal's
//!   secret for a [`BearerToken`], cached by [`sasflow_core::CredentialCache`].
//! - [`BlobUploader`] writes a document as a block blob.
//! - [`DelegationKeyClient`] fetches a [`UserDelegationKey`].
//! - [`UserDelegationSasSigner`] turns that key into a read-only [`SasToken`]
//!   for a single [`BlobPath`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use sasflow_azure_storage::{
//!     BlobPath, BlobUploader, ClientSecretCredentialProvider, DelegationKeyClient,
//!     UserDelegationSasSigner,
//! };
//! use sasflow_core::{Context, CredentialCache, Result};
//!
//! async fn share(ctx: Context, content: bytes::Bytes) -> Result<String> {
//!     let provider = ClientSecretCredentialProvider::new("tenant", "client", "secret");
//!     let cache = CredentialCache::new(ctx, provider);
//!
//!     let path = BlobPath::new(
//!         "https://acct.blob.core.windows.net/",
//!         "resumes",
//!         "inbox",
//!         "resume.pdf",
//!     )?;
//!     BlobUploader::new(cache.clone())
//!         .upload(&path, "application/pdf", content, None)
//!         .await?;
//!
//!     let key = DelegationKeyClient::new(cache, path.root())
//!         .get_delegation_key(Duration::from_secs(3600))
//!         .await?;
//!     let sas = UserDelegationSasSigner::new().sign(&key, &path)?;
//!     Ok(sas.url().to_string())
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::BearerToken;

mod provide_credential;
pub use provide_credential::*;

mod resource;
pub use resource::BlobPath;

mod delegation_key;
pub use delegation_key::{DelegationKeyClient, UserDelegationKey};

mod sas;
pub use sas::{SasPermissions, SasToken, UserDelegationSasSigner};

mod upload;
pub use upload::BlobUploader;
