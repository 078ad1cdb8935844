//! Azure Blob Storage through user delegation.

pub use sasflow_azure_storage::*;

use sasflow_core::{Context, CredentialCache};

/// Create a bearer token cache exchanging the service principal in `cfg`.
///
/// Share one cache between every component acting for the same identity so
/// token refreshes are single-flight across them.
pub fn credential_cache(ctx: Context, cfg: &Config) -> CredentialCache<BearerToken> {
    CredentialCache::new(ctx, ClientSecretCredentialProvider::from_config(cfg))
}
