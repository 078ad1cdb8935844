use crate::{Context, Result};
use std::fmt::Debug;

/// SigningCredential is the trait a cached credential implements.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential can still be handed out.
    ///
    /// Implementations must include their own expiry margin: returning
    /// `true` promises the credential outlives the request about to use it.
    fn is_valid(&self) -> bool;
}

/// ProvideCredential is the trait used by [`crate::CredentialCache`] to obtain
/// a fresh credential.
///
/// Providers perform the exchange every time they are called; caching and
/// refresh decisions belong to the cache.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Exchange for a new credential.
    ///
    /// Returns `Ok(None)` when the provider has nothing to offer, which the
    /// cache reports as an auth error.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}
