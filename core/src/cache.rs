use crate::{Context, Error, ProvideCredential, Result, SigningCredential};
use log::debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// CredentialCache holds one credential and refreshes it through its
/// provider when it is missing or no longer valid.
///
/// Refresh is single-flight: the lock is held across the exchange, so callers
/// arriving while a refresh is in progress wait for it and then observe the
/// credential it produced instead of starting a second exchange.
///
/// Clones share the same cached credential.
#[derive(Clone, Debug)]
pub struct CredentialCache<K: SigningCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> CredentialCache<K> {
    /// Create a new cache around `provider`.
    pub fn new(ctx: Context, provider: impl ProvideCredential<Credential = K>) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the context this cache exchanges credentials through.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Return the cached credential, refreshing it first if needed.
    ///
    /// Fails with an auth error if the exchange fails or the provider
    /// returns nothing. A failed refresh leaves the cache empty.
    pub async fn get(&self) -> Result<K> {
        let mut guard = self.credential.lock().await;
        if let Some(cred) = guard.as_ref().filter(|c| c.is_valid()) {
            return Ok(cred.clone());
        }

        // Drop the stale value before refreshing so a failed exchange never
        // leaves an expired credential behind.
        guard.take();
        debug!("credential missing or expiring, refreshing");

        let cred = self
            .provider
            .provide_credential(&self.ctx)
            .await
            .map_err(|e| e.with_kind(crate::ErrorKind::Auth))?
            .ok_or_else(|| Error::auth("credential provider returned no credential"))?;

        *guard = Some(cred.clone());
        Ok(cred)
    }

    /// Drop the cached credential so the next [`get`](Self::get) refreshes.
    pub async fn invalidate(&self) {
        self.credential.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Debug)]
    struct TestCredential {
        value: usize,
        valid: bool,
    }

    impl SigningCredential for TestCredential {
        fn is_valid(&self) -> bool {
            self.valid
        }
    }

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        valid: bool,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl ProvideCredential for CountingProvider {
        type Credential = TestCredential;

        async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
            let value = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(Error::unexpected("token endpoint unreachable").set_retryable(true));
            }
            Ok(Some(TestCredential {
                value,
                valid: self.valid,
            }))
        }
    }

    #[tokio::test]
    async fn test_reuses_valid_credential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CredentialCache::new(
            Context::new(),
            CountingProvider {
                calls: calls.clone(),
                valid: true,
                ..Default::default()
            },
        );

        for _ in 0..5 {
            assert_eq!(cache.get().await.unwrap().value, 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refreshes_invalid_credential() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CredentialCache::new(
            Context::new(),
            CountingProvider {
                calls: calls.clone(),
                valid: false,
                ..Default::default()
            },
        );

        assert_eq!(cache.get().await.unwrap().value, 1);
        assert_eq!(cache.get().await.unwrap().value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CredentialCache::new(
            Context::new(),
            CountingProvider {
                calls: calls.clone(),
                valid: true,
                ..Default::default()
            },
        );

        cache.get().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.get().await.unwrap().value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CredentialCache::new(
            Context::new(),
            CountingProvider {
                calls: calls.clone(),
                valid: true,
                delay: Duration::from_secs(1),
                ..Default::default()
            },
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get().await.map(|c| c.value) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_auth_error() {
        let cache = CredentialCache::new(
            Context::new(),
            CountingProvider {
                fail: true,
                ..Default::default()
            },
        );

        let err = cache.get().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Auth);
        assert!(err.is_retryable());
    }

    #[derive(Debug)]
    struct EmptyProvider;

    #[async_trait]
    impl ProvideCredential for EmptyProvider {
        type Credential = TestCredential;

        async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_empty_provider_is_auth_error() {
        let cache = CredentialCache::new(Context::new(), EmptyProvider);
        let err = cache.get().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Auth);
    }
}
