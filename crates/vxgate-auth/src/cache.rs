//! Token reuse across calls.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;
use vxgate_core::{AccessToken, CredentialFailure, CredentialSource};

/// Tokens closer than this to expiry are refreshed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Caches the inner source's token until it is about to expire.
///
/// Concurrent callers that miss the cache wait on one refresh instead of
/// each hitting the token endpoint. Failures are never cached.
#[derive(Debug)]
pub struct CachedCredentialSource<S> {
    inner: S,
    margin: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl<S: CredentialSource> CachedCredentialSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            margin: DEFAULT_REFRESH_MARGIN,
            cached: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CredentialSource> CredentialSource for CachedCredentialSource<S> {
    async fn token(&self) -> Result<AccessToken, CredentialFailure> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(self.margin)) {
            trace!("Reusing cached access token");
            return Ok(token.clone());
        }

        let token = self.inner.refresh().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn refresh(&self) -> Result<AccessToken, CredentialFailure> {
        let mut cached = self.cached.lock().await;
        let token = self.inner.refresh().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
