//! Cache-or-fetch-and-store artifact loading.

use std::hash::Hash;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::cache::ArtifactCache;
use super::decode::ArtifactDecoder;
use super::scope::{LoadScope, LoadScopes};
use crate::error::{DecodeError, LoadError};
use crate::fetch::ByteFetcher;
use crate::types::Locator;

/// Loads artifacts through a shared [`ArtifactCache`]
///
/// Concurrent misses for the same locator are not coalesced: each caller
/// fetches and stores on its own and the last store wins. Failures are never
/// cached, so a failed locator is fetched again on the next request.
pub struct ArtifactLoader<D: ArtifactDecoder> {
    cache: Arc<ArtifactCache<D::Output>>,
    fetcher: Arc<dyn ByteFetcher>,
    decoder: Arc<D>,
}

impl<D: ArtifactDecoder> Clone for ArtifactLoader<D> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            fetcher: Arc::clone(&self.fetcher),
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<D: ArtifactDecoder> ArtifactLoader<D> {
    /// Create a loader over a shared cache
    pub fn new(
        cache: Arc<ArtifactCache<D::Output>>,
        fetcher: Arc<dyn ByteFetcher>,
        decoder: D,
    ) -> Self {
        Self {
            cache,
            fetcher,
            decoder: Arc::new(decoder),
        }
    }

    /// The cache this loader reads and fills
    pub fn cache(&self) -> &Arc<ArtifactCache<D::Output>> {
        &self.cache
    }

    /// Get the artifact for `locator`
    ///
    /// A cache hit returns immediately without a transfer. A miss fetches the
    /// bytes, decodes them off the async runtime and stores the result.
    ///
    /// # Errors
    ///
    /// - [`LoadError::Cancelled`] if `cancel` fires before the artifact is
    ///   stored; nothing is written to the cache in that case
    /// - [`LoadError::Transport`] if the transfer fails
    /// - [`LoadError::Decode`] if the bytes are not a valid encoding
    pub async fn load(
        &self,
        locator: &Locator,
        cancel: &CancellationToken,
    ) -> Result<Arc<D::Output>, LoadError> {
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        if let Some(hit) = self.cache.get(locator) {
            debug!(%locator, "artifact cache hit");
            return Ok(hit);
        }

        debug!(%locator, "artifact cache miss, fetching");
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%locator, "artifact transfer abandoned");
                return Err(LoadError::Cancelled);
            }
            result = self.fetcher.fetch_bytes(locator) => result,
        };
        let bytes = fetched.inspect_err(|e| {
            warn!(%locator, error = %e, "artifact transfer failed");
        })?;

        let decoder = Arc::clone(&self.decoder);
        let decoding = tokio::task::spawn_blocking(move || decoder.decode(&bytes));
        let decoded = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%locator, "artifact decode abandoned");
                return Err(LoadError::Cancelled);
            }
            joined = decoding => joined
                .map_err(|e| DecodeError::new(format!("decode task failed: {e}")))
                .and_then(|result| result),
        };
        let artifact = Arc::new(decoded.inspect_err(|e| {
            warn!(%locator, error = %e, "artifact decode failed");
        })?);

        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        self.cache.put(locator.clone(), Arc::clone(&artifact));
        debug!(%locator, "artifact stored");
        Ok(artifact)
    }

    /// Load on behalf of a slot scope
    ///
    /// Like [`load`](Self::load), but also reports [`LoadError::Cancelled`]
    /// when the scope was superseded while the load was running, so a stale
    /// artifact is never handed to a slot that has moved on.
    pub async fn load_in_scope<K>(
        &self,
        scopes: &LoadScopes<K>,
        scope: &LoadScope<K>,
        locator: &Locator,
    ) -> Result<Arc<D::Output>, LoadError>
    where
        K: Clone + Eq + Hash + std::fmt::Debug,
    {
        let artifact = self.load(locator, scope.token()).await?;
        if !scopes.is_current(scope) {
            debug!(%locator, generation = scope.generation(), "discarding artifact for superseded scope");
            return Err(LoadError::Cancelled);
        }
        Ok(artifact)
    }
}
