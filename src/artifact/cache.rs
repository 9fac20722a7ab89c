//! Bounded LRU cache of decoded artifacts keyed by locator.
//!
//! Entries are charged their [`Artifact::cost_bytes`] against a byte budget
//! and also count against an entry limit. When either bound would be
//! exceeded, the least recently accessed entry is evicted. Callers must
//! tolerate a miss on a key that hit earlier.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::decode::Artifact;
use crate::config::CacheConfig;
use crate::types::Locator;

/// Thread-safe LRU cache for decoded artifacts.
///
/// All operations acquire a single lock; the critical section is pure
/// in-memory work with no I/O. Artifacts are handed out as `Arc`s so a
/// caller's copy stays valid after eviction.
pub struct ArtifactCache<A: Artifact> {
    max_bytes: u64,
    max_entries: usize,
    inner: Mutex<CacheInner<A>>,
}

struct CacheEntry<A> {
    artifact: Arc<A>,
    cost: u64,
}

struct CacheInner<A> {
    /// Access order: front = oldest (eviction candidate), back = newest.
    order: VecDeque<Locator>,
    data: HashMap<Locator, CacheEntry<A>>,
    used_bytes: u64,
}

impl<A: Artifact> CacheInner<A> {
    fn remove(&mut self, locator: &Locator) -> Option<CacheEntry<A>> {
        let entry = self.data.remove(locator)?;
        self.used_bytes -= entry.cost;
        self.order.retain(|l| l != locator);
        Some(entry)
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(oldest) = self.order.pop_front() else {
            return false;
        };
        if let Some(evicted) = self.data.remove(&oldest) {
            self.used_bytes -= evicted.cost;
            debug!(locator = %oldest, cost = evicted.cost, "evicted cached artifact");
        }
        true
    }
}

impl<A: Artifact> ArtifactCache<A> {
    /// Create a new cache with the given bounds.
    ///
    /// A `max_bytes` or `max_entries` of 0 disables caching entirely.
    pub fn new(max_bytes: u64, max_entries: usize) -> Self {
        Self {
            max_bytes,
            max_entries,
            inner: Mutex::new(CacheInner {
                order: VecDeque::new(),
                data: HashMap::new(),
                used_bytes: 0,
            }),
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_bytes, config.max_entries)
    }

    // A panic while holding the lock cannot leave the maps half-updated in a
    // way that matters to callers, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CacheInner<A>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up an artifact and promote it to most-recently-used.
    pub fn get(&self, locator: &Locator) -> Option<Arc<A>> {
        let mut inner = self.lock();
        let artifact = Arc::clone(&inner.data.get(locator)?.artifact);

        inner.order.retain(|l| l != locator);
        inner.order.push_back(locator.clone());

        Some(artifact)
    }

    /// Store an artifact, replacing any previous entry for the locator.
    ///
    /// Evicts old entries as needed. An artifact larger than the whole byte
    /// budget is not cached.
    pub fn put(&self, locator: Locator, artifact: Arc<A>) {
        let cost = artifact.cost_bytes();
        if self.max_bytes == 0 || self.max_entries == 0 || cost > self.max_bytes {
            debug!(%locator, cost, max_bytes = self.max_bytes, "artifact not cacheable");
            return;
        }

        let mut inner = self.lock();
        inner.remove(&locator);

        while inner.used_bytes + cost > self.max_bytes || inner.data.len() >= self.max_entries {
            if !inner.evict_oldest() {
                break;
            }
        }

        inner.used_bytes += cost;
        inner.data.insert(locator.clone(), CacheEntry { artifact, cost });
        inner.order.push_back(locator);
    }

    /// Whether an entry exists, without promoting it.
    pub fn contains(&self, locator: &Locator) -> bool {
        self.lock().data.contains_key(locator)
    }

    /// Drop one entry, returning it if present.
    pub fn remove(&self, locator: &Locator) -> Option<Arc<A>> {
        self.lock().remove(locator).map(|entry| entry.artifact)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.order.clear();
        inner.data.clear();
        inner.used_bytes = 0;
    }

    /// Evict least-recently-used entries until at most `max_bytes` are held.
    ///
    /// Hook for memory-pressure notifications; `trim_to(0)` empties the cache.
    pub fn trim_to(&self, max_bytes: u64) {
        let mut inner = self.lock();
        while inner.used_bytes > max_bytes {
            if !inner.evict_oldest() {
                break;
            }
        }
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().data.is_empty()
    }

    /// Current bytes charged to cached artifacts.
    pub fn used_bytes(&self) -> u64 {
        self.lock().used_bytes
    }

    /// Configured byte budget.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Configured entry limit.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
