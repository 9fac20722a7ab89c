//! Pagination feed controller
//!
//! Accumulates a paged collection one page at a time. Two independent state
//! machines are tracked:
//! - [`FeedState`] - the first page; failure here is a full-screen error
//! - [`PaginationState`] - every later page; failure here keeps the items
//!   already loaded and only blocks further pages until retried
//!
//! All state lives behind one async mutex. The mutex is held only for the
//! check-and-transition steps, never across a fetch, so a slow page cannot
//! block readers or a fresh [`FeedController::load_initial`]. Each fetch
//! remembers the generation it was issued under and its result is dropped if
//! a newer `load_initial` started in the meantime.

mod state;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use state::{FeedSnapshot, FeedState, PaginationState};

use crate::config::FeedConfig;
use crate::fetch::PageFetcher;
use crate::types::Item;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Mutable controller state, guarded by [`FeedController::inner`]
struct FeedInner {
    feed_state: FeedState,
    pagination_state: PaginationState,
    items: Arc<Vec<Item>>,
    current_page: u32,
    /// Bumped by every `load_initial`; results from older generations are discarded
    generation: u64,
}

impl FeedInner {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            feed: self.feed_state.clone(),
            pagination: self.pagination_state.clone(),
            items: Arc::clone(&self.items),
            current_page: self.current_page,
        }
    }
}

/// Sequential-page feed with duplicate-fetch suppression
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct FeedController {
    /// Page source
    fetcher: Arc<dyn PageFetcher>,
    /// Items requested per page (always at least 1)
    page_size: usize,
    /// Controller state
    inner: Mutex<FeedInner>,
    /// Latest snapshot, republished after every transition
    snapshot_tx: watch::Sender<FeedSnapshot>,
}

impl FeedController {
    /// Create a controller that requests `page_size` items per page
    ///
    /// A `page_size` of 0 is treated as 1.
    pub fn new(fetcher: Arc<dyn PageFetcher>, page_size: usize) -> Self {
        let inner = FeedInner {
            feed_state: FeedState::NotStarted,
            pagination_state: PaginationState::Ready,
            items: Arc::new(Vec::new()),
            current_page: 1,
            generation: 0,
        };
        let (snapshot_tx, _rx) = watch::channel(inner.snapshot());

        Self {
            fetcher,
            page_size: page_size.max(1),
            inner: Mutex::new(inner),
            snapshot_tx,
        }
    }

    /// Create a controller from configuration
    pub fn from_config(fetcher: Arc<dyn PageFetcher>, config: &FeedConfig) -> Self {
        Self::new(fetcher, config.page_size)
    }

    /// Items requested per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn publish(&self, inner: &FeedInner) {
        self.snapshot_tx.send_replace(inner.snapshot());
    }

    /// Reset and fetch the first page
    ///
    /// Clears the accumulated items and sets [`FeedState::Loading`] before the
    /// fetch. On success the feed becomes `Loaded` and pagination `Ready` (or
    /// `Exhausted` if the first page was empty). On failure the feed becomes
    /// `Failed`; pagination state is not touched. Calling this again is the
    /// retry for a failed first page, and also supersedes any in-flight fetch.
    pub async fn load_initial(&self) {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.current_page = 1;
            inner.items = Arc::new(Vec::new());
            inner.feed_state = FeedState::Loading;
            self.publish(&inner);
            inner.generation
        };

        info!(generation, page_size = self.page_size, "loading first page");
        let result = self.fetcher.fetch_page(1, self.page_size).await;

        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if inner.generation != generation {
            debug!(
                generation,
                current = inner.generation,
                "discarding superseded first page"
            );
            return;
        }

        match result {
            Ok(items) => {
                inner.pagination_state = if items.is_empty() {
                    PaginationState::Exhausted
                } else {
                    PaginationState::Ready
                };
                info!(
                    generation,
                    count = items.len(),
                    pagination = inner.pagination_state.name(),
                    "first page loaded"
                );
                inner.items = Arc::new(items);
                inner.feed_state = FeedState::Loaded(Arc::clone(&inner.items));
            }
            Err(e) => {
                warn!(generation, error = %e, "first page failed");
                inner.feed_state = FeedState::Failed(e.to_string());
            }
        }
        self.publish(inner);
    }

    /// Fetch and append the next page
    ///
    /// Does nothing unless pagination is [`PaginationState::Ready`] and the
    /// first page has loaded. The check and the transition to `Loading` happen
    /// under one lock acquisition, so concurrent callers issue exactly one
    /// fetch. An empty page marks the feed `Exhausted`; a failure marks it
    /// `Failed` and leaves the items and page counter untouched.
    pub async fn load_next_page(&self) {
        if let Some((generation, page)) = self.claim_next_page(false).await {
            self.fetch_next_page(generation, page).await;
        }
    }

    /// Retry a failed next page
    ///
    /// Moves pagination out of `Failed` and loads the next page. The state
    /// change and the claim of the fetch happen under one lock acquisition,
    /// so a concurrent [`load_next_page`](Self::load_next_page) cannot take
    /// the retried fetch. Has no effect in any other pagination state.
    pub async fn retry_next_page(&self) {
        if let Some((generation, page)) = self.claim_next_page(true).await {
            self.fetch_next_page(generation, page).await;
        }
    }

    /// Check-and-transition step shared by `load_next_page` and
    /// `retry_next_page`; returns the generation and page to fetch
    async fn claim_next_page(&self, retry: bool) -> Option<(u64, u32)> {
        let mut inner = self.inner.lock().await;
        if retry {
            if !matches!(inner.pagination_state, PaginationState::Failed(_)) {
                debug!(
                    pagination = inner.pagination_state.name(),
                    "retry ignored, pagination has not failed"
                );
                return None;
            }
            inner.pagination_state = PaginationState::Ready;
        }

        if !inner.pagination_state.is_ready() || !matches!(inner.feed_state, FeedState::Loaded(_))
        {
            debug!(
                pagination = inner.pagination_state.name(),
                feed = inner.feed_state.name(),
                "next page suppressed"
            );
            if retry {
                self.publish(&inner);
            }
            return None;
        }
        inner.pagination_state = PaginationState::Loading;
        self.publish(&inner);
        Some((inner.generation, inner.current_page + 1))
    }

    async fn fetch_next_page(&self, generation: u64, page: u32) {
        debug!(generation, page, "loading next page");
        let result = self.fetcher.fetch_page(page, self.page_size).await;

        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if inner.generation != generation {
            debug!(
                generation,
                page,
                current = inner.generation,
                "discarding page from superseded feed"
            );
            return;
        }

        match result {
            Ok(items) if items.is_empty() => {
                info!(page, total = inner.items.len(), "feed exhausted");
                inner.pagination_state = PaginationState::Exhausted;
            }
            Ok(items) => {
                debug!(page, count = items.len(), "page appended");
                Arc::make_mut(&mut inner.items).extend(items);
                inner.feed_state = FeedState::Loaded(Arc::clone(&inner.items));
                inner.current_page = page;
                inner.pagination_state = PaginationState::Ready;
            }
            Err(e) => {
                warn!(page, error = %e, "next page failed");
                inner.pagination_state = PaginationState::Failed(e.to_string());
            }
        }
        self.publish(inner);
    }

    /// Whether the presentation layer should call [`load_next_page`](Self::load_next_page)
    /// now that `candidate` became visible
    ///
    /// True iff `candidate` is the last loaded item and pagination is `Ready`.
    pub fn should_trigger_next_load(&self, candidate: &Item) -> bool {
        self.snapshot_tx
            .borrow()
            .should_trigger_next_load(candidate)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Current initial-load state
    pub fn feed_state(&self) -> FeedState {
        self.snapshot_tx.borrow().feed.clone()
    }

    /// Current next-page state
    pub fn pagination_state(&self) -> PaginationState {
        self.snapshot_tx.borrow().pagination.clone()
    }

    /// Every item loaded so far
    pub fn items(&self) -> Arc<Vec<Item>> {
        Arc::clone(&self.snapshot_tx.borrow().items)
    }

    /// Last page successfully appended
    pub fn current_page(&self) -> u32 {
        self.snapshot_tx.borrow().current_page
    }

    /// Subscribe to snapshots
    ///
    /// The receiver always holds the latest snapshot; intermediate ones may be
    /// skipped if the subscriber is slow.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_tx.subscribe()
    }
}
