//! Feed and pagination state machines

use crate::types::Item;
use std::sync::Arc;

/// Overall state of a feed's initial load
///
/// Exactly one variant holds at a time, so "loading" and "failed" can never
/// be observed together. Presentation code is expected to `match` on it
/// exhaustively (full-screen spinner, list, or full-screen error with retry).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FeedState {
    /// Nothing has been requested yet
    #[default]
    NotStarted,
    /// The first page is being fetched
    Loading,
    /// At least the first page arrived; holds every item loaded so far
    Loaded(Arc<Vec<Item>>),
    /// The first page could not be fetched
    Failed(String),
}

impl FeedState {
    /// Items carried by the `Loaded` variant
    pub fn items(&self) -> Option<&[Item]> {
        match self {
            FeedState::Loaded(items) => Some(items.as_slice()),
            FeedState::NotStarted | FeedState::Loading | FeedState::Failed(_) => None,
        }
    }

    /// Error message carried by the `Failed` variant
    pub fn error(&self) -> Option<&str> {
        match self {
            FeedState::Failed(message) => Some(message),
            FeedState::NotStarted | FeedState::Loading | FeedState::Loaded(_) => None,
        }
    }

    /// Whether the first page is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedState::Loading)
    }

    /// Short lowercase name for logs
    pub fn name(&self) -> &'static str {
        match self {
            FeedState::NotStarted => "not_started",
            FeedState::Loading => "loading",
            FeedState::Loaded(_) => "loaded",
            FeedState::Failed(_) => "failed",
        }
    }
}

/// State of incremental (next-page) loading
///
/// Independent of [`FeedState`]: a failed next page shows an inline footer
/// error while the already-loaded items stay visible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PaginationState {
    /// A next-page request may be issued
    #[default]
    Ready,
    /// A next-page request is in flight
    Loading,
    /// The last next-page request failed; escape with a retry
    Failed(String),
    /// The source reported no further pages
    Exhausted,
}

impl PaginationState {
    /// Whether a next-page request may be issued
    pub fn is_ready(&self) -> bool {
        matches!(self, PaginationState::Ready)
    }

    /// Error message carried by the `Failed` variant
    pub fn error(&self) -> Option<&str> {
        match self {
            PaginationState::Failed(message) => Some(message),
            PaginationState::Ready | PaginationState::Loading | PaginationState::Exhausted => None,
        }
    }

    /// Short lowercase name for logs
    pub fn name(&self) -> &'static str {
        match self {
            PaginationState::Ready => "ready",
            PaginationState::Loading => "loading",
            PaginationState::Failed(_) => "failed",
            PaginationState::Exhausted => "exhausted",
        }
    }
}

/// Read-only view of a controller, published after every transition
#[derive(Clone, Debug, PartialEq)]
pub struct FeedSnapshot {
    /// Initial-load state
    pub feed: FeedState,
    /// Next-page state
    pub pagination: PaginationState,
    /// Every item loaded so far, in load order
    pub items: Arc<Vec<Item>>,
    /// Last page successfully appended (1 after the first page)
    pub current_page: u32,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            feed: FeedState::NotStarted,
            pagination: PaginationState::Ready,
            items: Arc::new(Vec::new()),
            current_page: 1,
        }
    }
}

impl FeedSnapshot {
    /// Whether `candidate` is the last loaded item and another page may be requested
    pub fn should_trigger_next_load(&self, candidate: &Item) -> bool {
        self.pagination.is_ready() && self.items.last().is_some_and(|last| last.id == candidate.id)
    }
}
