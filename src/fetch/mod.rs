//! Remote fetcher seams
//!
//! The engines never talk to the network directly. They are handed
//! implementations of these traits, which lets tests substitute in-memory
//! fakes and lets applications plug in whatever transport they use.
//! [`HttpFetcher`] is the bundled reqwest-backed implementation of all four.
//!
//! Every fetch is a single attempt: failures come back as [`TransportError`]
//! and retrying is the caller's decision.

mod http;

pub use http::HttpFetcher;

use crate::error::TransportError;
use crate::types::{Detail, Item, Locator, ParentEntity, ParentId};
use async_trait::async_trait;
use bytes::Bytes;

/// Source of a paged item collection
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page of items
    ///
    /// `page` is 1-based and `limit` is always greater than zero. An empty
    /// vector is a valid answer meaning the collection has no more pages.
    async fn fetch_page(&self, page: u32, limit: usize) -> Result<Vec<Item>, TransportError>;
}

/// Source of raw artifact bytes
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    /// Fetch the bytes a locator points at
    async fn fetch_bytes(&self, locator: &Locator) -> Result<Bytes, TransportError>;
}

/// Source of the parent entity list
#[async_trait]
pub trait ParentListFetcher: Send + Sync {
    /// Fetch every parent entity, in source order
    async fn fetch_parents(&self) -> Result<Vec<ParentEntity>, TransportError>;
}

/// Source of per-parent details
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    /// Fetch the detail for one parent
    ///
    /// A parent the remote does not know is reported as
    /// [`TransportError::NotFound`].
    async fn fetch_detail(&self, key: &ParentId) -> Result<Detail, TransportError>;
}
