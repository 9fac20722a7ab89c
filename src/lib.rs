//! # feed-orchestrator
//!
//! Client-side data orchestration for apps that page through remote
//! collections, show remote images and aggregate per-item details.
//!
//! ## Engines
//!
//! - [`FeedController`] - incremental pagination with separate state machines
//!   for the first page and for later pages, duplicate-fetch suppression and
//!   explicit retry
//! - [`ArtifactLoader`] over a shared [`ArtifactCache`] - cache-or-fetch of
//!   decoded artifacts (images by default) with per-call cancellation
//! - [`ConcurrentAggregator`] - fetch a parent list, then every parent's
//!   detail concurrently, with per-parent success/failure tagging
//!
//! The engines never touch the network themselves. They are handed fetcher
//! implementations ([`PageFetcher`], [`ByteFetcher`], [`ParentListFetcher`],
//! [`DetailFetcher`]); [`HttpFetcher`] implements all four over JSON endpoints.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use feed_orchestrator::{Config, FeedController, HttpFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_json(
//!         r#"{ "http": { "endpoints": { "items_url": "https://api.example.com/photos" } } }"#,
//!     )?;
//!
//!     let fetcher = Arc::new(HttpFetcher::new(&config.http)?);
//!     let feed = FeedController::from_config(fetcher, &config.feed);
//!
//!     // Observe state changes
//!     let mut snapshots = feed.subscribe();
//!     tokio::spawn(async move {
//!         while snapshots.changed().await.is_ok() {
//!             let snapshot = snapshots.borrow().clone();
//!             println!("{} items, page {}", snapshot.items.len(), snapshot.current_page);
//!         }
//!     });
//!
//!     feed.load_initial().await;
//!     feed.load_next_page().await;
//!     Ok(())
//! }
//! ```
//!
//! The library emits `tracing` events and installs no subscriber.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Per-parent detail fan-out
pub mod aggregate;
/// Artifact cache, loader and load scopes
pub mod artifact;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Pagination feed controller
pub mod feed;
/// Fetcher traits and the HTTP implementation
pub mod fetch;
/// Domain value types
pub mod types;

pub use aggregate::{AggregateSummary, ConcurrentAggregator, DetailResult};
pub use artifact::{
    Artifact, ArtifactCache, ArtifactDecoder, ArtifactLoader, ImageDecoder, ImageLoader,
    LoadScope, LoadScopes, RawBytesDecoder,
};
pub use config::{CacheConfig, Config, EndpointConfig, FeedConfig, HttpConfig};
pub use error::{AggregateError, DecodeError, Error, LoadError, Result, TransportError};
pub use feed::{FeedController, FeedSnapshot, FeedState, PaginationState};
pub use fetch::{ByteFetcher, DetailFetcher, HttpFetcher, PageFetcher, ParentListFetcher};
pub use types::{Detail, Item, ItemId, Locator, ParentEntity, ParentId};
