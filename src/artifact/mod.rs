//! Decoded artifact caching and loading
//!
//! - [`ArtifactCache`] - bounded, thread-safe LRU map from [`Locator`](crate::types::Locator) to artifact
//! - [`ArtifactLoader`] - cache-or-fetch-and-store with per-call cancellation
//! - [`LoadScopes`] - per-slot cancellation scopes for presentation layers that
//!   recycle views
//! - [`ArtifactDecoder`] - bytes to artifact; [`ImageDecoder`] is the default
//!
//! The cache is an ordinary value: construct it once and hand an `Arc` of it
//! to every loader that should share entries.

mod cache;
mod decode;
mod loader;
mod scope;


pub use cache::ArtifactCache;
pub use decode::{Artifact, ArtifactDecoder, ImageDecoder, RawBytesDecoder};
pub use loader::ArtifactLoader;
pub use scope::{LoadScope, LoadScopes};

/// Loader producing decoded images
pub type ImageLoader = ArtifactLoader<ImageDecoder>;
