//! Error types for feed-orchestrator
//!
//! This module provides the error taxonomy shared by the three engines:
//! - [`TransportError`] - a remote fetch failed (network, status, not found, body)
//! - [`DecodeError`] - fetched bytes are not a valid artifact encoding
//! - [`LoadError`] - everything an artifact load can report, including cancellation
//! - [`AggregateError`] - the parent list could not be obtained
//!
//! All of them convert into the crate-level [`Error`] via `#[from]`.

use thiserror::Error;

/// Result type alias for feed-orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for feed-orchestrator
///
/// Engine-level operations report their focused error types; this enum is what
/// those collapse into when a caller wants a single error type (and what
/// configuration and client construction return directly).
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "feed.page_size")
        key: Option<String>,
    },

    /// A remote fetch failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Fetched bytes could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Artifact load failed
    #[error("artifact load failed: {0}")]
    Load(#[from] LoadError),

    /// Aggregation could not start
    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    /// Invalid locator or endpoint URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client construction or request error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Failure of a single remote fetch
///
/// Cloneable so a failure can be both logged and captured into a state variant
/// or a per-item result tag.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the connection failed
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Target URL
        url: String,
        /// Underlying failure description
        reason: String,
    },

    /// The remote answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Target URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The remote has no resource for the requested key
    #[error("{0} not found")]
    NotFound(String),

    /// The response body could not be read or parsed
    #[error("invalid response body from {url}: {reason}")]
    Body {
        /// Target URL
        url: String,
        /// Parse or read failure description
        reason: String,
    },

    /// Fetcher-specific failure that fits no other variant
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Build a [`TransportError::Request`] from any displayable cause
    pub fn request(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        TransportError::Request {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`TransportError::Body`] from any displayable cause
    pub fn body(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        TransportError::Body {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Bytes are not a valid artifact encoding
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct DecodeError {
    /// Why decoding failed
    pub reason: String,
}

impl DecodeError {
    /// Create a new decode error
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Everything [`ArtifactLoader::load`](crate::artifact::ArtifactLoader::load) can report
///
/// Transfer and decode failures are kept distinct so callers can tell a
/// flaky network apart from a corrupt resource. None of them is cached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The byte transfer failed
    #[error("transfer failed: {0}")]
    Transport(#[from] TransportError),

    /// The bytes arrived but could not be decoded
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The caller's scope was cancelled or superseded before completion
    #[error("load cancelled")]
    Cancelled,
}

impl LoadError {
    /// Whether this error is a cancellation rather than a real failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }
}

/// Fatal aggregation failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// The parent list could not be fetched, so there is nothing to attach details to
    #[error("failed to fetch parent list: {0}")]
    ListFetch(TransportError),
}
