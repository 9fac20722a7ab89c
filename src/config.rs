//! Configuration types for feed-orchestrator

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pagination behavior for feed controllers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Number of items requested per page (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Artifact cache bounds
///
/// Either bound triggers least-recently-used eviction. A `max_bytes` of 0
/// disables caching entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Total decoded size the cache may hold, in bytes (default: 64 MiB)
    #[serde(default = "default_cache_max_bytes")]
    pub max_bytes: u64,

    /// Maximum number of cached artifacts (default: 512)
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_cache_max_bytes(),
            max_entries: default_cache_max_entries(),
        }
    }
}

/// Remote endpoints used by [`HttpFetcher`](crate::fetch::HttpFetcher)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Paged item collection (e.g. "https://jsonplaceholder.typicode.com/photos")
    #[serde(default)]
    pub items_url: Option<String>,

    /// Query parameter carrying the 1-based page number (default: "_page")
    #[serde(default = "default_page_param")]
    pub page_param: String,

    /// Query parameter carrying the page size (default: "_limit")
    #[serde(default = "default_limit_param")]
    pub limit_param: String,

    /// Parent entity list
    #[serde(default)]
    pub parents_url: Option<String>,

    /// Per-parent detail; `{key}` is replaced with the parent identifier
    #[serde(default)]
    pub detail_url_template: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            items_url: None,
            page_param: default_page_param(),
            limit_param: default_limit_param(),
            parents_url: None,
            detail_url_template: None,
        }
    }
}

/// HTTP client settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (default: 30 seconds)
    ///
    /// Timeouts surface as ordinary transport failures; nothing is retried.
    #[serde(default = "default_http_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Remote endpoints
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
            user_agent: default_user_agent(),
            endpoints: EndpointConfig::default(),
        }
    }
}

/// Main configuration
///
/// Every section and field has a default, so `{}` is a valid configuration
/// document. Endpoints are only needed when the HTTP fetchers are used.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Pagination settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Artifact cache bounds
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP client and endpoints
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Parse a JSON configuration document and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde defaults cannot guard
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.feed.page_size == 0 {
            return Err(Error::config(
                "feed.page_size",
                "page size must be greater than zero",
            ));
        }
        if self.http.timeout.is_zero() {
            return Err(Error::config(
                "http.timeout",
                "timeout must be at least one second",
            ));
        }

        let endpoints = &self.http.endpoints;
        for (key, value) in [
            ("http.endpoints.items_url", &endpoints.items_url),
            ("http.endpoints.parents_url", &endpoints.parents_url),
        ] {
            if let Some(raw) = value {
                url::Url::parse(raw)
                    .map_err(|e| Error::config(key, format!("invalid URL {raw}: {e}")))?;
            }
        }
        if let Some(template) = &endpoints.detail_url_template {
            if !template.contains("{key}") {
                return Err(Error::config(
                    "http.endpoints.detail_url_template",
                    "template must contain a {key} placeholder",
                ));
            }
            url::Url::parse(&template.replace("{key}", "key")).map_err(|e| {
                Error::config(
                    "http.endpoints.detail_url_template",
                    format!("invalid URL template {template}: {e}"),
                )
            })?;
        }
        if endpoints.page_param.is_empty() || endpoints.limit_param.is_empty() {
            return Err(Error::config(
                "http.endpoints.page_param",
                "page and limit parameter names must not be empty",
            ));
        }

        Ok(())
    }
}

fn default_page_size() -> usize {
    10
}

fn default_cache_max_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_cache_max_entries() -> usize {
    512
}

fn default_page_param() -> String {
    "_page".into()
}

fn default_limit_param() -> String {
    "_limit".into()
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("feed-orchestrator/", env!("CARGO_PKG_VERSION")).into()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
