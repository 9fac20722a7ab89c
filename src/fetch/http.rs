//! reqwest-backed implementation of every fetcher trait.

use super::{ByteFetcher, DetailFetcher, PageFetcher, ParentListFetcher};
use crate::config::{EndpointConfig, HttpConfig};
use crate::error::{Error, Result, TransportError};
use crate::types::{Detail, Item, Locator, ParentEntity, ParentId};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Wire shape of a detail response; the key comes from the request.
#[derive(Deserialize)]
struct DetailPayload {
    #[serde(alias = "price")]
    value: f64,
}

/// HTTP fetcher for JSON endpoints
///
/// Cloneable: the inner `reqwest::Client` is reference counted, so clones
/// share one connection pool.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    /// HTTP client for all requests
    http_client: reqwest::Client,

    /// Configured endpoints
    endpoints: EndpointConfig,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http_client,
            endpoints: config.endpoints.clone(),
        })
    }

    fn endpoint<'a>(&self, value: &'a Option<String>, key: &str) -> Result<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| Error::config(key, "endpoint is not configured"))
    }

    /// Build the URL for one page of the item collection
    pub fn page_url(&self, page: u32, limit: usize) -> Result<url::Url> {
        let base = self.endpoint(&self.endpoints.items_url, "http.endpoints.items_url")?;
        let mut url = url::Url::parse(base)?;
        url.query_pairs_mut()
            .append_pair(&self.endpoints.page_param, &page.to_string())
            .append_pair(&self.endpoints.limit_param, &limit.to_string());
        Ok(url)
    }

    /// Build the detail URL for one parent
    pub fn detail_url(&self, key: &ParentId) -> Result<url::Url> {
        let template = self.endpoint(
            &self.endpoints.detail_url_template,
            "http.endpoints.detail_url_template",
        )?;
        let encoded = urlencoding::encode(key.as_str());
        Ok(url::Url::parse(&template.replace("{key}", &encoded))?)
    }

    async fn send(&self, url: &str) -> std::result::Result<reqwest::Response, TransportError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> std::result::Result<T, TransportError> {
        let response = self.send(url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::body(url, e))
    }
}

/// Configuration problems are reported through the transport channel so the
/// engines treat them like any other failed fetch.
fn config_failure(err: Error) -> TransportError {
    match err {
        Error::Config {
            message,
            key: Some(key),
        } => TransportError::Other(format!("{key}: {message}")),
        other => TransportError::Other(other.to_string()),
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(
        &self,
        page: u32,
        limit: usize,
    ) -> std::result::Result<Vec<Item>, TransportError> {
        let url = self.page_url(page, limit).map_err(config_failure)?;
        debug!(page, limit, %url, "fetching page");
        self.get_json(url.as_str()).await
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch_bytes(&self, locator: &Locator) -> std::result::Result<Bytes, TransportError> {
        debug!(%locator, "fetching bytes");
        let response = self.send(locator.as_str()).await?;
        response
            .bytes()
            .await
            .map_err(|e| TransportError::body(locator.as_str(), e))
    }
}

#[async_trait]
impl ParentListFetcher for HttpFetcher {
    async fn fetch_parents(&self) -> std::result::Result<Vec<ParentEntity>, TransportError> {
        let url = self
            .endpoint(&self.endpoints.parents_url, "http.endpoints.parents_url")
            .map_err(config_failure)?;
        debug!(%url, "fetching parent list");
        self.get_json(url).await
    }
}

#[async_trait]
impl DetailFetcher for HttpFetcher {
    async fn fetch_detail(&self, key: &ParentId) -> std::result::Result<Detail, TransportError> {
        let url = self.detail_url(key).map_err(config_failure)?;
        debug!(parent = %key, %url, "fetching detail");

        let payload: DetailPayload = match self.get_json(url.as_str()).await {
            Ok(payload) => payload,
            Err(TransportError::Status { status: 404, .. }) => {
                return Err(TransportError::NotFound(format!("detail for {key}")));
            }
            Err(e) => return Err(e),
        };

        Ok(Detail {
            key: key.clone(),
            value: payload.value,
        })
    }
}
