//! Core types for feed-orchestrator

use serde::{Deserialize, Serialize};

/// Unique identifier for a feed item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a remote byte resource, used as the artifact cache key
///
/// Backed by an absolute URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(url::Url);

impl Locator {
    /// Parse a locator from an absolute URL string
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Ok(Self(url::Url::parse(raw)?))
    }

    /// The underlying URL
    pub fn url(&self) -> &url::Url {
        &self.0
    }

    /// The locator as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<url::Url> for Locator {
    fn from(url: url::Url) -> Self {
        Self(url)
    }
}

impl std::str::FromStr for Locator {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single record of a paged collection (e.g. a photo)
///
/// Identity is the [`ItemId`]: two items with the same id are equal even if
/// their titles differ.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    /// Stable unique identifier
    pub id: ItemId,

    /// Display title
    pub title: String,

    /// Locator of the associated artifact
    ///
    /// Accepts `thumbnailUrl` on the wire, which is how photo APIs in the
    /// JSONPlaceholder family name it.
    #[serde(alias = "thumbnailUrl")]
    pub locator: Locator,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl std::hash::Hash for Item {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Identifier of a parent entity (e.g. a ticker symbol)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentId(pub String);

impl ParentId {
    /// Create a new ParentId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An entity whose detail is fetched separately (e.g. a portfolio holding)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParentEntity {
    /// Identifier, also the aggregation sort key
    pub id: ParentId,

    /// Display name
    pub name: String,

    /// Quantity/weight the detail value is multiplied by
    pub quantity: f64,
}

impl ParentEntity {
    /// Create a new parent entity
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: f64) -> Self {
        Self {
            id: ParentId::new(id),
            name: name.into(),
            quantity,
        }
    }
}

/// Detail fetched for one parent (e.g. a quote)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    /// Parent the detail belongs to
    pub key: ParentId,

    /// Per-unit value
    pub value: f64,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_equality_is_identifier_based() {
        let locator = Locator::parse("https://img.example.com/1.png").unwrap();
        let a = Item {
            id: ItemId(1),
            title: "first".into(),
            locator: locator.clone(),
        };
        let renamed = Item {
            id: ItemId(1),
            title: "renamed".into(),
            locator: Locator::parse("https://img.example.com/other.png").unwrap(),
        };
        let other = Item {
            id: ItemId(2),
            title: "first".into(),
            locator,
        };

        assert_eq!(a, renamed);
        assert_ne!(a, other);
    }

    #[test]
    fn item_deserializes_from_photo_payload() {
        let json = r#"{
            "albumId": 1,
            "id": 7,
            "title": "accusamus beatae",
            "url": "https://via.placeholder.com/600/92c952",
            "thumbnailUrl": "https://via.placeholder.com/150/92c952"
        }"#;

        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, ItemId(7));
        assert_eq!(item.title, "accusamus beatae");
        assert_eq!(
            item.locator.as_str(),
            "https://via.placeholder.com/150/92c952"
        );
    }

    #[test]
    fn locator_rejects_relative_urls() {
        assert!(Locator::parse("/relative/path.png").is_err());
        let locator: Locator = "https://img.example.com/a.png".parse().unwrap();
        assert_eq!(locator.to_string(), "https://img.example.com/a.png");
    }

    #[test]
    fn parent_ids_order_lexically() {
        let mut ids = vec![ParentId::from("MSFT"), ParentId::from("AAPL"), ParentId::from("GOOG")];
        ids.sort();
        assert_eq!(
            ids.iter().map(ParentId::as_str).collect::<Vec<_>>(),
            vec!["AAPL", "GOOG", "MSFT"]
        );
    }
}
