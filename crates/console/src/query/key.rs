use std::fmt;

use serde::Serialize;

/// Top-level key segments. List-like reads live under the plural scope,
/// single-entity reads under the singular one.
pub mod scope {
    pub const ARTISTS: &str = "artists";
    pub const ARTIST: &str = "artist";
    pub const ARTWORKS: &str = "artworks";
    pub const ARTWORK: &str = "artwork";
    pub const ORDERS: &str = "orders";
    pub const ORDER: &str = "order";
    pub const ORDER_STATS: &str = "order-stats";
    pub const BANNERS: &str = "banners";
    pub const BANNER: &str = "banner";
    pub const COLLECTIONS: &str = "collections";
    pub const COLLECTION: &str = "collection";
}

/// Hierarchical cache key, e.g. `["artworks", "list", "{\"page\":1}"]`.
///
/// Invalidation matches by prefix: `["artworks"]` covers every artwork list
/// but not `["artwork", "aw-1"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    #[must_use]
    pub fn scope(scope: &str) -> Self {
        Self(vec![scope.to_string()])
    }

    #[must_use]
    pub fn with(mut self, part: impl fmt::Display) -> Self {
        self.0.push(part.to_string());
        self
    }

    /// Append serialized parameters. Equal parameters give equal keys because
    /// struct fields serialize in declaration order.
    #[must_use]
    pub fn with_params<P: Serialize + ?Sized>(self, params: &P) -> Self {
        let encoded = serde_json::to_string(params).unwrap_or_default();
        self.with(encoded)
    }

    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArtworkQuery;

    #[test]
    fn test_prefix_matching() {
        let list = QueryKey::scope(scope::ARTWORKS)
            .with("list")
            .with_params(&ArtworkQuery::default());
        let detail = QueryKey::scope(scope::ARTWORK).with("aw-1");

        assert!(list.starts_with(&QueryKey::scope(scope::ARTWORKS)));
        assert!(!detail.starts_with(&QueryKey::scope(scope::ARTWORKS)));
        assert!(detail.starts_with(&detail));
    }

    #[test]
    fn test_equal_params_give_equal_keys() {
        let params = ArtworkQuery {
            page: Some(2),
            category: Some("Painting".to_string()),
            ..ArtworkQuery::default()
        };
        let a = QueryKey::scope(scope::ARTWORKS).with_params(&params);
        let b = QueryKey::scope(scope::ARTWORKS).with_params(&params.clone());
        assert_eq!(a, b);
        assert_ne!(a, QueryKey::scope(scope::ARTWORKS).with_params(&ArtworkQuery::default()));
    }

    #[test]
    fn test_display() {
        let key = QueryKey::scope(scope::BANNERS).with("active");
        assert_eq!(key.to_string(), "banners/active");
    }
}
