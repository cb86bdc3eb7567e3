//! Contract with the external full-text search backend.
//!
//! The core never inspects the backend's ranking or tokenization internals.
//! It hands over opaque request bodies built by [`crate::query`] and consumes
//! the ordered hit lists that come back. Implementations wrap whatever client
//! talks to the actual index; tests substitute an in-memory mock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("search backend unavailable: {0}")]
    Unavailable(String),
    #[error("search backend rejected the request: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// One search request, ready to be submitted to the backend.
///
/// `body` is the full structured query (bool clauses, scoring functions,
/// filters) and is treated as opaque past this point.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub body: serde_json::Value,
    pub size: usize,
}

/// Geographic point, always carried as a complete pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A sub-object holding the default-language value of a field, its keyword
/// form, and any additional language variants the index carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizedField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(flatten)]
    pub variants: HashMap<String, String>,
}

impl LocalizedField {
    /// Value in the requested language, falling back to the default language.
    pub fn resolve(&self, lang: Option<&str>) -> Option<&str> {
        lang.and_then(|l| self.variants.get(l).map(String::as_str))
            .or(self.default.as_deref())
    }
}

/// A candidate document returned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<LocalizedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<LocalizedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub housenumber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    // Mandatory in a well-formed index; kept optional at the wire level so a
    // broken document surfaces as a formatting error, not a parse failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
}

/// Ordered hits plus the backend's reported total for one request.
#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub hits: Vec<Document>,
    pub total: u64,
}

/// One entry of a batch response, in submission order.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Response(SearchResponse),
    Error(String),
}

/// Capability interface over the external search engine.
///
/// `batch_search` must return exactly one outcome per submitted request, in
/// submission order; the batch resolver relies on this for row correlation.
pub trait SearchBackend: Send + Sync {
    fn search(&self, index: &str, request: &SearchRequest) -> Result<SearchResponse>;

    fn batch_search(&self, requests: &[(String, SearchRequest)]) -> Result<Vec<BatchOutcome>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_field_prefers_requested_language() {
        let field = LocalizedField {
            default: Some("Paris".into()),
            keywords: None,
            variants: HashMap::from([("ru".to_string(), "Париж".to_string())]),
        };
        assert_eq!(field.resolve(Some("ru")), Some("Париж"));
        assert_eq!(field.resolve(Some("de")), Some("Paris"));
        assert_eq!(field.resolve(None), Some("Paris"));
    }

    #[test]
    fn document_deserializes_with_nested_fields() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "name": {"default": "Rue de la Paix", "keywords": "paix"},
            "city": {"default": "Paris"},
            "type": "street",
            "coordinate": {"lat": 48.86, "lon": 2.33}
        }))
        .unwrap();
        assert_eq!(doc.name.unwrap().default.as_deref(), Some("Rue de la Paix"));
        assert_eq!(doc.kind.as_deref(), Some("street"));
        assert!((doc.coordinate.unwrap().lat - 48.86).abs() < f64::EPSILON);
    }

    #[test]
    fn document_without_coordinate_still_parses() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "postcode": "75002"
        }))
        .unwrap();
        assert!(doc.coordinate.is_none());
    }
}
