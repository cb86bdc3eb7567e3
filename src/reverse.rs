//! Reverse resolution: coordinate to nearest address.
//!
//! One match-everything request sorted by ascending geographic distance,
//! size 1, optionally filtered by entity type. No cascade applies.

use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::{
    backend::{Coordinate, SearchBackend, SearchRequest},
    error::Result,
    format::{Feature, format_document},
    notfound::NotFoundSink,
};

pub fn build_reverse_request(coordinate: Coordinate, kind: Option<&str>) -> SearchRequest {
    let query = match kind {
        Some(kind) => json!({ "bool": { "must": [{ "match": { "type": kind } }] } }),
        None => json!({ "match_all": {} }),
    };
    SearchRequest {
        body: json!({
            "query": query,
            "sort": [{
                "_geo_distance": {
                    "coordinate": { "lat": coordinate.lat, "lon": coordinate.lon },
                    "order": "asc",
                    "unit": "km",
                }
            }],
        }),
        size: 1,
    }
}

/// Resolve a coordinate to its nearest address, if any. A zero-hit lookup is
/// recorded in the not-found sink with the coordinate and type.
#[instrument(
    name = "Reverse Resolve",
    level = "debug",
    skip(backend, not_found),
    fields(lat = coordinate.lat, lon = coordinate.lon)
)]
pub fn reverse_resolve(
    backend: &dyn SearchBackend,
    index: &str,
    coordinate: Coordinate,
    kind: Option<&str>,
    lang: Option<&str>,
    not_found: &dyn NotFoundSink,
) -> Result<Option<Feature>> {
    let request = build_reverse_request(coordinate, kind);
    let response = backend.search(index, &request)?;

    let Some(hit) = response.hits.first() else {
        debug!("no document near coordinate");
        let entry = format!(
            "reverse: lat={} lon={} type={}",
            coordinate.lat,
            coordinate.lon,
            kind.unwrap_or("*")
        );
        if let Err(e) = not_found.append(&entry) {
            warn!("could not record not-found reverse lookup: {e}");
        }
        return Ok(None);
    };

    format_document(hit, lang).map(Some)
}
