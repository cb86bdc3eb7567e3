//! Conversion of backend hits into GeoJSON features.
//!
//! Copies the scalar properties, resolves localized fields against the
//! requested display language, and synthesizes `name` and `label` strings
//! when the document carries none. A hit without a coordinate is a
//! data-integrity error and propagates; it never defaults to (0, 0).

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    backend::Document,
    error::{AdresseError, Result},
};

#[derive(Debug, Clone, Serialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    kind: &'static str,
    /// `[lon, lat]`, GeoJSON axis order.
    coordinates: [f64; 2],
}

/// One resolved address candidate. Immutable once formatted.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub geometry: PointGeometry,
    pub properties: BTreeMap<String, String>,
}

impl Feature {
    pub fn lon(&self) -> f64 {
        self.geometry.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.geometry.coordinates[1]
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

fn insert_if_present(
    properties: &mut BTreeMap<String, String>,
    key: &str,
    value: Option<&String>,
) {
    if let Some(value) = value
        && !value.is_empty()
    {
        properties.insert(key.to_string(), value.clone());
    }
}

/// Convert one backend document into a feature, resolving localized fields
/// against `lang` with a fallback to the default language.
pub fn format_document(document: &Document, lang: Option<&str>) -> Result<Feature> {
    let mut properties = BTreeMap::new();

    insert_if_present(&mut properties, "osm_key", document.osm_key.as_ref());
    insert_if_present(&mut properties, "osm_value", document.osm_value.as_ref());
    insert_if_present(&mut properties, "postcode", document.postcode.as_ref());
    insert_if_present(&mut properties, "housenumber", document.housenumber.as_ref());
    insert_if_present(&mut properties, "ordinal", document.ordinal.as_ref());
    insert_if_present(&mut properties, "type", document.kind.as_ref());
    insert_if_present(&mut properties, "context", document.context.as_ref());

    for (key, field) in [
        ("name", document.name.as_ref()),
        ("city", document.city.as_ref()),
        ("street", document.street.as_ref()),
    ] {
        if let Some(value) = field.and_then(|f| f.resolve(lang))
            && !value.is_empty()
        {
            properties.insert(key.to_string(), value.to_string());
        }
    }

    // A housenumber point has no name of its own; compose one from its
    // number, ordinal and street. A synthesized name stays out of the label,
    // which already carries those parts.
    let name_synthesized = !properties.contains_key("name") && properties.contains_key("housenumber");
    if name_synthesized {
        let name = ["housenumber", "ordinal", "street"]
            .iter()
            .filter_map(|k| properties.get(*k))
            .filter(|v| !v.is_empty())
            .join(" ");
        properties.insert("name".to_string(), name);
    }

    let label = ["housenumber", "street", "name", "postcode", "city"]
        .iter()
        .filter(|k| !(name_synthesized && **k == "name"))
        .filter_map(|k| properties.get(*k))
        .filter(|v| !v.is_empty())
        .unique()
        .join(" ");
    if !label.is_empty() {
        properties.insert("label".to_string(), label);
    }

    let coordinate = document.coordinate.ok_or_else(|| {
        let hint = properties
            .get("label")
            .or_else(|| properties.get("name"))
            .cloned()
            .unwrap_or_else(|| "<unnamed>".to_string());
        AdresseError::MissingCoordinate(hint)
    })?;

    Ok(Feature {
        kind: "Feature",
        geometry: PointGeometry {
            kind: "Point",
            coordinates: [coordinate.lon, coordinate.lat],
        },
        properties,
    })
}
