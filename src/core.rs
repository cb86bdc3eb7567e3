//! The main [`Geocoder`] facade.
//!
//! Wires the cascade, batch resolver, reverse resolver and formatter around
//! an injected search backend and not-found sink. This is the surface a
//! transport layer (HTTP handler, CLI, import job) talks to.

use std::sync::Arc;

use ahash::AHashMap;
use tracing::instrument;

use crate::{
    backend::{Coordinate, SearchBackend},
    batch::{Table, resolve_table},
    cascade::run_cascade,
    config::GeocoderConfig,
    error::{AdresseError, Result},
    format::{Feature, FeatureCollection, format_document},
    notfound::{MemoryNotFoundLog, NotFoundSink},
    query::{Filters, MAX_LIMIT, Query},
    reverse::reverse_resolve,
};

/// Parameters of one resolve-by-text request, after graceful degradation of
/// malformed inputs: unparseable lon/lat/limit values become absent rather
/// than failing the request, and the coordinate is only formed when both
/// halves are present.
#[derive(Debug, Clone, Default)]
pub struct GeocodeParams {
    pub text: String,
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub limit: Option<usize>,
    pub filters: Filters,
}

impl GeocodeParams {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Parse a raw string map as handed over by a transport layer. A missing
    /// or empty `q` is the one rejected input; everything else degrades.
    pub fn from_raw(raw: &AHashMap<String, String>) -> Result<Self> {
        let text = raw
            .get("q")
            .map(String::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(AdresseError::MissingQueryText);
        }

        let mut filters = Filters::new();
        for field in crate::query::FilterField::ALL {
            if let Some(value) = raw.get(field.as_str()) {
                filters.set(field, value.clone());
            }
        }

        Ok(Self {
            text,
            lon: raw.get("lon").and_then(|v| v.parse().ok()),
            lat: raw.get("lat").and_then(|v| v.parse().ok()),
            limit: raw.get("limit").and_then(|v| v.parse().ok()),
            filters,
        })
    }

    pub fn with_coordinate(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinate { lat, lon }),
            _ => None,
        }
    }
}

/// Resolves free-text address queries, coordinates and tabular batches
/// against an injected search backend.
#[derive(Clone)]
pub struct Geocoder {
    backend: Arc<dyn SearchBackend>,
    not_found: Arc<dyn NotFoundSink>,
    config: GeocoderConfig,
}

impl Geocoder {
    pub fn builder() -> GeocoderBuilder {
        GeocoderBuilder::default()
    }

    pub fn new(backend: Arc<dyn SearchBackend>, not_found: Arc<dyn NotFoundSink>) -> Self {
        Self {
            backend,
            not_found,
            config: GeocoderConfig::default(),
        }
    }

    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }

    /// Resolve a free-text query into a ranked feature collection, running
    /// the relaxation cascade until one stage matches.
    #[instrument(name = "Geocode", level = "info", skip(self), fields(text = %params.text))]
    pub fn geocode(&self, params: &GeocodeParams) -> Result<FeatureCollection> {
        if params.text.trim().is_empty() {
            return Err(AdresseError::MissingQueryText);
        }

        let query = Query {
            text: params.text.clone(),
            coordinate: params.coordinate(),
            filters: params.filters.clone(),
            match_all: true,
            limit: params
                .limit
                .unwrap_or(self.config.default_limit)
                .clamp(1, MAX_LIMIT),
        };

        let response = run_cascade(
            self.backend.as_ref(),
            &self.config.index,
            &query,
            self.not_found.as_ref(),
        )?;

        let lang = self.config.language.as_deref();
        let features = response
            .hits
            .iter()
            .map(|hit| format_document(hit, lang))
            .collect::<Result<Vec<Feature>>>()?;
        Ok(FeatureCollection::new(features))
    }

    /// Resolve a coordinate back to its nearest address, if any.
    #[instrument(name = "Reverse", level = "info", skip(self, coordinate))]
    pub fn reverse(&self, coordinate: Coordinate, kind: Option<&str>) -> Result<Option<Feature>> {
        reverse_resolve(
            self.backend.as_ref(),
            &self.config.index,
            coordinate,
            kind,
            self.config.language.as_deref(),
            self.not_found.as_ref(),
        )
    }

    /// Resolve every row of a table against the designated text columns.
    /// Single attempt per row; see [`crate::batch`].
    pub fn geocode_table(
        &self,
        table: &Table,
        text_columns: &[String],
        match_all: bool,
    ) -> Result<Table> {
        resolve_table(
            self.backend.as_ref(),
            &self.config.index,
            table,
            text_columns,
            match_all,
            self.config.language.as_deref(),
            self.not_found.as_ref(),
        )
    }
}

/// Builder for [`Geocoder`]. A backend is required; the not-found sink
/// defaults to an in-memory log when none is supplied.
#[derive(Default)]
pub struct GeocoderBuilder {
    backend: Option<Arc<dyn SearchBackend>>,
    not_found: Option<Arc<dyn NotFoundSink>>,
    config: GeocoderConfig,
}

impl GeocoderBuilder {
    pub fn backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn not_found_sink(mut self, sink: Arc<dyn NotFoundSink>) -> Self {
        self.not_found = Some(sink);
        self
    }

    pub fn config(mut self, config: GeocoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Geocoder> {
        let backend = self
            .backend
            .ok_or_else(|| AdresseError::ConfigError("a search backend is required".to_string()))?;
        Ok(Geocoder {
            backend,
            not_found: self
                .not_found
                .unwrap_or_else(|| Arc::new(MemoryNotFoundLog::new())),
            config: self.config,
        })
    }
}
