//! Adresse - French address resolution and ranking
//!
//! Adresse resolves free-text address queries into ranked, geocoded address
//! candidates against an external full-text search backend, resolves
//! coordinates back to the nearest address, and batch-resolves tabular
//! imports. The backend (index schema, analyzers, storage) stays behind the
//! [`SearchBackend`] trait; this crate owns the retry/relaxation cascade, the
//! multiplicative scoring specification, the locale-sensitive token parsing
//! and the request assembly.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use adresse::{FileNotFoundLog, GeocodeParams, Geocoder, SearchBackend};
//!
//! # fn connect() -> Arc<dyn SearchBackend> { unimplemented!() }
//! let backend: Arc<dyn SearchBackend> = connect();
//! let geocoder = Geocoder::builder()
//!     .backend(backend)
//!     .not_found_sink(Arc::new(FileNotFoundLog::open("notfound.log")?))
//!     .build()?;
//!
//! let params = GeocodeParams::new("12 rue de la Paix 75002 Paris").with_coordinate(48.86, 2.33);
//! let features = geocoder.geocode(&params)?;
//! if let Some(best) = features.features.first() {
//!     println!("{:?}", best.property("label"));
//! }
//! # Ok::<(), adresse::error::AdresseError>(())
//! ```
//!
//! # How resolution works
//!
//! - **Cascade**: up to five progressively relaxed attempts per query, first
//!   non-empty stage wins ([`cascade`]).
//! - **Scoring**: text relevance × importance boost × distance decay,
//!   evaluated by the backend from a specification built here ([`score`]).
//! - **Parsing**: street-type/keyword and housenumber/ordinal splitting for
//!   French address strings ([`parse`]).
//! - **Batch**: chunked multi-queries with order-preserving row correlation
//!   ([`batch`]).

use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

pub mod backend;
pub mod batch;
pub mod cascade;
mod config;
mod core;
pub mod error;
pub mod format;
pub mod notfound;
pub mod parse;
pub mod query;
pub mod reverse;
pub mod score;

pub use backend::{
    BackendError, BatchOutcome, Coordinate, Document, LocalizedField, SearchBackend,
    SearchRequest, SearchResponse,
};
pub use batch::Table;
pub use config::{GeocoderConfig, GeocoderConfigBuilder};
pub use crate::core::{GeocodeParams, Geocoder, GeocoderBuilder};
pub use error::AdresseError;
pub use format::{Feature, FeatureCollection};
pub use notfound::{FileNotFoundLog, MemoryNotFoundLog, NotFoundSink};
pub use query::{Filters, FilterField, Query};
pub use score::ScoreFunction;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the library.
///
/// Sets up structured logging with configurable levels and filtering. Call
/// once at the start of your application; later calls are no-ops.
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::AdresseError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?;

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}
