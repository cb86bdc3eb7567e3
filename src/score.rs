//! Multiplicative scoring specification handed to the backend.
//!
//! The core never computes scores locally: it renders a function list that the
//! backend evaluates on top of the base text relevance, multiplying all terms
//! together. An importance boost is always present; a distance decay term is
//! added iff the request carries a reference coordinate.

use serde_json::{Value, json};

use crate::backend::Coordinate;

/// Fixed effective radius of the distance decay, in kilometers.
pub const MAX_DISTANCE_KM: f64 = 100.0;

/// Minimum distance fed to the decay formula, in kilometers. The formula has
/// a singularity at exactly zero distance; the clamp keeps the term finite.
pub const MIN_DISTANCE_KM: f64 = 0.01;

const IMPORTANCE_SCRIPT: &str = "1 + doc['importance'].value * 40";

const DISTANCE_SCRIPT: &str = "dist = max(doc['coordinate'].distanceInKm(lat, lon), minDist); \
     1 / (0.5 - 0.5 * exp(-5 * dist / maxDist))";

/// One term of the scoring specification.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreFunction {
    /// `score *= 1 + importance * 40`, importance in [0, 1], default 0.
    ImportanceBoost,
    /// `score *= 1 / (0.5 - 0.5 * exp(-5 * dist / max_distance_km))`.
    DistanceDecay {
        lat: f64,
        lon: f64,
        max_distance_km: f64,
    },
}

impl ScoreFunction {
    pub fn to_json(&self) -> Value {
        match self {
            Self::ImportanceBoost => json!({
                "script_score": {
                    "script": IMPORTANCE_SCRIPT,
                    "lang": "groovy",
                }
            }),
            Self::DistanceDecay {
                lat,
                lon,
                max_distance_km,
            } => json!({
                "script_score": {
                    "script": DISTANCE_SCRIPT,
                    "lang": "groovy",
                    "params": {
                        "lat": lat,
                        "lon": lon,
                        "maxDist": max_distance_km,
                        "minDist": MIN_DISTANCE_KM,
                    }
                }
            }),
        }
    }
}

/// The function list for one request: importance always, distance decay iff a
/// coordinate was supplied. Never fails.
pub fn score_functions(coordinate: Option<Coordinate>) -> Vec<ScoreFunction> {
    let mut functions = vec![ScoreFunction::ImportanceBoost];
    if let Some(coord) = coordinate {
        functions.push(ScoreFunction::DistanceDecay {
            lat: coord.lat,
            lon: coord.lon,
            max_distance_km: MAX_DISTANCE_KM,
        });
    }
    functions
}
