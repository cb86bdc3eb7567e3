//! The cascade of progressively relaxed search attempts.
//!
//! Up to five attempts per request, strictly sequential: each stage decides
//! to run based on the previous stage's result, and the first stage returning
//! at least one hit wins outright. Stage order is fixed; later stages are
//! strictly more permissive, so evaluating them earlier would suppress better
//! matches. A query that survives every stage with zero hits is a true miss
//! and goes to the not-found sink.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::{SearchBackend, SearchResponse},
    error::Result,
    notfound::NotFoundSink,
    parse::extract_address,
    query::{Query, build_search_request},
};

// Postal-service boilerplate that never helps matching: "Cedex"/"Cédex" with
// trailing digits, and "BP"/"CS" box numbers.
static CEDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bc[ée]dex\s*\d*").expect("cedex pattern is valid"));
static BOX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:BP|CS)\s*\d+\b").expect("box pattern is valid"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// The relaxation policy applied at one cascade stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    AsGiven,
    Normalized,
    DigitsStripped,
    ExtractedPattern,
    Relaxed,
}

/// Strip postal boilerplate tokens and collapse repeated whitespace.
pub fn normalize_text(text: &str) -> String {
    let without_cedex = CEDEX_RE.replace_all(text, " ");
    let without_boxes = BOX_RE.replace_all(&without_cedex, " ");
    WHITESPACE_RE
        .replace_all(&without_boxes, " ")
        .trim()
        .to_string()
}

fn strip_digits(text: &str) -> String {
    let without_digits: String = text.chars().filter(|c| !c.is_ascii_digit()).collect();
    WHITESPACE_RE
        .replace_all(&without_digits, " ")
        .trim()
        .to_string()
}

/// The ordered attempt list for one query text. Stage 3 is absent when no
/// address pattern can be extracted; every other stage always runs.
fn stages(text: &str) -> Vec<(Relaxation, String, bool)> {
    let normalized = normalize_text(text);
    let mut stages = vec![
        (Relaxation::AsGiven, text.to_string(), true),
        (Relaxation::Normalized, normalized.clone(), true),
        (Relaxation::DigitsStripped, strip_digits(&normalized), true),
    ];
    if let Some(extracted) = extract_address(&normalized) {
        stages.push((Relaxation::ExtractedPattern, extracted, false));
    }
    stages.push((Relaxation::Relaxed, normalized, false));
    stages
}

/// Run the cascade for one query. Returns the first non-empty stage result,
/// or the final empty result after logging the original text as a miss.
/// Backend errors propagate; zero hits never do.
#[instrument(name = "Cascade", level = "debug", skip_all, fields(text = %query.text))]
pub fn run_cascade(
    backend: &dyn SearchBackend,
    index: &str,
    query: &Query,
    not_found: &dyn NotFoundSink,
) -> Result<SearchResponse> {
    let mut response = SearchResponse::default();

    for (relaxation, text, match_all) in stages(&query.text) {
        let attempt = query.with_text(text, match_all);
        let request = build_search_request(&attempt);
        response = backend.search(index, &request)?;

        if response.hits.is_empty() {
            debug!(stage = ?relaxation, text = %attempt.text, "stage returned no hits");
        } else {
            info!(
                stage = ?relaxation,
                hits = response.hits.len(),
                total = response.total,
                "stage matched"
            );
            return Ok(response);
        }
    }

    debug!("all stages empty, logging miss");
    if let Err(e) = not_found.append(&query.text) {
        warn!("could not record not-found query '{}': {e}", query.text);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{
        backend::{BatchOutcome, Coordinate, Document, SearchRequest},
        notfound::MemoryNotFoundLog,
    };

    /// Scripted backend: pops one canned response per call and records the
    /// query text of every request it receives.
    struct ScriptedBackend {
        responses: Mutex<Vec<SearchResponse>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(mut responses: Vec<SearchResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl SearchBackend for ScriptedBackend {
        fn search(
            &self,
            _index: &str,
            request: &SearchRequest,
        ) -> crate::backend::Result<SearchResponse> {
            let text = request.body["query"]["bool"]["must"][0]["function_score"]["query"]["bool"]
                ["must"][0]["match"]["collector"]["query"]
                .as_str()
                .unwrap()
                .to_string();
            self.seen.lock().unwrap().push(text);
            Ok(self.responses.lock().unwrap().pop().unwrap_or_default())
        }

        fn batch_search(
            &self,
            _requests: &[(String, SearchRequest)],
        ) -> crate::backend::Result<Vec<BatchOutcome>> {
            unreachable!("cascade never issues batch calls")
        }
    }

    fn one_hit() -> SearchResponse {
        SearchResponse {
            hits: vec![Document {
                coordinate: Some(Coordinate { lat: 0.0, lon: 0.0 }),
                ..Document::default()
            }],
            total: 1,
        }
    }

    fn empty() -> SearchResponse {
        SearchResponse::default()
    }

    #[test]
    fn normalize_strips_postal_boilerplate() {
        assert_eq!(
            normalize_text("Mairie BP 42 60400 Noyon Cedex 9"),
            "Mairie 60400 Noyon"
        );
        assert_eq!(normalize_text("12 rue   des  Fleurs CÉDEX"), "12 rue des Fleurs");
        assert_eq!(normalize_text("CS 72201 Nantes"), "Nantes");
    }

    #[test]
    fn first_stage_hit_stops_the_cascade() {
        let backend = ScriptedBackend::new(vec![one_hit()]);
        let sink = MemoryNotFoundLog::new();
        let query = Query::new("12 rue de la Paix 75002 Paris");
        let response = run_cascade(&backend, "bano", &query, &sink).unwrap();
        assert_eq!(response.hits.len(), 1);
        assert_eq!(backend.seen().len(), 1);
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn stages_run_in_fixed_order_until_a_hit() {
        let backend = ScriptedBackend::new(vec![empty(), empty(), empty(), empty(), one_hit()]);
        let sink = MemoryNotFoundLog::new();
        let query = Query::new("12 rue de la Paix BP 3 75002");
        let response = run_cascade(&backend, "bano", &query, &sink).unwrap();
        assert_eq!(response.hits.len(), 1);
        assert_eq!(
            backend.seen(),
            vec![
                "12 rue de la Paix BP 3 75002", // stage 0: as given
                "12 rue de la Paix 75002",      // stage 1: normalized
                "rue de la Paix",               // stage 2: digits removed
                "12 rue de la Paix 75002",      // stage 3: extracted pattern
                "12 rue de la Paix 75002",      // stage 4: relaxed
            ]
        );
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn extraction_failure_skips_stage_three() {
        // No digits and no street-type token: four calls, not five.
        let backend = ScriptedBackend::new(vec![empty(); 4]);
        let sink = MemoryNotFoundLog::new();
        let query = Query::new("Montaigu de Quercy");
        run_cascade(&backend, "bano", &query, &sink).unwrap();
        assert_eq!(backend.seen().len(), 4);
        assert_eq!(sink.entries(), vec!["Montaigu de Quercy"]);
    }

    #[test]
    fn embedded_type_word_does_not_add_an_extraction_stage() {
        // "Verrue" contains "rue" but holds no street-type token, so the
        // extraction stage must not run.
        let backend = ScriptedBackend::new(vec![empty(); 4]);
        let sink = MemoryNotFoundLog::new();
        let query = Query::new("Verrue");
        run_cascade(&backend, "bano", &query, &sink).unwrap();
        assert_eq!(backend.seen(), vec!["Verrue"; 4]);
    }

    #[test]
    fn total_miss_logs_original_text_once() {
        let backend = ScriptedBackend::new(vec![empty(); 5]);
        let sink = MemoryNotFoundLog::new();
        let query = Query::new("3 impasse du Néant 99999");
        let response = run_cascade(&backend, "bano", &query, &sink).unwrap();
        assert!(response.hits.is_empty());
        assert_eq!(sink.entries(), vec!["3 impasse du Néant 99999"]);
    }

    #[test]
    fn late_stage_success_is_not_logged_as_miss() {
        // Misspelled city name: no digits, no street type, stage 3 skipped,
        // only the relaxed stage matches.
        let backend = ScriptedBackend::new(vec![empty(), empty(), empty(), one_hit()]);
        let sink = MemoryNotFoundLog::new();
        let query = Query::new("Chaunny");
        let response = run_cascade(&backend, "bano", &query, &sink).unwrap();
        assert_eq!(response.hits.len(), 1);
        assert_eq!(backend.seen().len(), 4);
        assert!(sink.entries().is_empty());
    }
}
