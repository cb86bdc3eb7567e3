//! Batch resolution of tabular inputs.
//!
//! Each row's designated columns are space-joined into one query text,
//! resolved with a single attempt (no cascade: one shot per row trades recall
//! for throughput), and written back aligned to input order. Requests travel
//! in fixed-size chunks; chunks are independent and dispatched in parallel,
//! with every chunk's responses reinserted at its original row offsets.

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::{BatchOutcome, SearchBackend, SearchRequest},
    error::{AdresseError, Result},
    format::format_document,
    notfound::NotFoundSink,
    query::{Query, build_search_request},
};

/// Requests per multi-query call.
pub const CHUNK_SIZE: usize = 200;

const RESULT_COLUMNS: [&str; 3] = ["latitude", "longitude", "address"];

/// An ordered, rectangular table. Output row count always equals input row
/// count and original cells are never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Resolved values for one row, empty until (and unless) a match lands.
#[derive(Debug, Clone, Default)]
struct RowResult {
    latitude: String,
    longitude: String,
    address: String,
}

fn row_query_text(row: &[String], column_indices: &[usize]) -> String {
    let text = column_indices
        .iter()
        .filter_map(|&i| row.get(i))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn consume_outcome(
    outcome: BatchOutcome,
    text: &str,
    lang: Option<&str>,
    not_found: &dyn NotFoundSink,
) -> RowResult {
    match outcome {
        BatchOutcome::Response(response) => {
            // An empty hit list with a nonzero total is a known backend
            // anomaly; tolerate it as an unresolved row.
            let Some(hit) = response.hits.first() else {
                if response.total > 0 {
                    debug!(total = response.total, "empty hit list despite nonzero total");
                }
                if let Err(e) = not_found.append(text) {
                    warn!("could not record not-found row '{text}': {e}");
                }
                return RowResult::default();
            };
            match format_document(hit, lang) {
                Ok(feature) => RowResult {
                    latitude: feature.lat().to_string(),
                    longitude: feature.lon().to_string(),
                    address: feature.property("label").unwrap_or_default().to_string(),
                },
                Err(e) => {
                    // Data-integrity failure on the matched document; the row
                    // passes through untouched and is not a miss.
                    warn!("dropping malformed hit for '{text}': {e}");
                    RowResult::default()
                }
            }
        }
        BatchOutcome::Error(message) => {
            // The backend could not answer; distinct from "found nothing",
            // so no not-found entry.
            debug!("row '{text}' errored: {message}");
            RowResult::default()
        }
    }
}

/// Resolve every row of `table` against `text_columns` and return the table
/// with `latitude`, `longitude` and `address` columns appended.
#[instrument(
    name = "Batch Resolve",
    level = "info",
    skip_all,
    fields(rows = table.rows.len(), match_all)
)]
pub fn resolve_table(
    backend: &dyn SearchBackend,
    index: &str,
    table: &Table,
    text_columns: &[String],
    match_all: bool,
    lang: Option<&str>,
    not_found: &dyn NotFoundSink,
) -> Result<Table> {
    let column_indices = text_columns
        .iter()
        .map(|name| {
            table
                .column_index(name)
                .ok_or_else(|| AdresseError::ConfigError(format!("unknown column '{name}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    // One request per row with non-empty query text; all-empty rows issue no
    // backend call and pass through unresolved.
    let mut pending: Vec<(usize, String, SearchRequest)> = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let text = row_query_text(row, &column_indices);
        if text.is_empty() {
            continue;
        }
        let mut query = Query::new(text.clone());
        query.match_all = match_all;
        query.limit = 1;
        pending.push((row_idx, text, build_search_request(&query)));
    }

    info!(
        requests = pending.len(),
        chunks = pending.len().div_ceil(CHUNK_SIZE.max(1)),
        "submitting batch"
    );

    // Independent chunks run in parallel; each one pairs its outcomes back to
    // the row indices it carried, so reassembly is order-exact regardless of
    // chunk scheduling.
    let chunk_results: Vec<Result<Vec<(usize, RowResult)>>> = pending
        .par_chunks(CHUNK_SIZE)
        .map(|chunk| {
            let requests: Vec<(String, SearchRequest)> = chunk
                .iter()
                .map(|(_, _, request)| (index.to_string(), request.clone()))
                .collect();
            let outcomes = backend.batch_search(&requests)?;
            debug_assert_eq!(outcomes.len(), chunk.len());
            Ok(chunk
                .iter()
                .zip(outcomes)
                .map(|((row_idx, text, _), outcome)| {
                    (*row_idx, consume_outcome(outcome, text, lang, not_found))
                })
                .collect())
        })
        .collect();

    let mut results: Vec<RowResult> = vec![RowResult::default(); table.rows.len()];
    for chunk in chunk_results {
        for (row_idx, result) in chunk? {
            results[row_idx] = result;
        }
    }

    let mut columns = table.columns.clone();
    columns.extend(RESULT_COLUMNS.iter().map(ToString::to_string));
    let rows = table
        .rows
        .iter()
        .zip(results)
        .map(|(row, result)| {
            let mut out = row.clone();
            out.push(result.latitude);
            out.push(result.longitude);
            out.push(result.address);
            out
        })
        .collect();

    Ok(Table { columns, rows })
}
