//! Backend search-request assembly.
//!
//! Turns a normalized [`Query`] into one structured request body: a fuzzy
//! "must" match on the collector field, boosted "should" clauses on the
//! structured sub-fields, the housenumber suppression filter, the scoring
//! function list, and the caller's filters as analyzed match clauses.

use ahash::AHashMap;
use serde_json::{Value, json};

use crate::{
    backend::{Coordinate, SearchRequest},
    score::score_functions,
};

/// Upper bound on the number of results a single request may ask for.
pub const MAX_LIMIT: usize = 50;
/// Result count used when the caller supplies none (or an unparseable one).
pub const DEFAULT_LIMIT: usize = 15;

const FUZZINESS: u8 = 1;
const PREFIX_LENGTH: u8 = 2;
const SEARCH_ANALYZER: &str = "search_stringanalyser";
const RAW_ANALYZER: &str = "raw_stringanalyser";

const NAME_KEYWORDS_BOOST: u16 = 200;
const STREET_KEYWORDS_BOOST: u16 = 150;
const CITY_BOOST: u16 = 50;
const WAY_LABEL_BOOST: u16 = 25;
const HOUSENUMBER_BOOST: u16 = 10;

/// Graduated minimum-should-match policy, keyed by token count: short
/// queries may drop a single token ("all but one"), longer ones
/// progressively more. Every bucket stays below the strict "100%", so a
/// relaxed attempt is never as demanding as a match-all one.
const MINIMUM_SHOULD_MATCH_STEPS: &[(usize, &str)] =
    &[(2, "-1"), (4, "90%"), (6, "75%"), (usize::MAX, "60%")];

/// The fixed set of filterable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Type,
    City,
    Postcode,
    Housenumber,
    Street,
}

impl FilterField {
    pub const ALL: [Self; 5] = [
        Self::Type,
        Self::City,
        Self::Postcode,
        Self::Housenumber,
        Self::Street,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::City => "city",
            Self::Postcode => "postcode",
            Self::Housenumber => "housenumber",
            Self::Street => "street",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Index field the filter actually matches against. `city` and `street`
    /// are nested objects, so their filters target the default-language
    /// sub-field.
    fn index_field(self) -> &'static str {
        match self {
            Self::City => "city.default",
            Self::Street => "street.default",
            Self::Type => "type",
            Self::Postcode => "postcode",
            Self::Housenumber => "housenumber",
        }
    }
}

/// User-supplied filter values over the fixed field set. Insertion order is
/// irrelevant; absent values contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    values: AHashMap<FilterField, String>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a filter; empty values are dropped rather than stored.
    pub fn set(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.values.insert(field, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the caller explicitly asked for housenumber documents.
    /// Compared by value: `type=housenumber` and nothing else qualifies.
    pub fn requests_housenumbers(&self) -> bool {
        self.values.get(&FilterField::Type).map(String::as_str) == Some("housenumber")
    }

    fn iter(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

/// One normalized resolve request. Immutable once built; the cascade clones
/// and rewrites the text rather than mutating in place.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub coordinate: Option<Coordinate>,
    pub filters: Filters,
    pub match_all: bool,
    pub limit: usize,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            coordinate: None,
            filters: Filters::new(),
            match_all: true,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_text(&self, text: impl Into<String>, match_all: bool) -> Self {
        Self {
            text: text.into(),
            match_all,
            ..self.clone()
        }
    }
}

fn minimum_should_match(text: &str, match_all: bool) -> &'static str {
    if match_all {
        return "100%";
    }
    let tokens = text.split_whitespace().count();
    MINIMUM_SHOULD_MATCH_STEPS
        .iter()
        .find(|(upper, _)| tokens <= *upper)
        .map(|(_, policy)| *policy)
        .expect("last step covers all token counts")
}

fn boosted_match(field: &str, query: &str, boost: u16) -> Value {
    json!({ "match": { field: { "query": query, "boost": boost } } })
}

/// Keep docs that lack a housenumber, or have no name at all, or whose
/// housenumber and ordinal both match the query text through the raw
/// analyzer. Prevents individual house-number points from crowding out
/// street and locality results.
fn housenumber_suppression_filter(text: &str) -> Value {
    json!({
        "bool": {
            "should": [
                { "bool": { "must_not": { "exists": { "field": "housenumber" } } } },
                { "bool": { "must_not": [
                    { "exists": { "field": "name.default" } },
                    { "exists": { "field": "name.keywords" } },
                ] } },
                { "bool": { "must": [
                    { "match": { "housenumber": { "query": text, "analyzer": RAW_ANALYZER } } },
                    { "match": { "ordinal": { "query": text, "analyzer": RAW_ANALYZER } } },
                ] } },
            ]
        }
    })
}

/// Build the backend request for one query. Never fails; invalid limits are
/// clamped upstream, not rejected here.
pub fn build_search_request(query: &Query) -> SearchRequest {
    let text = query.text.as_str();

    let relevance = json!({
        "bool": {
            "must": [{
                "match": {
                    "collector": {
                        "query": text,
                        "fuzziness": FUZZINESS,
                        "prefix_length": PREFIX_LENGTH,
                        "minimum_should_match": minimum_should_match(text, query.match_all),
                        "analyzer": SEARCH_ANALYZER,
                    }
                }
            }],
            "should": [
                boosted_match("name.keywords", text, NAME_KEYWORDS_BOOST),
                boosted_match("street.keywords", text, STREET_KEYWORDS_BOOST),
                boosted_match("city.default", text, CITY_BOOST),
                boosted_match("way_label", text, WAY_LABEL_BOOST),
                boosted_match("housenumber", text, HOUSENUMBER_BOOST),
            ],
        }
    });

    let functions: Vec<Value> = score_functions(query.coordinate)
        .iter()
        .map(|f| f.to_json())
        .collect();

    let scored = json!({
        "function_score": {
            "score_mode": "multiply",
            "boost_mode": "multiply",
            "query": relevance,
            "functions": functions,
        }
    });

    // The scored query plus one required match clause per user filter.
    // Filters go through the same analysis as free text on purpose: user
    // strings and index terms are normalized identically, so an exact-term
    // filter would miss (e.g. "Chauny" vs the indexed "chauny").
    let mut must = vec![scored];
    for (field, value) in query.filters.iter() {
        must.push(json!({ "match": { field.index_field(): value } }));
    }

    let mut outer = json!({ "bool": { "must": must } });
    if !query.filters.requests_housenumbers() {
        outer["bool"]["filter"] = json!([housenumber_suppression_filter(text)]);
    }

    SearchRequest {
        body: json!({ "query": outer }),
        size: query.limit,
    }
}
