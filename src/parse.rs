//! Token-level parsing of French address strings.
//!
//! Pure helpers that split a name field into a street-type label plus residual
//! keywords, and a housenumber field into its numeric part plus ordinal suffix
//! ("bis", "ter", ...). A non-match is a normal outcome, never an error:
//! callers fall back to treating the input as opaque text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Closed list of recognized French street-type tokens. Accented entries are
/// matched accent-insensitively through the folded variant listed next to
/// them.
const STREET_TYPES: &[&str] = &[
    "allée",
    "allee",
    "allées",
    "allees",
    "avenue",
    "boulevard",
    "chaussée",
    "chaussee",
    "chemin",
    "cité",
    "cite",
    "clos",
    "côte",
    "cote",
    "cours",
    "domaine",
    "esplanade",
    "faubourg",
    "hameau",
    "impasse",
    "lotissement",
    "mail",
    "montée",
    "montee",
    "parvis",
    "passage",
    "place",
    "placette",
    "promenade",
    "quai",
    "résidence",
    "residence",
    "rond-point",
    "route",
    "rue",
    "ruelle",
    "sentier",
    "square",
    "traverse",
    "venelle",
    "villa",
    "voie",
];

/// Letters (including the French accented set), apostrophes, hyphens, spaces.
const KEYWORD_CHARS: &str = r"[a-zA-ZàâäéèêëîïôöùûüçÀÂÄÉÈÊËÎÏÔÖÙÛÜÇœŒæÆ'’\- ]";

/// Same set without spaces, for word-at-a-time matching.
const WORD_CHARS: &str = r"[a-zA-ZàâäéèêëîïôöùûüçÀÂÄÉÈÊËÎÏÔÖÙÛÜÇœŒæÆ'’\-]";

// Longest tokens first so "allées" is not shadowed by "allée" nor "ruelle"
// by "rue" in the alternation.
fn street_type_alternation() -> String {
    let mut types = STREET_TYPES.to_vec();
    types.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    types.join("|")
}

static STREET_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|\s)(?P<label>{})(?:\s+(?P<rest>.+))?$",
        street_type_alternation()
    ))
    .expect("street type pattern is valid")
});

static KEYWORD_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("{KEYWORD_CHARS}+")).expect("keyword pattern is valid"));

static HOUSENUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<number>\d+)\s*(?:[-/.,;]\s*)?(?P<ordinal>[^\d\s][^\d]*|\d)?\s*$")
        .expect("housenumber pattern is valid")
});

// The pattern must start at a token boundary and end before a non-word
// character, so a type embedded in another word ("Verrue") never matches.
static ADDRESS_PATTERN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|\s)(?P<addr>(?:\d{{1,4}}\s*(?:bis|ter|quater)?\s*,?\s+)?(?:{types})(?:\s+{word}+)*(?:\s+\d{{5}})?)(?:$|[^\p{{L}}\p{{N}}])",
        types = street_type_alternation(),
        word = WORD_CHARS,
    ))
    .expect("address pattern is valid")
});

/// A street name split into its recognized type token and residual keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetParts {
    /// The matched street-type token, lowercased ("rue", "avenue", ...).
    pub way_label: String,
    /// Remaining words, restricted to letters, apostrophes, hyphens, spaces.
    pub keywords: String,
}

/// A housenumber split into its numeric part and ordinal suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HousenumberParts {
    pub number: String,
    pub ordinal: Option<String>,
}

/// Split a name field into a street-type label and residual keywords.
///
/// Returns `None` when no street-type token from the closed list occurs in
/// the input; the caller must treat that as "no structured type recognized".
pub fn split_address(name: &str) -> Option<StreetParts> {
    let caps = STREET_TYPE_RE.captures(name)?;
    let way_label = caps.name("label")?.as_str().to_lowercase();
    let keywords = caps
        .name("rest")
        .map(|m| {
            let runs: Vec<&str> = KEYWORD_RUN_RE
                .find_iter(m.as_str())
                .map(|r| r.as_str().trim())
                .filter(|r| !r.is_empty())
                .collect();
            runs.join(" ")
        })
        .unwrap_or_default();
    Some(StreetParts {
        way_label,
        keywords,
    })
}

/// Split a housenumber field into a leading digit run and an optional
/// ordinal, which is either a non-digit run ("bis", "ter") or a single
/// trailing digit.
pub fn split_housenumber(value: &str) -> Option<HousenumberParts> {
    let caps = HOUSENUMBER_RE.captures(value)?;
    let number = caps.name("number")?.as_str().to_string();
    let ordinal = caps
        .name("ordinal")
        .map(|m| m.as_str().trim().to_string())
        .filter(|o| !o.is_empty());
    Some(HousenumberParts { number, ordinal })
}

/// Extract a canonical street-address substring: an optional leading number,
/// a recognized street-type token, free text, and an optional trailing
/// 5-digit postcode. Used by the relaxation cascade; `None` means the text
/// holds no recognizable address pattern.
pub fn extract_address(text: &str) -> Option<String> {
    ADDRESS_PATTERN_RE
        .captures(text)
        .and_then(|caps| caps.name("addr"))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_address_basic() {
        let parts = split_address("rue des Fleurs").unwrap();
        assert_eq!(parts.way_label, "rue");
        assert_eq!(parts.keywords, "des Fleurs");
    }

    #[test]
    fn split_address_is_case_and_accent_insensitive() {
        let parts = split_address("ALLÉE des Acacias").unwrap();
        assert_eq!(parts.way_label, "allée");
        assert_eq!(parts.keywords, "des Acacias");

        let folded = split_address("allee des Acacias").unwrap();
        assert_eq!(folded.way_label, "allee");
    }

    #[test]
    fn split_address_strips_non_keyword_characters() {
        let parts = split_address("avenue du 8 Mai").unwrap();
        assert_eq!(parts.way_label, "avenue");
        assert_eq!(parts.keywords, "du Mai");
    }

    #[test]
    fn split_address_no_street_type() {
        assert!(split_address("Les Lilas").is_none());
        assert!(split_address("").is_none());
    }

    #[test]
    fn split_address_keeps_accented_keywords() {
        let parts = split_address("chemin de la Côte-d'Or").unwrap();
        assert_eq!(parts.way_label, "chemin");
        assert_eq!(parts.keywords, "de la Côte-d'Or");
    }

    #[test]
    fn split_housenumber_with_ordinal() {
        let parts = split_housenumber("12bis").unwrap();
        assert_eq!(parts.number, "12");
        assert_eq!(parts.ordinal.as_deref(), Some("bis"));
    }

    #[test]
    fn split_housenumber_plain() {
        let parts = split_housenumber("12").unwrap();
        assert_eq!(parts.number, "12");
        assert_eq!(parts.ordinal, None);
    }

    #[test]
    fn split_housenumber_without_digits() {
        assert!(split_housenumber("bis").is_none());
        assert!(split_housenumber("").is_none());
    }

    #[test]
    fn split_housenumber_separator_and_digit_ordinal() {
        let parts = split_housenumber("12-ter").unwrap();
        assert_eq!(parts.number, "12");
        assert_eq!(parts.ordinal.as_deref(), Some("ter"));

        let parts = split_housenumber("12 3").unwrap();
        assert_eq!(parts.number, "12");
        assert_eq!(parts.ordinal.as_deref(), Some("3"));
    }

    #[test]
    fn extract_address_full_pattern() {
        let extracted = extract_address("some noise 12 rue de la Paix 75002 trailing").unwrap();
        assert_eq!(extracted, "12 rue de la Paix 75002");
    }

    #[test]
    fn extract_address_without_number_or_postcode() {
        let extracted = extract_address("lieu-dit place du Marché").unwrap();
        assert_eq!(extracted, "place du Marché");
    }

    #[test]
    fn extract_address_requires_street_type() {
        assert!(extract_address("Montaigu de Quercy").is_none());
        assert!(extract_address("only plain words here").is_none());
    }

    #[test]
    fn extract_address_ignores_embedded_type_words() {
        // "rue" inside "Verrue" is not a street type occurrence.
        assert!(extract_address("Verrue").is_none());
        assert!(extract_address("La Verrue 12340").is_none());
        // A standalone type token still matches, including the long forms
        // that share a prefix with a shorter one.
        assert_eq!(
            extract_address("ruelle des Soupirs").as_deref(),
            Some("ruelle des Soupirs")
        );
    }
}
