//! Street-name normalization.
//!
//! Provides a deterministic normalization pipeline applied symmetrically
//! to catalog names and user queries, so that `"Av. San Martín"` and
//! `"AV SAN MARTIN"` produce the same normalized form.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to strip punctuation characters that do not contribute to
/// street-name matching.
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,#'/\\\-ºª°]+").expect("valid regex"));

/// Leading tokens that name a street *type* rather than the street
/// itself. A leading run of these is dropped so that `"av san martin"`
/// and `"san martin"` normalize identically. Matching stops at the
/// first non-generic token: `"camino"` inside a proper name survives.
static GENERIC_PREFIX_TOKENS: &[&str] = &[
    "av",
    "avda",
    "avenida",
    "bulevar",
    "boulevard",
    "blvd",
    "bv",
    "c",
    "calle",
    "cl",
    "camino",
    "cno",
    "diag",
    "diagonal",
    "pas",
    "pasaje",
    "paseo",
    "pje",
    "psje",
    "ruta",
];

/// A normalized street name: the collapsed string and its token
/// sequence. Derived on the fly, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    /// Whitespace-collapsed normalized string.
    pub text: String,
    /// Ordered tokens of `text`.
    pub tokens: Vec<String>,
}

impl NormalizedName {
    /// Whether the name contains every token of `query_tokens` in
    /// order, as substrings with arbitrary gaps (the `%tok1%tok2%`
    /// wildcard containment pattern). An empty token list matches
    /// everything.
    #[must_use]
    pub fn contains_pattern(&self, query_tokens: &[String]) -> bool {
        let mut rest = self.text.as_str();
        for token in query_tokens {
            match rest.find(token.as_str()) {
                Some(idx) => rest = &rest[idx + token.len()..],
                None => return false,
            }
        }
        true
    }
}

/// Normalizes a street name or query.
///
/// The pipeline:
/// 1. Lowercase
/// 2. Strip punctuation (before NFKD, which would otherwise decompose
///    ordinal markers like `º` into plain letters)
/// 3. Strip diacritics (NFKD, drop combining marks)
/// 4. Collapse whitespace
/// 5. Drop a leading run of generic street-type tokens
///
/// Idempotent: normalizing an already-normalized name is a no-op. A
/// name consisting only of generic tokens normalizes to the empty
/// token list, which matches everything as a containment pattern.
#[must_use]
pub fn normalize(input: &str) -> NormalizedName {
    let lower = input.to_lowercase();
    let no_punct = PUNCTUATION_RE.replace_all(&lower, " ");
    let no_punct = strip_diacritics(&no_punct);

    let mut tokens: Vec<&str> = no_punct.split_whitespace().collect();

    let mut skip = 0;
    while skip < tokens.len() && GENERIC_PREFIX_TOKENS.contains(&tokens[skip]) {
        skip += 1;
    }
    tokens.drain(..skip);

    let tokens: Vec<String> = tokens.into_iter().map(str::to_string).collect();
    let text = tokens.join(" ");

    NormalizedName { text, tokens }
}

/// Removes combining diacritical marks after NFKD decomposition.
fn strip_diacritics(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

const fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_case_diacritics_and_prefix() {
        assert_eq!(normalize("Av. San Martín"), normalize("AV SAN MARTIN"));
        assert_eq!(normalize("Av. San Martín").text, "san martin");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("Calle Güemes  ");
        let twice = normalize(&once.text);
        assert_eq!(once, twice);
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("san   martin").text, "san martin");
    }

    #[test]
    fn drops_leading_run_of_generic_tokens() {
        assert_eq!(normalize("av diagonal mitre").text, "mitre");
    }

    #[test]
    fn keeps_generic_token_in_the_middle() {
        assert_eq!(normalize("bartolome mitre av").text, "bartolome mitre av");
    }

    #[test]
    fn all_generic_tokens_normalize_to_empty() {
        assert!(normalize("av").tokens.is_empty());
        assert!(normalize("av camino").tokens.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_tokens() {
        let n = normalize("   ");
        assert!(n.tokens.is_empty());
        assert!(n.text.is_empty());
    }

    #[test]
    fn pattern_containment_in_order() {
        let name = normalize("juan bautista alberdi");
        assert!(name.contains_pattern(&["juan".into(), "alberdi".into()]));
        assert!(name.contains_pattern(&["bau".into(), "alb".into()]));
        assert!(!name.contains_pattern(&["alberdi".into(), "juan".into()]));
    }

    #[test]
    fn empty_pattern_matches_everything() {
        assert!(normalize("mitre").contains_pattern(&[]));
    }

    #[test]
    fn ordinal_markers_are_stripped() {
        assert_eq!(normalize("9 de julio").text, normalize("9º de julio").text);
    }
}
