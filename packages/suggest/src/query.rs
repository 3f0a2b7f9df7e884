//! Hybrid query construction for street-name suggestions.
//!
//! One boolean query, three should-clauses, any of which may match:
//!
//! 1. phrase on the name field with positional slop (exact wording
//!    wins, highest boost),
//! 2. edge-n-gram prefix plus raw-field terms (incremental typing),
//! 3. per-token fuzzy with length-scaled edit distance (typos).

use tantivy::Term;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::IndexRecordOption;

use crate::schema::SuggestFields;

/// Positional slack allowed between phrase terms.
const PHRASE_SLOP: u32 = 3;

/// Boost for the phrase clause.
const PHRASE_BOOST: f32 = 5.0;

/// Boost for the prefix clause.
const PREFIX_BOOST: f32 = 3.0;

/// Boost for the fuzzy clause.
const FUZZY_BOOST: f32 = 1.5;

/// Builds the hybrid suggestion query from a pre-analyzed query.
///
/// `tokens` are the query's analyzed terms (lowercased, folded);
/// `folded` is the whole query lowercased and diacritic-folded, used
/// for the edge-n-gram prefix term. Returns `None` when the query
/// analyzes to nothing, in which case the caller should return an
/// empty result rather than search.
///
/// The clauses are combined as pure should-clauses: at least one must
/// match for a document to score (`minimum_should_match = 1`
/// semantics).
#[must_use]
pub fn build_suggest_query(
    fields: &SuggestFields,
    tokens: &[String],
    folded: &str,
) -> Option<Box<dyn Query>> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(3);

    if let Some(q) = build_phrase_clause(fields, tokens) {
        clauses.push((Occur::Should, Box::new(BoostQuery::new(q, PHRASE_BOOST))));
    }

    if let Some(q) = build_prefix_clause(fields, tokens, folded) {
        clauses.push((Occur::Should, Box::new(BoostQuery::new(q, PREFIX_BOOST))));
    }

    if let Some(q) = build_fuzzy_clause(fields, tokens, folded) {
        clauses.push((Occur::Should, Box::new(BoostQuery::new(q, FUZZY_BOOST))));
    }

    if clauses.is_empty() {
        return None;
    }

    Some(Box::new(BooleanQuery::new(clauses)))
}

/// Phrase on the name field with slop. A single-token query degrades
/// to a plain term query (phrases need at least two terms).
fn build_phrase_clause(fields: &SuggestFields, tokens: &[String]) -> Option<Box<dyn Query>> {
    match tokens {
        [] => None,
        [single] => Some(Box::new(TermQuery::new(
            Term::from_field_text(fields.name, single),
            IndexRecordOption::WithFreqsAndPositions,
        ))),
        _ => {
            let terms: Vec<Term> = tokens
                .iter()
                .map(|t| Term::from_field_text(fields.name, t))
                .collect();
            let mut phrase = PhraseQuery::new(terms);
            phrase.set_slop(PHRASE_SLOP);
            Some(Box::new(phrase))
        }
    }
}

/// Edge-n-gram prefix term for the whole typed query, plus raw-field
/// term matches for each token.
fn build_prefix_clause(
    fields: &SuggestFields,
    tokens: &[String],
    folded: &str,
) -> Option<Box<dyn Query>> {
    let mut shoulds: Vec<(Occur, Box<dyn Query>)> = Vec::new();

    // Indexed prefixes are 2..=15 chars; anything longer is covered by
    // the phrase and fuzzy clauses.
    if (2..=15).contains(&folded.chars().count()) {
        shoulds.push((
            Occur::Should,
            Box::new(TermQuery::new(
                Term::from_field_text(fields.name_prefix, folded),
                IndexRecordOption::Basic,
            )),
        ));
    }

    for token in tokens {
        shoulds.push((
            Occur::Should,
            Box::new(TermQuery::new(
                Term::from_field_text(fields.name, token),
                IndexRecordOption::Basic,
            )),
        ));
    }

    if shoulds.is_empty() {
        return None;
    }
    Some(Box::new(BooleanQuery::new(shoulds)))
}

/// Per-token fuzzy terms with length-scaled edit distance, plus a
/// fuzzy term against the edge-n-gram field for the whole query. The
/// latter is what recovers run-together input ("sanmartn") where no
/// single name token is within edit distance.
fn build_fuzzy_clause(
    fields: &SuggestFields,
    tokens: &[String],
    folded: &str,
) -> Option<Box<dyn Query>> {
    let mut shoulds: Vec<(Occur, Box<dyn Query>)> = tokens
        .iter()
        .map(|token| {
            let term = Term::from_field_text(fields.name, token);
            let fuzzy = FuzzyTermQuery::new(term, fuzzy_distance(token), true);
            (Occur::Should, Box::new(fuzzy) as Box<dyn Query>)
        })
        .collect();

    if (2..=15).contains(&folded.chars().count()) {
        let term = Term::from_field_text(fields.name_prefix, folded);
        let fuzzy = FuzzyTermQuery::new(term, fuzzy_distance(folded), true);
        shoulds.push((Occur::Should, Box::new(fuzzy)));
    }

    if shoulds.is_empty() {
        return None;
    }
    Some(Box::new(BooleanQuery::new(shoulds)))
}

/// Edit-distance tolerance scaled by token length in characters: short
/// tokens must match exactly, medium tokens tolerate one edit, long
/// tokens two.
fn fuzzy_distance(token: &str) -> u8 {
    let len = token.chars().count();
    if len < 3 {
        0
    } else if len < 6 {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SuggestFields, build_schema};

    fn fields() -> SuggestFields {
        SuggestFields::from_schema(&build_schema())
    }

    #[test]
    fn builds_query_for_multi_token_input() {
        let q = build_suggest_query(&fields(), &["san".into(), "martin".into()], "san martin");
        assert!(q.is_some());
    }

    #[test]
    fn builds_query_for_single_token_input() {
        let q = build_suggest_query(&fields(), &["belgrano".into()], "belgrano");
        assert!(q.is_some());
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(build_suggest_query(&fields(), &[], "").is_none());
    }

    #[test]
    fn fuzzy_distance_scales_with_length() {
        assert_eq!(fuzzy_distance("av"), 0);
        assert_eq!(fuzzy_distance("san"), 1);
        assert_eq!(fuzzy_distance("martin"), 2);
    }

    #[test]
    fn fuzzy_distance_counts_characters_not_bytes() {
        // 5 characters, 6 bytes
        assert_eq!(fuzzy_distance("avión"), 1);
    }
}
