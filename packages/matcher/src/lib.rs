#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fuzzy street-name matching.
//!
//! Ranks catalog segments against a free-text query with three
//! independent signals, taking the best one per entry:
//!
//! - continuous string similarity between normalized names,
//! - a fixed 0.7 bonus when the entry contains the query's tokens in
//!   order (wildcard containment),
//! - 0.15 per query token appearing anywhere in the entry's name.
//!
//! The matcher is pure: it reads only the immutable catalog snapshot
//! and produces deterministic output. It replaces the stored procedure
//! the catalog database used to hide this ranking in, so the behavior
//! is unit-testable in isolation.

pub mod normalize;

use callejero_catalog::StreetSegment;
use rapidfuzz::distance::levenshtein;

pub use normalize::{NormalizedName, normalize};

/// Similarity threshold below which a non-pattern-matching entry is
/// discarded.
const SIMILARITY_FLOOR: f64 = 0.35;

/// Score granted when the entry's normalized name contains the query's
/// wildcard pattern.
const PATTERN_BONUS: f64 = 0.7;

/// Additive score per query token found as a substring of the entry's
/// normalized name.
const TOKEN_BONUS: f64 = 0.15;

/// Default result count when the caller does not specify one.
pub const DEFAULT_LIMIT: usize = 10;

/// A ranked candidate segment for a query.
///
/// Transient, produced per query; holds a reference into the catalog
/// snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CandidateMatch<'a> {
    /// The matched catalog segment.
    pub segment: &'a StreetSegment,
    /// Match score in `[0, 1]`.
    pub score: f64,
}

/// Resolves a free-text street query against the catalog snapshot.
///
/// Returns candidates sorted by score descending then name ascending,
/// deduplicated by display name (best-scoring record per distinct
/// name), truncated to `limit`. An empty catalog or a query nothing
/// clears yields an empty vector, not an error.
#[must_use]
pub fn resolve<'a>(
    segments: &'a [StreetSegment],
    query: &str,
    limit: usize,
) -> Vec<CandidateMatch<'a>> {
    let query_norm = normalize(query);

    let mut best_per_name: Vec<CandidateMatch<'a>> = Vec::new();

    for segment in segments {
        let Some(scored) = score_segment(segment, &query_norm) else {
            continue;
        };

        match best_per_name
            .iter_mut()
            .find(|c| c.segment.name == segment.name)
        {
            Some(existing) => {
                if scored.score > existing.score {
                    *existing = scored;
                }
            }
            None => best_per_name.push(scored),
        }
    }

    best_per_name.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.segment.name.cmp(&b.segment.name))
    });
    best_per_name.truncate(limit);
    best_per_name
}

/// Scores one segment against the normalized query, or `None` if it
/// clears neither the containment pattern nor the similarity floor.
fn score_segment<'a>(
    segment: &'a StreetSegment,
    query: &NormalizedName,
) -> Option<CandidateMatch<'a>> {
    let name_norm = normalize(&segment.name);

    let similarity = levenshtein::normalized_similarity(
        name_norm.text.chars(),
        query.text.chars(),
    );
    let pattern_hit = name_norm.contains_pattern(&query.tokens);

    if !pattern_hit && similarity <= SIMILARITY_FLOOR {
        return None;
    }

    let token_hits = query
        .tokens
        .iter()
        .filter(|t| !t.is_empty() && name_norm.text.contains(t.as_str()))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let token_score = TOKEN_BONUS * token_hits as f64;
    let pattern_score = if pattern_hit { PATTERN_BONUS } else { 0.0 };

    let score = similarity.max(pattern_score).max(token_score).min(1.0);

    Some(CandidateMatch { segment, score })
}
