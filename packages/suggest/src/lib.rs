#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tantivy-based hybrid suggestion index for street names.
//!
//! In-process full-text index built from the street catalog. Query time
//! combines three should-clauses — phrase with slop, edge-n-gram
//! prefix, and fuzzy — then deduplicates hits by street name, keeping
//! the best-scored record per distinct name.
//!
//! # Architecture
//!
//! - **Index time**: [`builder::build`] projects catalog segments into
//!   documents (id, name, block code, centroid) and bulk writes them in
//!   batches with idempotent delete-then-add upserts.
//! - **Query time**: [`SuggestIndex::suggest`] over-fetches raw hits,
//!   deduplicates by name, and truncates to the requested limit.
//!   Engine failures are retried a bounded number of times with a
//!   linearly increasing delay before surfacing as
//!   [`SuggestError::Unavailable`].

pub mod builder;
pub mod query;
pub mod schema;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use tantivy::collector::TopDocs;
use tantivy::schema::Value;
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument};
use unicode_normalization::UnicodeNormalization;

pub use callejero_suggest_models::{IndexBuildStats, SuggestHit, SuggestionDocument};
use schema::SuggestFields;

/// Default directory name for the suggestion index.
pub const DEFAULT_INDEX_DIR_NAME: &str = "suggest_index";

/// Maximum raw hits fetched per query before deduplication.
const MAX_OVERFETCH: usize = 200;

/// Over-fetch multiplier: raw hits per requested unique name.
const OVERFETCH_FACTOR: usize = 5;

/// Bounded retry policy for index queries.
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(150);

/// Errors from suggestion index operations.
#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    /// Tantivy error.
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index directory not found.
    #[error("Index directory not found: {0}")]
    IndexNotFound(String),

    /// Query failed after the bounded retries were exhausted.
    #[error("Suggestion index unavailable after {attempts} attempts: {source}")]
    Unavailable {
        /// Number of attempts made.
        attempts: u32,
        /// The final failure.
        #[source]
        source: Box<SuggestError>,
    },

    /// A bulk write reported per-document errors; the run was aborted
    /// before commit.
    #[error("Index build reported document errors: {failures:?}")]
    IndexIntegrity {
        /// First few failing documents (`id: error`).
        failures: Vec<String>,
    },

    /// Async task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A handle to an opened suggestion index.
///
/// The index is backed by memory-mapped files and supports concurrent
/// searches from multiple threads/tasks.
pub struct SuggestIndex {
    reader: IndexReader,
    fields: SuggestFields,
    analyzer: TextAnalyzer,
}

impl SuggestIndex {
    /// Opens an existing suggestion index from a directory.
    ///
    /// The index must have been previously built with [`builder::build`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not contain a valid
    /// index.
    pub fn open(index_dir: impl AsRef<Path>) -> Result<Self, SuggestError> {
        let index_dir = index_dir.as_ref();
        if !index_dir.join("meta.json").exists() {
            return Err(SuggestError::IndexNotFound(
                index_dir.display().to_string(),
            ));
        }

        log::info!("Opening suggestion index at {}", index_dir.display());

        let index = Index::open_in_dir(index_dir)?;
        schema::register_tokenizers(&index);

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        let fields = SuggestFields::from_schema(&index.schema());
        let analyzer = index
            .tokenizers()
            .get("default")
            .expect("default analyzer registered");

        Ok(Self {
            reader,
            fields,
            analyzer,
        })
    }

    /// Searches the index, returning up to `limit` hits with distinct
    /// street names, best score first.
    ///
    /// Raw hits are over-fetched (`limit * 5`, capped at 200) so
    /// deduplication has enough material. Zero hits is an empty `Ok`,
    /// not an error. Transient engine failures are retried up to
    /// [`RETRY_ATTEMPTS`] times with linearly increasing delay; the
    /// retry never blocks unrelated tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::Unavailable`] once retries are
    /// exhausted.
    pub async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<SuggestHit>, SuggestError> {
        let mut last_err: Option<SuggestError> = None;

        for attempt in 1..=RETRY_ATTEMPTS {
            let reader = self.reader.clone();
            let fields = self.fields.clone();
            let analyzer = self.analyzer.clone();
            let query = query.to_string();

            let outcome = tokio::task::spawn_blocking(move || {
                suggest_sync(&reader, &fields, analyzer, &query, limit)
            })
            .await?;

            match outcome {
                Ok(hits) => return Ok(hits),
                Err(e) => {
                    log::warn!("Suggestion query attempt {attempt}/{RETRY_ATTEMPTS} failed: {e}");
                    last_err = Some(e);
                    if attempt < RETRY_ATTEMPTS {
                        tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                    }
                }
            }
        }

        Err(SuggestError::Unavailable {
            attempts: RETRY_ATTEMPTS,
            source: Box::new(last_err.expect("at least one attempt failed")),
        })
    }

    /// Synchronous search (for use in non-async contexts and tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    pub fn suggest_sync(&self, query: &str, limit: usize) -> Result<Vec<SuggestHit>, SuggestError> {
        suggest_sync(
            &self.reader,
            &self.fields,
            self.analyzer.clone(),
            query,
            limit,
        )
    }

    /// Reloads the reader so documents from the latest commit become
    /// visible immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the reload fails.
    pub fn refresh(&self) -> Result<(), SuggestError> {
        self.reader.reload()?;
        Ok(())
    }

    /// Returns the total number of documents in the index.
    #[must_use]
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Internal sync search shared by the async and sync public APIs.
fn suggest_sync(
    reader: &IndexReader,
    fields: &SuggestFields,
    mut analyzer: TextAnalyzer,
    query: &str,
    limit: usize,
) -> Result<Vec<SuggestHit>, SuggestError> {
    let tokens = analyze(&mut analyzer, query);
    let folded = fold(query);

    let Some(q) = query::build_suggest_query(fields, &tokens, &folded) else {
        return Ok(Vec::new());
    };

    let overfetch = (limit * OVERFETCH_FACTOR).clamp(1, MAX_OVERFETCH);
    let searcher = reader.searcher();
    let top_docs = searcher.search(&q, &TopDocs::with_limit(overfetch))?;

    // Hits arrive sorted by score; keep the first occurrence per name.
    let mut seen: HashSet<String> = HashSet::new();
    let mut hits = Vec::with_capacity(limit);

    for (score, doc_address) in top_docs {
        let doc: TantivyDocument = searcher.doc(doc_address)?;

        let name = doc
            .get_first(fields.name)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }

        let id = doc
            .get_first(fields.id)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let code = doc
            .get_first(fields.code)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let lat = doc
            .get_first(fields.lat)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let lon = doc
            .get_first(fields.lon)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        hits.push(SuggestHit {
            document: SuggestionDocument {
                id,
                nombre_cal: name,
                numero_cal: code,
                lat,
                lon,
            },
            score,
        });

        if hits.len() >= limit {
            break;
        }
    }

    Ok(hits)
}

/// Runs the query through the index's standard analyzer.
fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    tokens
}

/// Lowercases and diacritic-folds the raw query, preserving spacing,
/// for lookups against the edge-n-gram field.
fn fold(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfkd()
        .filter(|c| !matches!(c, '\u{0300}'..='\u{036F}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use callejero_catalog::{SegmentGeometry, StreetSegment};
    use geo::Point;

    fn segment(id: &str, name: &str) -> StreetSegment {
        StreetSegment {
            id: id.to_string(),
            name: name.to_string(),
            segment_code: format!("c-{id}"),
            geometry: SegmentGeometry::Centroid(Point::new(-58.4, -34.6)),
            even_range: None,
            odd_range: None,
        }
    }

    fn build_fixture_index(dir_name: &str) -> SuggestIndex {
        let tmp = std::env::temp_dir().join(dir_name);
        let _ = std::fs::remove_dir_all(&tmp);

        let segments = vec![
            segment("1", "BELGRANO"),
            segment("2", "BELGRANO"),
            segment("3", "SAN MARTIN"),
            segment("4", "BARTOLOME MITRE"),
            segment("5", "SANTA FE"),
            segment("6", "RIVADAVIA"),
        ];
        builder::build(&tmp, &segments, 2000, 50_000_000).unwrap();
        SuggestIndex::open(&tmp).unwrap()
    }

    #[tokio::test]
    async fn exact_name_ranks_first() {
        let index = build_fixture_index("callejero_suggest_test_exact");
        let hits = index.suggest("belgrano", 10).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].document.nombre_cal, "BELGRANO");
    }

    #[tokio::test]
    async fn results_are_deduplicated_by_name() {
        let index = build_fixture_index("callejero_suggest_test_dedup");
        let hits = index.suggest("belgrano", 10).await.unwrap();
        let belgranos = hits
            .iter()
            .filter(|h| h.document.nombre_cal == "BELGRANO")
            .count();
        assert_eq!(belgranos, 1);
    }

    #[tokio::test]
    async fn prefix_typing_matches() {
        let index = build_fixture_index("callejero_suggest_test_prefix");
        let hits = index.suggest("belgr", 10).await.unwrap();
        assert_eq!(hits[0].document.nombre_cal, "BELGRANO");
    }

    #[tokio::test]
    async fn diacritics_do_not_matter() {
        let index = build_fixture_index("callejero_suggest_test_diacritics");
        let hits = index.suggest("san martín", 10).await.unwrap();
        assert_eq!(hits[0].document.nombre_cal, "SAN MARTIN");
    }

    #[tokio::test]
    async fn missing_space_typo_recovers_via_fuzzy() {
        let index = build_fixture_index("callejero_suggest_test_typo");
        let hits = index.suggest("sanmartn", 10).await.unwrap();
        assert!(
            hits.iter().any(|h| h.document.nombre_cal == "SAN MARTIN"),
            "fuzzy clause should recover run-together input"
        );

        // And a clean phrase query for the same street scores higher.
        let clean = index.suggest("san martin", 10).await.unwrap();
        let typo_score = hits
            .iter()
            .find(|h| h.document.nombre_cal == "SAN MARTIN")
            .unwrap()
            .score;
        assert!(clean[0].score > typo_score);
    }

    #[tokio::test]
    async fn zero_hits_is_empty_not_error() {
        let index = build_fixture_index("callejero_suggest_test_nohits");
        let hits = index.suggest("zzzzqqqq", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn empty_query_is_empty_not_error() {
        let index = build_fixture_index("callejero_suggest_test_emptyq");
        let hits = index.suggest("   ", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn fold_strips_case_and_accents() {
        assert_eq!(fold("San Martín"), "san martin");
        assert_eq!(fold("  BELGRANO "), "belgrano");
    }

    #[test]
    fn open_missing_index_fails_cleanly() {
        let tmp = std::env::temp_dir().join("callejero_suggest_test_missing");
        let _ = std::fs::remove_dir_all(&tmp);
        assert!(matches!(
            SuggestIndex::open(&tmp),
            Err(SuggestError::IndexNotFound(_))
        ));
    }
}
