#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the Tantivy-based street suggestion index.
//!
//! This crate contains only data types. It has no heavyweight
//! dependencies (no Tantivy, no I/O).

use serde::{Deserialize, Serialize};

/// The indexed projection of one catalog segment.
///
/// One document per segment with usable geometry. Documents are keyed
/// by the segment's stable id, so rebuild runs overwrite rather than
/// duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionDocument {
    /// Stable segment id (upsert key).
    pub id: String,
    /// Street display name.
    pub nombre_cal: String,
    /// Block/segment code; empty when the catalog has none.
    pub numero_cal: String,
    /// Centroid latitude (WGS84).
    pub lat: f64,
    /// Centroid longitude (WGS84).
    pub lon: f64,
}

/// A scored suggestion hit returned by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestHit {
    /// The matched document.
    #[serde(flatten)]
    pub document: SuggestionDocument,
    /// Tantivy relevance score (higher is better).
    pub score: f32,
}

/// Statistics from one index build run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexBuildStats {
    /// Documents written to the index.
    pub documents_written: u64,
    /// Number of bulk flushes (commits) issued.
    pub batches_flushed: u64,
    /// Catalog rows skipped because their centroid falls outside WGS84
    /// bounds (never reprojected upstream).
    pub skipped_rows: u64,
    /// Wall-clock build time in seconds.
    pub build_time_secs: f64,
}
