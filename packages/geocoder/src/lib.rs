#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address and intersection geocoding over the catalog snapshot.
//!
//! Two resolvers built on top of the name matcher:
//!
//! - [`address::geocode`] interpolates a house number to a point along
//!   the matched segment, honoring even/odd numbering parity, with an
//!   optional relaxed fallback mode.
//! - [`intersection::intersect`] resolves the meeting point of two
//!   independently matched streets.
//!
//! Both are read-only over the immutable snapshot and safe to call
//! concurrently.

pub mod address;
pub mod intersection;

use serde::{Deserialize, Serialize};

pub use address::{geocode, geocode_by_code};
pub use intersection::intersect;

/// Upper bound on accepted house numbers. Values above this are
/// rejected before any resolution work.
pub const MAX_HOUSE_NUMBER: u32 = 200_000;

/// Errors from geocoding operations.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// Parameter out of bounds, rejected before any resolution work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No candidate cleared the matching thresholds. A normal outcome,
    /// not a system fault.
    #[error("not found: {0}")]
    NotFound(String),
}

/// A geocoded address point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Point latitude (WGS84).
    pub lat: f64,
    /// Point longitude (WGS84).
    pub lon: f64,
    /// Id of the segment the point was derived from.
    pub matched_segment_id: String,
    /// Whether relaxed fallback matching produced the point.
    pub used_fallback: bool,
}

/// A resolved street intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionResult {
    /// Intersection latitude (WGS84).
    pub lat: f64,
    /// Intersection longitude (WGS84).
    pub lon: f64,
    /// Matched segment of the first street.
    pub segment_id_a: String,
    /// Matched segment of the second street.
    pub segment_id_b: String,
}
