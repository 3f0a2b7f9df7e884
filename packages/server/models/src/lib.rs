#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the callejero server.
//!
//! These types define the JSON contract of the REST API. Field names
//! follow the established wire format consumed by downstream clients
//! (`nombre_cal`, `numero_cal`, etc.), so they are kept separate from
//! the internal domain types.

use callejero_geocoder::{GeocodeResult, IntersectionResult};
use callejero_suggest_models::SuggestHit;
use serde::{Deserialize, Serialize};

/// Query parameters for the suggestion endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestQueryParams {
    /// Search text.
    pub qstr: Option<String>,
    /// Maximum number of unique suggestions (1-50).
    pub limit: Option<usize>,
}

/// A single street suggestion in the legacy response shape, produced
/// by the name matcher over the catalog snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSuggestion {
    /// Street code.
    pub numero_cal: String,
    /// Street display name.
    pub nombre_cal: String,
    /// Match score in `[0, 1]`.
    pub score: f64,
}

/// A segment centroid as carried inside suggestion items.
#[derive(Debug, Clone, Serialize)]
pub struct ApiCentroid {
    /// Centroid latitude (WGS84).
    pub lat: f64,
    /// Centroid longitude (WGS84).
    pub lon: f64,
}

/// A single suggestion in the search-index response shape, keeping the
/// hit id and score alongside the document fields. The centroid is a
/// nested object, matching what downstream clients already consume.
#[derive(Debug, Clone, Serialize)]
pub struct ApiIndexedSuggestion {
    /// Hit identifier (the segment id).
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score.
    pub score: f32,
    /// Street display name.
    pub nombre_cal: String,
    /// Street code.
    pub numero_cal: String,
    /// Segment centroid.
    pub centroid: ApiCentroid,
}

impl From<SuggestHit> for ApiIndexedSuggestion {
    fn from(hit: SuggestHit) -> Self {
        Self {
            id: hit.document.id,
            score: hit.score,
            nombre_cal: hit.document.nombre_cal,
            numero_cal: hit.document.numero_cal,
            centroid: ApiCentroid {
                lat: hit.document.lat,
                lon: hit.document.lon,
            },
        }
    }
}

/// List wrapper shared by both suggestion endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSuggestionList<T> {
    /// Suggestions, best first.
    pub items: Vec<T>,
    /// Number of items returned.
    pub count: usize,
}

impl<T> From<Vec<T>> for ApiSuggestionList<T> {
    fn from(items: Vec<T>) -> Self {
        let count = items.len();
        Self { items, count }
    }
}

/// Query parameters for the address geocoding endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeQueryParams {
    /// Street name query.
    pub calle: Option<String>,
    /// House number (0-200000).
    pub altura: u32,
    /// Optional exact street code restriction.
    pub numero_cal: Option<String>,
    /// Whether relaxed fallback matching is allowed.
    pub fallback: Option<bool>,
}

/// A geocoded address point as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ApiGeocodePoint {
    /// Point latitude (WGS84).
    pub lat: f64,
    /// Point longitude (WGS84).
    pub lon: f64,
    /// Id of the segment the point was derived from.
    pub segment_id: String,
    /// Whether relaxed fallback matching produced the point.
    pub used_fallback: bool,
}

impl From<GeocodeResult> for ApiGeocodePoint {
    fn from(result: GeocodeResult) -> Self {
        Self {
            lat: result.lat,
            lon: result.lon,
            segment_id: result.matched_segment_id,
            used_fallback: result.used_fallback,
        }
    }
}

/// Query parameters for the intersection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IntersectionQueryParams {
    /// First street name query (1-100 chars).
    pub calle1: String,
    /// Second street name query (1-100 chars).
    pub calle2: String,
}

/// A resolved street intersection as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ApiIntersectionPoint {
    /// Intersection latitude (WGS84).
    pub lat: f64,
    /// Intersection longitude (WGS84).
    pub lon: f64,
    /// Matched segment of the first street.
    pub segment_id_1: String,
    /// Matched segment of the second street.
    pub segment_id_2: String,
}

impl From<IntersectionResult> for ApiIntersectionPoint {
    fn from(result: IntersectionResult) -> Self {
        Self {
            lat: result.lat,
            lon: result.lon,
            segment_id_1: result.segment_id_a,
            segment_id_2: result.segment_id_b,
        }
    }
}

/// Overall service status in the health response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Catalog and suggestion index both answer.
    Ok,
    /// One of the two backends is unavailable.
    Degraded,
    /// Neither backend answers.
    Down,
}

impl HealthStatus {
    /// Combines the two backend probes into an overall status.
    #[must_use]
    pub const fn from_probes(db: bool, es: bool) -> Self {
        match (db, es) {
            (true, true) => Self::Ok,
            (false, false) => Self::Down,
            _ => Self::Degraded,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiHealth {
    /// Overall service status.
    pub status: HealthStatus,
    /// Whether the street catalog answers.
    pub db: bool,
    /// Whether the suggestion index answers.
    pub es: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_combines_probes() {
        assert_eq!(HealthStatus::from_probes(true, true), HealthStatus::Ok);
        assert_eq!(
            HealthStatus::from_probes(true, false),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::from_probes(false, true),
            HealthStatus::Degraded
        );
        assert_eq!(HealthStatus::from_probes(false, false), HealthStatus::Down);
    }

    #[test]
    fn indexed_suggestion_nests_the_centroid() {
        let item = ApiIndexedSuggestion::from(SuggestHit {
            document: callejero_suggest_models::SuggestionDocument {
                id: "s1".to_string(),
                nombre_cal: "BELGRANO".to_string(),
                numero_cal: "101".to_string(),
                lat: -34.6,
                lon: -58.4,
            },
            score: 2.5,
        });

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["_id"], "s1");
        assert!((json["centroid"]["lat"].as_f64().unwrap() - (-34.6)).abs() < 1e-9);
        assert!((json["centroid"]["lon"].as_f64().unwrap() - (-58.4)).abs() < 1e-9);
        assert!(json.get("lat").is_none());
        assert!(json.get("lon").is_none());
    }

    #[test]
    fn suggestion_list_counts_items() {
        let list = ApiSuggestionList::from(vec![ApiSuggestion {
            numero_cal: "101".to_string(),
            nombre_cal: "BELGRANO".to_string(),
            score: 0.7,
        }]);
        assert_eq!(list.count, 1);
    }
}
