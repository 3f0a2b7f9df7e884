//! House-number address geocoding.
//!
//! Interpolates a house number to a point along the matched street
//! segment. Each segment carries separate even and odd numbering
//! ranges; only the range matching the house number's parity is ever
//! consulted, so an even number can never land on an odd-only block.

use callejero_catalog::{Parity, ParityRange, SegmentGeometry, StreetSegment};
use geo::LineInterpolatePoint;
use geo::Point;

use crate::{GeocodeError, GeocodeResult, MAX_HOUSE_NUMBER};

/// How many distinct street names the matcher is asked for.
const CANDIDATE_NAMES: usize = 10;

/// Geocodes a house number on a street.
///
/// Candidate segments are taken in matcher rank order. A segment is
/// admissible when its range for the house number's parity is present
/// and contains the number; the result point is interpolated along the
/// segment geometry at the number's fractional position inside the
/// range (a centroid-only segment yields its centroid).
///
/// When nothing is admissible and `allow_fallback` is set, constraints
/// relax in order: first the `segment_code` restriction is dropped,
/// then range containment itself — the best-ranked candidate answers
/// with its nearest range endpoint or centroid, flagged with
/// `used_fallback`.
///
/// # Errors
///
/// - [`GeocodeError::InvalidInput`] if `house_number` exceeds
///   [`MAX_HOUSE_NUMBER`].
/// - [`GeocodeError::NotFound`] if no admissible segment exists and
///   fallback is disabled (or finds nothing either).
pub fn geocode(
    segments: &[StreetSegment],
    street_query: &str,
    house_number: u32,
    segment_code: Option<&str>,
    allow_fallback: bool,
) -> Result<GeocodeResult, GeocodeError> {
    if house_number > MAX_HOUSE_NUMBER {
        return Err(GeocodeError::InvalidInput(format!(
            "house number {house_number} exceeds {MAX_HOUSE_NUMBER}"
        )));
    }

    let parity = Parity::of(house_number);

    let restricted = candidate_segments(segments, street_query, segment_code);
    if let Some(result) = first_containing(&restricted, parity, house_number) {
        return Ok(result);
    }

    if !allow_fallback {
        return Err(GeocodeError::NotFound(format!(
            "no segment matching {street_query:?} contains house number {house_number}"
        )));
    }

    // Relaxation 1: drop the segment-code restriction.
    let unrestricted;
    let candidates = if segment_code.is_some() {
        unrestricted = candidate_segments(segments, street_query, None);
        if let Some(result) = first_containing(&unrestricted, parity, house_number) {
            return Ok(GeocodeResult {
                used_fallback: true,
                ..result
            });
        }
        &unrestricted
    } else {
        &restricted
    };

    // Relaxation 2: ignore containment; answer from the best-ranked
    // candidate's nearest range endpoint or centroid.
    let Some(best) = candidates.first() else {
        return Err(GeocodeError::NotFound(format!(
            "no street matches {street_query:?}"
        )));
    };

    log::debug!(
        "Fallback geocode of {street_query:?} {house_number} onto segment {}",
        best.id
    );

    Ok(fallback_result(best, parity, house_number))
}

/// Geocodes a house number on a segment identified by its exact code,
/// with no street name query. Candidates sharing the code are taken in
/// catalog order; the containment and fallback rules are the same as
/// for [`geocode`].
///
/// # Errors
///
/// - [`GeocodeError::InvalidInput`] if `house_number` exceeds
///   [`MAX_HOUSE_NUMBER`].
/// - [`GeocodeError::NotFound`] if no segment carries the code, or no
///   carrying segment contains the number and fallback is disabled.
pub fn geocode_by_code(
    segments: &[StreetSegment],
    segment_code: &str,
    house_number: u32,
    allow_fallback: bool,
) -> Result<GeocodeResult, GeocodeError> {
    if house_number > MAX_HOUSE_NUMBER {
        return Err(GeocodeError::InvalidInput(format!(
            "house number {house_number} exceeds {MAX_HOUSE_NUMBER}"
        )));
    }

    let parity = Parity::of(house_number);

    let candidates: Vec<&StreetSegment> = segments
        .iter()
        .filter(|s| s.segment_code == segment_code)
        .collect();
    if candidates.is_empty() {
        return Err(GeocodeError::NotFound(format!(
            "no segment has code {segment_code:?}"
        )));
    }

    if let Some(result) = first_containing(&candidates, parity, house_number) {
        return Ok(result);
    }

    if !allow_fallback {
        return Err(GeocodeError::NotFound(format!(
            "no segment with code {segment_code:?} contains house number {house_number}"
        )));
    }

    Ok(fallback_result(candidates[0], parity, house_number))
}

/// Relaxed answer from one segment: nearest range endpoint when a
/// range of the right parity exists, otherwise the centroid.
fn fallback_result(segment: &StreetSegment, parity: Parity, house_number: u32) -> GeocodeResult {
    let point = segment.range_for(parity).map_or_else(
        || segment.geometry.centroid(),
        |range| interpolate(segment, range, range.nearest_bound(house_number)),
    );

    GeocodeResult {
        lat: point.y(),
        lon: point.x(),
        matched_segment_id: segment.id.clone(),
        used_fallback: true,
    }
}

/// Resolves the query to candidate segments in rank order.
///
/// The matcher deduplicates by display name; each matched name is
/// expanded back to all catalog segments carrying it (blocks of the
/// same street), preserving rank order and applying the optional
/// exact segment-code restriction.
fn candidate_segments<'a>(
    segments: &'a [StreetSegment],
    street_query: &str,
    segment_code: Option<&str>,
) -> Vec<&'a StreetSegment> {
    let matches = callejero_matcher::resolve(segments, street_query, CANDIDATE_NAMES);

    let mut candidates: Vec<&StreetSegment> = Vec::new();
    for candidate in &matches {
        for segment in segments.iter().filter(|s| s.name == candidate.segment.name) {
            if segment_code.is_some_and(|code| segment.segment_code != code) {
                continue;
            }
            if !candidates.iter().any(|c| c.id == segment.id) {
                candidates.push(segment);
            }
        }
    }
    candidates
}

/// First candidate whose parity range contains the house number,
/// interpolated to a point.
fn first_containing(
    candidates: &[&StreetSegment],
    parity: Parity,
    house_number: u32,
) -> Option<GeocodeResult> {
    for segment in candidates {
        let Some(range) = segment.range_for(parity) else {
            continue;
        };
        if !range.contains(house_number) {
            continue;
        }

        let point = interpolate(segment, range, house_number);
        return Some(GeocodeResult {
            lat: point.y(),
            lon: point.x(),
            matched_segment_id: segment.id.clone(),
            used_fallback: false,
        });
    }
    None
}

/// Interpolates the house number's position along the segment
/// geometry. Centroid-only segments answer with the centroid.
fn interpolate(segment: &StreetSegment, range: ParityRange, house_number: u32) -> Point<f64> {
    match &segment.geometry {
        SegmentGeometry::Polyline(line) => line
            .line_interpolate_point(range.fraction(house_number))
            .unwrap_or_else(|| segment.geometry.centroid()),
        SegmentGeometry::Centroid(point) => *point,
    }
}
