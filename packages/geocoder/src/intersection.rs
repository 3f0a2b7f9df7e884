//! Street intersection resolution.
//!
//! Both street queries go through the name matcher independently; the
//! meeting point is then searched over the cartesian product of their
//! candidate segments. Exact polyline crossings win; when the street
//! grid leaves a small gap at a corner, endpoints within a fixed
//! tolerance still count as touching.

use callejero_catalog::{SegmentGeometry, StreetSegment};
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Line, LineString, Point};

use crate::{GeocodeError, IntersectionResult};

/// How many distinct street names the matcher is asked for, per side.
const CANDIDATE_NAMES: usize = 5;

/// Near-touch tolerance in degrees, roughly 11 m at the equator.
/// Municipal segment endpoints routinely stop just short of the
/// crossing street's axis.
const TOUCH_TOLERANCE_DEG: f64 = 1e-4;

/// Resolves the intersection point of two streets.
///
/// Among all candidate pairs, exact geometric crossings are preferred
/// over near-touches. Ties are broken deterministically: the crossing
/// nearest to the centroid of the first street's best-ranked segment
/// wins, then the lexicographically smaller `(lon, lat)`.
///
/// # Errors
///
/// Returns [`GeocodeError::NotFound`] when either street has no match
/// or no candidate pair crosses or touches within tolerance.
pub fn intersect(
    segments: &[StreetSegment],
    street_a: &str,
    street_b: &str,
) -> Result<IntersectionResult, GeocodeError> {
    let candidates_a = candidate_segments(segments, street_a);
    if candidates_a.is_empty() {
        return Err(GeocodeError::NotFound(format!(
            "no street matches {street_a:?}"
        )));
    }
    let candidates_b = candidate_segments(segments, street_b);
    if candidates_b.is_empty() {
        return Err(GeocodeError::NotFound(format!(
            "no street matches {street_b:?}"
        )));
    }

    let anchor = candidates_a[0].geometry.centroid();

    let mut best: Option<Crossing> = None;
    for a in &candidates_a {
        for b in &candidates_b {
            if a.id == b.id || a.name == b.name {
                continue;
            }
            for (point, exact) in crossings(&a.geometry, &b.geometry) {
                let candidate = Crossing {
                    point,
                    exact,
                    anchor_distance: distance(point, anchor),
                    segment_a: a,
                    segment_b: b,
                };
                if best.as_ref().is_none_or(|current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }
    }

    best.map_or_else(
        || {
            Err(GeocodeError::NotFound(format!(
                "{street_a:?} and {street_b:?} do not intersect"
            )))
        },
        |crossing| {
            Ok(IntersectionResult {
                lat: crossing.point.y(),
                lon: crossing.point.x(),
                segment_id_a: crossing.segment_a.id.clone(),
                segment_id_b: crossing.segment_b.id.clone(),
            })
        },
    )
}

struct Crossing<'a> {
    point: Point<f64>,
    exact: bool,
    anchor_distance: f64,
    segment_a: &'a StreetSegment,
    segment_b: &'a StreetSegment,
}

impl Crossing<'_> {
    /// Exact crossings beat near-touches; then nearest to the anchor;
    /// then the smaller `(lon, lat)`.
    fn beats(&self, other: &Self) -> bool {
        if self.exact != other.exact {
            return self.exact;
        }
        (
            self.anchor_distance,
            self.point.x(),
            self.point.y(),
        )
            .partial_cmp(&(other.anchor_distance, other.point.x(), other.point.y()))
            .is_some_and(std::cmp::Ordering::is_lt)
    }
}

/// Candidate segments for one street query, in matcher rank order,
/// expanded from matched names to every block carrying the name.
fn candidate_segments<'a>(segments: &'a [StreetSegment], query: &str) -> Vec<&'a StreetSegment> {
    let matches = callejero_matcher::resolve(segments, query, CANDIDATE_NAMES);

    let mut candidates: Vec<&StreetSegment> = Vec::new();
    for candidate in &matches {
        for segment in segments.iter().filter(|s| s.name == candidate.segment.name) {
            if !candidates.iter().any(|c| c.id == segment.id) {
                candidates.push(segment);
            }
        }
    }
    candidates
}

/// All crossing points between two segment geometries, each flagged as
/// exact (geometric intersection) or a near-touch within tolerance.
fn crossings(a: &SegmentGeometry, b: &SegmentGeometry) -> Vec<(Point<f64>, bool)> {
    let mut points: Vec<(Point<f64>, bool)> = Vec::new();

    if let (SegmentGeometry::Polyline(line_a), SegmentGeometry::Polyline(line_b)) = (a, b) {
        for la in line_a.lines() {
            for lb in line_b.lines() {
                match line_intersection(la, lb) {
                    Some(LineIntersection::SinglePoint { intersection, .. }) => {
                        points.push((Point::from(intersection), true));
                    }
                    Some(LineIntersection::Collinear { intersection }) => {
                        points.push((Point::from(intersection.start), true));
                    }
                    None => {}
                }
            }
        }
        if points.is_empty() {
            points.extend(near_touches(line_a, line_b));
        }
        return points;
    }

    // At least one side is centroid-only: accept the centroid when it
    // sits within tolerance of the other geometry.
    let (point, other) = match (a, b) {
        (SegmentGeometry::Centroid(p), other) | (other, SegmentGeometry::Centroid(p)) => {
            (*p, other)
        }
        _ => unreachable!("polyline pair handled above"),
    };
    if distance_to_geometry(point, other) <= TOUCH_TOLERANCE_DEG {
        points.push((point, false));
    }
    points
}

/// Vertex-against-edge near-touches between two polylines. Endpoint
/// gaps at corners are the common case in segment-per-block data.
fn near_touches(line_a: &LineString<f64>, line_b: &LineString<f64>) -> Vec<(Point<f64>, bool)> {
    let mut points = Vec::new();
    for vertex in line_a.points() {
        if distance_to_polyline(vertex, line_b) <= TOUCH_TOLERANCE_DEG {
            points.push((vertex, false));
        }
    }
    for vertex in line_b.points() {
        if distance_to_polyline(vertex, line_a) <= TOUCH_TOLERANCE_DEG {
            points.push((vertex, false));
        }
    }
    points
}

fn distance_to_geometry(point: Point<f64>, geometry: &SegmentGeometry) -> f64 {
    match geometry {
        SegmentGeometry::Polyline(line) => distance_to_polyline(point, line),
        SegmentGeometry::Centroid(other) => distance(point, *other),
    }
}

fn distance_to_polyline(point: Point<f64>, line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|edge| distance_to_edge(point, edge))
        .fold(f64::INFINITY, f64::min)
}

/// Planar distance from a point to a line segment, projecting onto the
/// segment and clamping to its endpoints.
fn distance_to_edge(point: Point<f64>, edge: Line<f64>) -> f64 {
    let (dx, dy) = (edge.end.x - edge.start.x, edge.end.y - edge.start.y);
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq == 0.0 {
        return distance(point, Point::from(edge.start));
    }
    let t = ((point.x() - edge.start.x).mul_add(dx, (point.y() - edge.start.y) * dy) / length_sq)
        .clamp(0.0, 1.0);
    let projected = Point::new(t.mul_add(dx, edge.start.x), t.mul_add(dy, edge.start.y));
    distance(point, projected)
}

fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polyline(id: &str, name: &str, coords: &[(f64, f64)]) -> StreetSegment {
        StreetSegment {
            id: id.to_string(),
            name: name.to_string(),
            segment_code: format!("c-{id}"),
            geometry: SegmentGeometry::Polyline(LineString::from(coords.to_vec())),
            even_range: None,
            odd_range: None,
        }
    }

    fn grid() -> Vec<StreetSegment> {
        vec![
            // east-west street
            polyline("ew1", "BELGRANO", &[(-1.0, 0.0), (1.0, 0.0)]),
            // north-south street crossing it at the origin
            polyline("ns1", "MITRE", &[(0.0, -1.0), (0.0, 1.0)]),
            // a parallel street that never crosses BELGRANO
            polyline("p1", "RIVADAVIA", &[(-1.0, 0.5), (1.0, 0.5)]),
        ]
    }

    #[test]
    fn crossing_streets_resolve_to_the_crossing_point() {
        let segments = grid();
        let result = intersect(&segments, "belgrano", "mitre").unwrap();
        assert!((result.lat - 0.0).abs() < 1e-9);
        assert!((result.lon - 0.0).abs() < 1e-9);
        assert_eq!(result.segment_id_a, "ew1");
        assert_eq!(result.segment_id_b, "ns1");
    }

    #[test]
    fn argument_order_swaps_segment_ids() {
        let segments = grid();
        let result = intersect(&segments, "mitre", "belgrano").unwrap();
        assert_eq!(result.segment_id_a, "ns1");
        assert_eq!(result.segment_id_b, "ew1");
    }

    #[test]
    fn parallel_streets_are_not_found() {
        let segments = grid();
        let err = intersect(&segments, "belgrano", "rivadavia").unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[test]
    fn unknown_street_is_not_found() {
        let segments = grid();
        let err = intersect(&segments, "belgrano", "zzzzqqqq").unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[test]
    fn a_street_never_intersects_itself() {
        let segments = vec![
            polyline("s1", "BELGRANO", &[(-1.0, 0.0), (1.0, 0.0)]),
            polyline("s2", "BELGRANO", &[(1.0, 0.0), (3.0, 0.0)]),
        ];
        let err = intersect(&segments, "belgrano", "belgrano").unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[test]
    fn endpoint_gap_within_tolerance_still_touches() {
        // MITRE stops 5e-5 degrees short of BELGRANO's axis.
        let segments = vec![
            polyline("ew1", "BELGRANO", &[(-1.0, 0.0), (1.0, 0.0)]),
            polyline("ns1", "MITRE", &[(0.0, -1.0), (0.0, -5e-5)]),
        ];
        let result = intersect(&segments, "belgrano", "mitre").unwrap();
        assert!((result.lon - 0.0).abs() < 1e-9);
        assert!(result.lat.abs() <= TOUCH_TOLERANCE_DEG);
    }

    #[test]
    fn gap_beyond_tolerance_is_not_found() {
        let segments = vec![
            polyline("ew1", "BELGRANO", &[(-1.0, 0.0), (1.0, 0.0)]),
            polyline("ns1", "MITRE", &[(0.0, -1.0), (0.0, -0.01)]),
        ];
        let err = intersect(&segments, "belgrano", "mitre").unwrap_err();
        assert!(matches!(err, GeocodeError::NotFound(_)));
    }

    #[test]
    fn exact_crossing_beats_a_nearer_touch() {
        let segments = vec![
            polyline("ew1", "BELGRANO", &[(-1.0, 0.0), (1.0, 0.0)]),
            // one block touches at the west end, another truly crosses
            polyline("ns1", "MITRE", &[(-1.0, -1.0), (-1.0, -5e-5)]),
            polyline("ns2", "MITRE", &[(0.5, -1.0), (0.5, 1.0)]),
        ];
        let result = intersect(&segments, "belgrano", "mitre").unwrap();
        assert_eq!(result.segment_id_b, "ns2");
        assert!((result.lon - 0.5).abs() < 1e-9);
    }

    #[test]
    fn centroid_only_segment_touches_when_on_the_line() {
        let segments = vec![
            polyline("ew1", "BELGRANO", &[(-1.0, 0.0), (1.0, 0.0)]),
            StreetSegment {
                id: "c1".to_string(),
                name: "MITRE".to_string(),
                segment_code: "c".to_string(),
                geometry: SegmentGeometry::Centroid(Point::new(0.25, 0.0)),
                even_range: None,
                odd_range: None,
            },
        ];
        let result = intersect(&segments, "belgrano", "mitre").unwrap();
        assert!((result.lon - 0.25).abs() < 1e-9);
    }
}
