//! Catalog snapshot loading.
//!
//! Loads the full street catalog from `DuckDB` into memory at startup.
//! The snapshot is immutable and shared read-only across request
//! handlers; a catalog refresh means restarting with a new snapshot.

use geo::LineString;
use geojson::GeoJson;

use crate::CatalogError;
use crate::segment::{Parity, ParityRange, SegmentGeometry, StreetSegment};

/// Source table queried by [`CatalogSnapshot::load`].
pub const CATALOG_TABLE: &str = "street_segments";

/// In-memory snapshot of the street catalog.
///
/// Constructed once and shared across all consumers. All query-path
/// components (name matching, geocoding) read from this snapshot.
pub struct CatalogSnapshot {
    segments: Vec<StreetSegment>,
}

impl CatalogSnapshot {
    /// Loads all street segments from the catalog `DuckDB`.
    ///
    /// Rows with unparseable or missing geometry are skipped with a
    /// warning. Parity range columns that fail validation (zero,
    /// inverted, or wrong-parity bounds) are treated as unconfigured
    /// rather than poisoning the segment.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the database query fails.
    pub fn load(conn: &duckdb::Connection) -> Result<Self, CatalogError> {
        let sql = format!(
            "SELECT id, name, segment_code, geom_geojson, \
                    even_start, even_end, odd_start, odd_end \
             FROM {CATALOG_TABLE}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut segments = Vec::new();
        let mut skipped = 0usize;

        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let name: Option<String> = row.get(1)?;
            let segment_code: Option<String> = row.get(2)?;
            let geojson_str: Option<String> = row.get(3)?;
            let even_start: Option<i64> = row.get(4)?;
            let even_end: Option<i64> = row.get(5)?;
            let odd_start: Option<i64> = row.get(6)?;
            let odd_end: Option<i64> = row.get(7)?;

            let Some(geometry) = geojson_str.as_deref().and_then(parse_geometry) else {
                log::warn!("Skipping segment {id}: no usable geometry");
                skipped += 1;
                continue;
            };

            let even_range = range_from_bounds(&id, Parity::Even, even_start, even_end);
            let odd_range = range_from_bounds(&id, Parity::Odd, odd_start, odd_end);

            segments.push(StreetSegment {
                id,
                name: name.unwrap_or_default(),
                segment_code: segment_code.unwrap_or_default(),
                geometry,
                even_range,
                odd_range,
            });
        }

        log::info!(
            "Loaded {} street segments into catalog snapshot ({skipped} skipped)",
            segments.len()
        );

        Ok(Self { segments })
    }

    /// All segments in the snapshot.
    #[must_use]
    pub fn segments(&self) -> &[StreetSegment] {
        &self.segments
    }

    /// Number of segments in the snapshot.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the snapshot holds no segments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Parses a `GeoJSON` geometry string into [`SegmentGeometry`].
///
/// Accepts `LineString`, `MultiLineString` (first part wins — catalog
/// segments are single blocks), and `Point`. Anything else is treated
/// as unusable geometry.
#[must_use]
pub fn parse_geometry(geojson_str: &str) -> Option<SegmentGeometry> {
    let geojson: GeoJson = geojson_str.parse().ok()?;
    let GeoJson::Geometry(geom) = geojson else {
        return None;
    };
    let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;

    match geo_geom {
        geo::Geometry::LineString(line) if line.0.len() >= 2 => {
            Some(SegmentGeometry::Polyline(line))
        }
        geo::Geometry::MultiLineString(multi) => {
            let line: LineString<f64> = multi.0.into_iter().find(|l| l.0.len() >= 2)?;
            Some(SegmentGeometry::Polyline(line))
        }
        geo::Geometry::Point(point) => Some(SegmentGeometry::Centroid(point)),
        _ => None,
    }
}

/// Validates a pair of nullable bound columns into an optional range.
///
/// NULL or zero bounds mean the range is not configured. Invalid bounds
/// are logged and dropped — the equivalent rows used to require offline
/// repair scripts; here they simply never participate in containment.
fn range_from_bounds(
    id: &str,
    parity: Parity,
    start: Option<i64>,
    end: Option<i64>,
) -> Option<ParityRange> {
    let start = u32::try_from(start?).ok()?;
    let end = u32::try_from(end?).ok()?;
    if start == 0 && end == 0 {
        return None;
    }
    match ParityRange::new(parity, start, end) {
        Ok(range) => Some(range),
        Err(e) => {
            log::warn!("Segment {id}: dropping invalid {parity:?} range [{start}, {end}]: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_linestring_geometry() {
        let geom = parse_geometry(
            r#"{"type":"LineString","coordinates":[[-58.4,-34.6],[-58.39,-34.61]]}"#,
        )
        .unwrap();
        assert!(matches!(geom, SegmentGeometry::Polyline(_)));
    }

    #[test]
    fn parses_point_geometry() {
        let geom = parse_geometry(r#"{"type":"Point","coordinates":[-58.4,-34.6]}"#).unwrap();
        assert!(matches!(geom, SegmentGeometry::Centroid(_)));
    }

    #[test]
    fn parses_multilinestring_first_part() {
        let geom = parse_geometry(
            r#"{"type":"MultiLineString","coordinates":[[[-58.4,-34.6],[-58.39,-34.61]],[[-58.38,-34.62],[-58.37,-34.63]]]}"#,
        )
        .unwrap();
        let SegmentGeometry::Polyline(line) = geom else {
            panic!("expected polyline");
        };
        assert!((line.0[0].x - (-58.4)).abs() < 1e-9);
    }

    #[test]
    fn rejects_polygon_geometry() {
        assert!(
            parse_geometry(
                r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#
            )
            .is_none()
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_geometry("not geojson").is_none());
        assert!(parse_geometry(r#"{"type":"FeatureCollection","features":[]}"#).is_none());
    }

    #[test]
    fn null_bounds_mean_unconfigured() {
        assert!(range_from_bounds("s1", Parity::Even, None, None).is_none());
        assert!(range_from_bounds("s1", Parity::Even, Some(0), Some(0)).is_none());
    }

    #[test]
    fn invalid_bounds_are_dropped_not_fatal() {
        // swapped-parity corruption: odd value in an even column
        assert!(range_from_bounds("s1", Parity::Even, Some(1201), Some(1400)).is_none());
        assert!(range_from_bounds("s1", Parity::Odd, Some(400), Some(200)).is_none());
    }

    #[test]
    fn valid_bounds_become_range() {
        let range = range_from_bounds("s1", Parity::Even, Some(1200), Some(1400)).unwrap();
        assert!(range.contains(1234));
    }
}
