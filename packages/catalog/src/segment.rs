//! Street segment model.
//!
//! A segment is one block-level record of the municipal street catalog:
//! a display name, an optional block code distinguishing records that
//! share a name, geometry, and the even/odd house-number ranges that
//! address interpolation runs against.

use geo::{LineString, Point};

/// House-number parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    /// Even house numbers (0, 2, 4, ...).
    Even,
    /// Odd house numbers (1, 3, 5, ...).
    Odd,
}

impl Parity {
    /// Parity of a house number.
    #[must_use]
    pub const fn of(house_number: u32) -> Self {
        if house_number % 2 == 0 {
            Self::Even
        } else {
            Self::Odd
        }
    }

    /// Whether `n` has this parity.
    #[must_use]
    pub const fn matches(self, n: u32) -> bool {
        match self {
            Self::Even => n % 2 == 0,
            Self::Odd => n % 2 == 1,
        }
    }
}

/// Errors rejected by [`ParityRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParityRangeError {
    /// A bound of 0 means "no range configured" and is not a valid range.
    #[error("range bound is 0 (unconfigured)")]
    ZeroBound,

    /// `start` must not exceed `end`.
    #[error("range start {start} exceeds end {end}")]
    Inverted {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },

    /// A bound holds a number of the wrong parity.
    #[error("bound {bound} does not have {parity:?} parity")]
    WrongParity {
        /// The offending bound value.
        bound: u32,
        /// The parity the range is keyed under.
        parity: Parity,
    },
}

/// A validated house-number range for one addressing parity.
///
/// Upstream datasets encode this as four loosely related nullable
/// integers (even start/end, odd start/end), which is a known source of
/// silent corruption: swapped or wrong-parity values pass unchecked and
/// geocode to the wrong block. This type makes that state
/// unrepresentable — construction fails unless both bounds are nonzero,
/// ordered, and of the declared parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParityRange {
    parity: Parity,
    start: u32,
    end: u32,
}

impl ParityRange {
    /// Validates and constructs a range.
    ///
    /// # Errors
    ///
    /// Returns [`ParityRangeError`] if either bound is 0, `start > end`,
    /// or either bound has the wrong parity.
    pub const fn new(parity: Parity, start: u32, end: u32) -> Result<Self, ParityRangeError> {
        if start == 0 || end == 0 {
            return Err(ParityRangeError::ZeroBound);
        }
        if start > end {
            return Err(ParityRangeError::Inverted { start, end });
        }
        if !parity.matches(start) {
            return Err(ParityRangeError::WrongParity {
                bound: start,
                parity,
            });
        }
        if !parity.matches(end) {
            return Err(ParityRangeError::WrongParity { bound: end, parity });
        }
        Ok(Self { parity, start, end })
    }

    /// The parity this range is keyed under.
    #[must_use]
    pub const fn parity(self) -> Parity {
        self.parity
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Whether `house_number` falls inside the range.
    ///
    /// The parity check is implied: a validated range can only contain
    /// numbers of its own parity, so an even number can never satisfy
    /// an odd range.
    #[must_use]
    pub const fn contains(self, house_number: u32) -> bool {
        self.parity.matches(house_number) && self.start <= house_number && house_number <= self.end
    }

    /// Fractional position of `house_number` along the range, clamped
    /// to `[0, 1]`. A degenerate range (`start == end`) maps to 0.
    #[must_use]
    pub fn fraction(self, house_number: u32) -> f64 {
        if self.start == self.end {
            return 0.0;
        }
        let n = f64::from(house_number.clamp(self.start, self.end));
        (n - f64::from(self.start)) / (f64::from(self.end) - f64::from(self.start))
    }

    /// The bound nearest to `house_number` (used by relaxed fallback
    /// geocoding when the number falls outside the range).
    #[must_use]
    pub const fn nearest_bound(self, house_number: u32) -> u32 {
        if house_number <= self.start {
            self.start
        } else if house_number >= self.end {
            self.end
        } else {
            house_number
        }
    }
}

/// Geometry attached to a catalog segment.
///
/// Most segments carry a full polyline; some older records only have a
/// representative point.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentGeometry {
    /// Full street axis polyline (WGS84 lon/lat coordinates).
    Polyline(LineString<f64>),
    /// Representative point only.
    Centroid(Point<f64>),
}

impl SegmentGeometry {
    /// Representative point of the geometry.
    ///
    /// For polylines this is the geometric centroid; degenerate
    /// polylines (fewer than two distinct points) fall back to the
    /// first coordinate.
    #[must_use]
    pub fn centroid(&self) -> Point<f64> {
        use geo::Centroid;

        match self {
            Self::Polyline(line) => line
                .centroid()
                .unwrap_or_else(|| Point::new(line.0[0].x, line.0[0].y)),
            Self::Centroid(point) => *point,
        }
    }
}

/// One street segment of the catalog snapshot.
///
/// Immutable once loaded; the snapshot is replaced wholesale on catalog
/// refresh.
#[derive(Debug, Clone)]
pub struct StreetSegment {
    /// Stable unique identifier.
    pub id: String,
    /// Display name (e.g. `"AV. SAN MARTIN"`).
    pub name: String,
    /// Block/segment code distinguishing records sharing a name.
    /// Empty when the source column is NULL.
    pub segment_code: String,
    /// Segment geometry.
    pub geometry: SegmentGeometry,
    /// Even house-number range, if configured.
    pub even_range: Option<ParityRange>,
    /// Odd house-number range, if configured.
    pub odd_range: Option<ParityRange>,
}

impl StreetSegment {
    /// The configured range matching the parity of `house_number`.
    #[must_use]
    pub const fn range_for(&self, parity: Parity) -> Option<ParityRange> {
        match parity {
            Parity::Even => self.even_range,
            Parity::Odd => self.odd_range,
        }
    }
}
