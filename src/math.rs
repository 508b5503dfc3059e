//! Pure polygon math: signed area, bounds, and the latitude correction
//!
//! Everything in this module operates on plain longitude/latitude coordinates
//! in decimal degrees (`x` = longitude, `y` = latitude) and is free of any
//! rendering concern.

use crate::store::Geometry;
use geo::{Coord, Rect};

/// One closed boundary loop, ordered, implicitly closed (the renderer closes
/// it with `Z`; the first point does not need to be repeated at the end).
pub type Ring = Vec<Coord<f64>>;

/// Degrees-to-radians factor, precomputed for the latitude correction.
const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Unsigned ring area via the shoelace formula.
///
/// Returns 0 for degenerate rings (two points or fewer). The result is in
/// squared degrees, which is only ever used for *relative* comparisons
/// between landmasses of the same feature, so no spherical correction is
/// applied here.
#[inline]
pub fn ring_area(ring: &[Coord<f64>]) -> f64 {
    if ring.len() <= 2 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum.abs() / 2.0
}

/// Min/max bounds over an iterator of coordinates.
///
/// Returns `None` when the iterator is empty.
pub fn bounds_of_points<I>(points: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut any = false;

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
        any = true;
    }

    if any {
        Some(Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        ))
    } else {
        None
    }
}

/// Correction factor for longitude spans at a given latitude.
///
/// A degree of longitude shrinks in true distance as latitude increases;
/// multiplying longitude spans by `cos(|lat|)` before fitting an aspect
/// ratio keeps outlines visually proportionate instead of stretched
/// east-west near the poles.
#[inline(always)]
pub fn lat_correction_factor(center_lat: f64) -> f64 {
    (center_lat.abs() * DEG_TO_RAD).cos()
}

/// Immutable per-landmass geometry derived from one exterior ring.
///
/// Holes are never rendered by this engine, so only the exterior ring of
/// each polygon survives extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonData {
    /// Exterior boundary ring
    pub ring: Ring,
    /// Unsigned shoelace area in squared degrees
    pub area: f64,
    /// Min/max bounds of the ring
    pub bounds: Rect<f64>,
    /// Latitude midpoint of the bounds
    pub center_lat: f64,
}

impl PolygonData {
    /// Build from an exterior ring.
    ///
    /// Returns `None` for degenerate rings (two points or fewer); those are
    /// dropped during extraction rather than carried as zero-area noise.
    pub fn from_exterior(ring: Ring) -> Option<Self> {
        if ring.len() <= 2 {
            return None;
        }
        let area = ring_area(&ring);
        let bounds = bounds_of_points(ring.iter().copied())?;
        let center_lat = (bounds.min().y + bounds.max().y) / 2.0;
        Some(Self {
            ring,
            area,
            bounds,
            center_lat,
        })
    }

    /// Center of the bounding box (longitude, latitude).
    #[inline]
    pub fn center(&self) -> Coord<f64> {
        self.bounds.center()
    }

    /// Extract every landmass of a feature geometry, sorted descending by
    /// area.
    ///
    /// A `Polygon` geometry yields at most one landmass (its exterior ring);
    /// a `MultiPolygon` yields one per member. Degenerate members are
    /// dropped.
    pub fn extract(geometry: &Geometry) -> Vec<PolygonData> {
        let mut polygons: Vec<PolygonData> = geometry
            .exterior_rings()
            .into_iter()
            .filter_map(PolygonData::from_exterior)
            .collect();

        // Descending by area; the classifier relies on the largest landmass
        // being first.
        polygons.sort_by(|a, b| b.area.total_cmp(&a.area));
        polygons
    }
}
