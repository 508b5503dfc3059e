//! SVG path emission
//!
//! One `M .. L .. Z` group per ring, concatenated into a single `d` string.
//! Coordinates are rounded to one decimal place: enough precision for
//! card-sized outlines while keeping the string small.

use crate::fit::Projection;
use crate::math::Ring;
use std::fmt::Write;

/// Build one SVG path string from rings under a shared transform.
///
/// Each ring contributes exactly one `M`, one `L` per remaining point, and
/// one `Z`. Empty rings contribute nothing.
pub fn build_path<'a, I>(rings: I, projection: &Projection) -> String
where
    I: IntoIterator<Item = &'a Ring>,
{
    let mut d = String::new();
    for ring in rings {
        let mut points = ring.iter();
        let Some(first) = points.next() else {
            continue;
        };

        let (x, y) = projection.apply(*first);
        let _ = write!(d, "M{},{}", fmt_coord(x), fmt_coord(y));
        for point in points {
            let (x, y) = projection.apply(*point);
            let _ = write!(d, "L{},{}", fmt_coord(x), fmt_coord(y));
        }
        d.push('Z');
    }
    d
}

/// Round to one decimal place, dropping a trailing `.0`.
fn fmt_coord(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, Rect};

    fn identity() -> Projection {
        // A 0..100 screen-space box with zero padding is the identity
        // transform for points already in 0..100.
        Projection::fit_screen(
            Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 100.0 }),
            100.0,
            0.0,
        )
    }

    #[test]
    fn test_single_ring_commands() {
        let ring: Ring = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 50.0, y: 0.0 },
            Coord { x: 50.0, y: 25.0 },
        ];
        let d = build_path([&ring], &identity());
        assert_eq!(d, "M0,0L50,0L50,25Z");
    }

    #[test]
    fn test_one_z_per_ring_and_point_counts() {
        let a: Ring = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
            Coord { x: 0.0, y: 10.0 },
        ];
        let b: Ring = vec![
            Coord { x: 20.0, y: 20.0 },
            Coord { x: 30.0, y: 20.0 },
            Coord { x: 25.0, y: 30.0 },
        ];
        let d = build_path([&a, &b], &identity());
        assert_eq!(d.matches('Z').count(), 2);
        assert_eq!(d.matches('M').count(), 2);
        // Each point emitted exactly once
        assert_eq!(d.matches('L').count(), (a.len() - 1) + (b.len() - 1));
    }

    #[test]
    fn test_empty_ring_is_skipped() {
        let empty: Ring = Vec::new();
        let d = build_path([&empty], &identity());
        assert!(d.is_empty());
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        let ring: Ring = vec![
            Coord {
                x: 10.04,
                y: 20.06,
            },
            Coord {
                x: 33.333,
                y: 66.666,
            },
            Coord { x: 1.0, y: 2.0 },
        ];
        let d = build_path([&ring], &identity());
        assert_eq!(d, "M10,20.1L33.3,66.7L1,2Z");
    }

    #[test]
    fn test_negative_zero_normalizes() {
        assert_eq!(fmt_coord(-0.01), "0");
        assert_eq!(fmt_coord(-0.06), "-0.1");
    }
}
