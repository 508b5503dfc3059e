//! Projection fitting: latitude-corrected linear transform into an SVG box
//!
//! Given the combined bounds of a set of landmasses and a maximum box size,
//! this module computes the box dimensions and the linear transform that
//! maps longitude/latitude into it. Longitude spans are multiplied by the
//! latitude correction before the aspect ratio is taken, so outlines keep
//! their true proportions instead of stretching east-west away from the
//! equator. The same fitting logic, without the correction and without the
//! Y flip, serves already-projected screen-space asset coordinates.

use crate::math::lat_correction_factor;
use geo::{Coord, Rect};

/// Padding inside the main outline box.
pub const MAIN_PADDING: f64 = 8.0;
/// Padding inside each secondary outline box.
pub const SECONDARY_PADDING: f64 = 4.0;

/// Floor on the minor axis as a fraction of `max_size`. Prevents razor-thin
/// boxes for extreme aspect ratios (long island chains, Chile).
const MIN_ASPECT_FRACTION: f64 = 0.35;

/// Dimensions and transform parameters of a fitted SVG box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgDimensions {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub lat_correction: f64,
}

impl Default for SvgDimensions {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            lat_correction: 1.0,
        }
    }
}

/// A fitted transform from source coordinates into a bounded SVG box.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    dims: SvgDimensions,
    min_x: f64,
    min_y: f64,
    max_y: f64,
    /// Geographic latitude increases northward while screen Y increases
    /// downward; screen-space asset coordinates are already top-down.
    flip_y: bool,
}

impl Projection {
    /// Fit geographic bounds (degrees) into a box no larger than `max_size`.
    pub fn fit_geographic(bounds: Rect<f64>, max_size: f64, padding: f64) -> Self {
        let center_lat = (bounds.min().y + bounds.max().y) / 2.0;
        let lat_correction = lat_correction_factor(center_lat);
        Self::fit(bounds, max_size, padding, lat_correction, true)
    }

    /// Fit screen-space bounds (asset units, Y down) into a box no larger
    /// than `max_size`.
    pub fn fit_screen(bounds: Rect<f64>, max_size: f64, padding: f64) -> Self {
        Self::fit(bounds, max_size, padding, 1.0, false)
    }

    fn fit(bounds: Rect<f64>, max_size: f64, padding: f64, lat_correction: f64, flip_y: bool) -> Self {
        let geo_width = bounds.width() * lat_correction;
        let geo_height = bounds.height();

        // Zero-extent guard (single-point artifacts): a degenerate square
        // with everything collapsed to its center.
        if geo_width <= 0.0 || geo_height <= 0.0 {
            return Self {
                dims: SvgDimensions {
                    width: max_size,
                    height: max_size,
                    scale: 0.0,
                    offset_x: max_size / 2.0,
                    offset_y: max_size / 2.0,
                    lat_correction,
                },
                min_x: bounds.min().x,
                min_y: bounds.min().y,
                max_y: bounds.max().y,
                flip_y,
            };
        }

        let aspect_ratio = geo_width / geo_height;
        let (width, height) = if aspect_ratio > 1.0 {
            (
                max_size,
                (max_size / aspect_ratio).max(max_size * MIN_ASPECT_FRACTION),
            )
        } else {
            (
                (max_size * aspect_ratio).max(max_size * MIN_ASPECT_FRACTION),
                max_size,
            )
        };

        let scale = ((width - 2.0 * padding) / geo_width)
            .min((height - 2.0 * padding) / geo_height)
            .max(0.0);

        // Center the content in the padded available space
        let offset_x = (width - geo_width * scale) / 2.0;
        let offset_y = (height - geo_height * scale) / 2.0;

        Self {
            dims: SvgDimensions {
                width,
                height,
                scale,
                offset_x,
                offset_y,
                lat_correction,
            },
            min_x: bounds.min().x,
            min_y: bounds.min().y,
            max_y: bounds.max().y,
            flip_y,
        }
    }

    /// Map a source coordinate into the fitted box.
    #[inline]
    pub fn apply(&self, c: Coord<f64>) -> (f64, f64) {
        let x = (c.x - self.min_x) * self.dims.lat_correction * self.dims.scale
            + self.dims.offset_x;
        let y = if self.flip_y {
            (self.max_y - c.y) * self.dims.scale + self.dims.offset_y
        } else {
            (c.y - self.min_y) * self.dims.scale + self.dims.offset_y
        };
        (x, y)
    }

    /// The fitted box dimensions.
    #[inline]
    pub fn dimensions(&self) -> SvgDimensions {
        self.dims
    }
}
