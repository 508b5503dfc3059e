//! Outer-boundary recovery from ribbon-traced border paths
//!
//! Some small-country assets are bitmap-traced outlines stored as a single
//! closed path that walks out along one coastline, loops the tip, and walks
//! back along the other edge: a thin border *ribbon* rather than a filled
//! silhouette. Filling it directly looks wrong; the outer edge alone is the
//! desired shape.
//!
//! The path is flattened into dense polylines, arc-length parameterized,
//! and analyzed by distance from its start point. A near-start return in
//! the middle of the path signals two ribbons joined near the origin;
//! otherwise a single turnaround at maximum distance marks where the outer
//! edge ends and the inner edge begins.

use geo::Coord;
use lyon_geom::{
    Angle, ArcFlags, CubicBezierSegment, Point, QuadraticBezierSegment, SvgArc, point, vector,
};
use svgtypes::{PathParser, PathSegment};

/// Tolerance for curve flattening, in asset units.
/// Lower = more points, smoother curves, slower.
const CURVE_TOLERANCE: f64 = 0.1;

/// Tuning for ribbon analysis.
///
/// The thresholds are empirically tuned against the original traced assets
/// and have no documented derivation; revisit them if extraction quality
/// regresses on new country shapes.
#[derive(Debug, Clone)]
pub struct RibbonConfig {
    /// Number of evenly spaced arc-length samples taken over the path.
    pub samples: usize,
    /// Fraction window scanned for a near-start return.
    pub dip_window: (f64, f64),
    /// A sample closer to the start than this fraction of the maximum
    /// distance counts as a near-start return.
    pub dip_threshold: f64,
    /// First sample at or above this fraction of the maximum distance is
    /// the single-ribbon turnaround.
    pub turnaround_threshold: f64,
    /// Points emitted per traversed ribbon edge.
    pub boundary_samples: usize,
    /// Single sub-paths shorter than this (asset units) have no ribbon
    /// structure (small atolls) and are used unmodified.
    pub short_subpath_length: f64,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            samples: 400,
            dip_window: (0.15, 0.85),
            dip_threshold: 0.10,
            turnaround_threshold: 0.999,
            boundary_samples: 60,
            short_subpath_length: 100.0,
        }
    }
}

/// One flattened sub-path of an SVG path (everything between two moves).
#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    pub points: Vec<Coord<f64>>,
    pub closed: bool,
}

/// Outcome of boundary extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedBoundary {
    /// A simple closed polygon recovered from the path.
    Boundary(Vec<Coord<f64>>),
    /// Analysis could not produce a usable boundary; render these flattened
    /// sub-paths unmodified instead. Recoverable degradation, never fatal.
    Raw(Vec<Subpath>),
}

/// Recover the outer boundary of a path.
///
/// - Two or more sub-paths: the first one (everything before the second
///   move) is the outer edge; the rest is the inner edge and is discarded.
/// - A single short sub-path has no ribbon structure and is used as-is.
/// - A single long sub-path goes through ribbon analysis.
pub fn extract_outer_boundary(d: &str, config: &RibbonConfig) -> ExtractedBoundary {
    let mut subpaths = flatten_path(d);
    subpaths.retain(|s| !s.points.is_empty());

    if subpaths.len() > 1 {
        // Already-structured asset: outer edge first, inner edges after.
        return ExtractedBoundary::Boundary(subpaths.swap_remove(0).points);
    }
    match subpaths.pop() {
        Some(subpath) => extract_from_single(subpath, config),
        None => ExtractedBoundary::Raw(Vec::new()),
    }
}

fn extract_from_single(subpath: Subpath, config: &RibbonConfig) -> ExtractedBoundary {
    let Some(sampled) = SampledPath::new(&subpath.points) else {
        // Zero-length path; nothing to analyze.
        tracing::warn!("ribbon path has zero length, falling back to raw");
        return ExtractedBoundary::Raw(vec![subpath]);
    };

    if sampled.total_length() < config.short_subpath_length {
        return ExtractedBoundary::Boundary(subpath.points);
    }

    let start = sampled.point_at(0.0);
    let samples: Vec<(f64, f64)> = (0..config.samples)
        .map(|i| {
            let fraction = i as f64 / (config.samples - 1) as f64;
            (fraction, distance(sampled.point_at(fraction), start))
        })
        .collect();

    let max_distance = samples.iter().fold(0.0f64, |acc, &(_, d)| acc.max(d));
    if max_distance <= f64::EPSILON {
        tracing::warn!("ribbon sampling produced no usable peak, falling back to raw");
        return ExtractedBoundary::Raw(vec![subpath]);
    }

    if let Some(dip) = find_dip(&samples, max_distance, config) {
        ExtractedBoundary::Boundary(two_ribbon_boundary(&sampled, &samples, dip, config))
    } else {
        match single_ribbon_boundary(&sampled, &samples, max_distance, config) {
            Some(boundary) => ExtractedBoundary::Boundary(boundary),
            None => {
                tracing::warn!("no turnaround found, falling back to raw");
                ExtractedBoundary::Raw(vec![subpath])
            }
        }
    }
}

/// Scan the dip window for a contiguous span of near-start samples and
/// return the local-minimum fraction inside the first such span.
///
/// A near-start return in the middle of the path means the trace is two
/// ribbons joined near the start point; naive "first half" extraction would
/// produce a self-crossing shape there.
fn find_dip(samples: &[(f64, f64)], max_distance: f64, config: &RibbonConfig) -> Option<f64> {
    let cutoff = config.dip_threshold * max_distance;
    let (window_lo, window_hi) = config.dip_window;

    let mut best: Option<(f64, f64)> = None; // (fraction, distance) inside the span
    for &(fraction, dist) in samples {
        if fraction < window_lo || fraction > window_hi {
            continue;
        }
        if dist < cutoff {
            best = match best {
                Some((_, best_dist)) if best_dist <= dist => best,
                _ => Some((fraction, dist)),
            };
        } else if best.is_some() {
            // Span ended; the first one wins.
            break;
        }
    }
    best.map(|(fraction, _)| fraction)
}

/// Build the boundary for a path made of two ribbons joined near the start:
/// out along the first lobe's outer edge, then back along the second
/// lobe's outer edge, traversed in reverse so the polygon stays simple.
fn two_ribbon_boundary(
    sampled: &SampledPath,
    samples: &[(f64, f64)],
    dip: f64,
    config: &RibbonConfig,
) -> Vec<Coord<f64>> {
    let peak1 = argmax_in(samples, 0.0, dip);
    let peak2 = argmax_in(samples, dip, 1.0);

    let mut boundary = Vec::with_capacity(2 * config.boundary_samples);
    sample_span(sampled, 0.0, peak1, config.boundary_samples, &mut boundary);
    sample_span(sampled, peak2, dip, config.boundary_samples, &mut boundary);
    boundary
}

/// Build the boundary for a single out-and-back ribbon: everything up to
/// the first sample at (effectively) maximum distance is the outer edge.
fn single_ribbon_boundary(
    sampled: &SampledPath,
    samples: &[(f64, f64)],
    max_distance: f64,
    config: &RibbonConfig,
) -> Option<Vec<Coord<f64>>> {
    let cutoff = config.turnaround_threshold * max_distance;
    let turnaround = samples
        .iter()
        .find(|&&(_, dist)| dist >= cutoff)
        .map(|&(fraction, _)| fraction)?;

    let mut boundary = Vec::with_capacity(config.boundary_samples);
    sample_span(sampled, 0.0, turnaround, config.boundary_samples, &mut boundary);
    Some(boundary)
}

/// Append `n` evenly spaced points over the fraction span `[from, to]`.
fn sample_span(sampled: &SampledPath, from: f64, to: f64, n: usize, out: &mut Vec<Coord<f64>>) {
    for i in 0..n {
        let t = i as f64 / (n - 1) as f64;
        out.push(sampled.point_at(from + (to - from) * t));
    }
}

/// Fraction of the maximum-distance sample within `[lo, hi]`.
fn argmax_in(samples: &[(f64, f64)], lo: f64, hi: f64) -> f64 {
    let mut best_fraction = lo;
    let mut best_distance = f64::NEG_INFINITY;
    for &(fraction, dist) in samples {
        if fraction >= lo && fraction <= hi && dist > best_distance {
            best_distance = dist;
            best_fraction = fraction;
        }
    }
    best_fraction
}

#[inline]
fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// An arc-length parameterized polyline: "point at fraction of total
/// length" via binary search over cumulative segment lengths plus linear
/// interpolation between the bracketing vertices.
struct SampledPath {
    points: Vec<Coord<f64>>,
    cumulative: Vec<f64>,
    total: f64,
}

impl SampledPath {
    /// Returns `None` when the polyline has no length at all.
    fn new(points: &[Coord<f64>]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        let mut total = 0.0;
        for pair in points.windows(2) {
            total += distance(pair[0], pair[1]);
            cumulative.push(total);
        }
        if total <= f64::EPSILON {
            return None;
        }
        Some(Self {
            points: points.to_vec(),
            cumulative,
            total,
        })
    }

    fn total_length(&self) -> f64 {
        self.total
    }

    /// Point at `fraction` of total length, clamped to `[0, 1]`.
    fn point_at(&self, fraction: f64) -> Coord<f64> {
        let target = fraction.clamp(0.0, 1.0) * self.total;
        // First index whose cumulative length exceeds the target; its
        // predecessor starts the bracketing segment.
        let hi = self
            .cumulative
            .partition_point(|&len| len < target)
            .clamp(1, self.points.len() - 1);
        let lo = hi - 1;

        let segment = self.cumulative[hi] - self.cumulative[lo];
        let t = if segment > 0.0 {
            (target - self.cumulative[lo]) / segment
        } else {
            0.0
        };
        let a = self.points[lo];
        let b = self.points[hi];
        Coord {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }
}

/// Flatten an SVG `d` string into dense polyline sub-paths.
///
/// Handles absolute and relative `M/L/H/V/C/S/Q/T/A/Z`; Bezier curves and
/// arcs are flattened with [`CURVE_TOLERANCE`]. A parse error stops
/// consumption at that point and keeps what was already flattened, matching
/// how renderers treat malformed path data.
pub fn flatten_path(d: &str) -> Vec<Subpath> {
    let mut subpaths: Vec<Subpath> = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();

    let mut cursor = Coord { x: 0.0, y: 0.0 };
    let mut subpath_start = cursor;
    // Reflection anchors for smooth curve commands
    let mut last_cubic_ctrl: Option<Coord<f64>> = None;
    let mut last_quad_ctrl: Option<Coord<f64>> = None;

    let mut flush = |points: &mut Vec<Coord<f64>>, closed: bool| {
        if !points.is_empty() {
            let mut points = std::mem::take(points);
            dedup_points(&mut points);
            subpaths.push(Subpath { points, closed });
        }
    };

    for segment in PathParser::from(d) {
        let segment = match segment {
            Ok(segment) => segment,
            Err(err) => {
                tracing::warn!("malformed path data: {err}");
                break;
            }
        };

        // A draw command without a preceding move starts its sub-path at
        // the current point (which Z resets to the sub-path start).
        if current.is_empty()
            && !matches!(
                segment,
                PathSegment::MoveTo { .. } | PathSegment::ClosePath { .. }
            )
        {
            current.push(cursor);
        }

        // Smooth commands reflect the previous control point; only the
        // curve arms below carry an anchor forward.
        let (mut next_cubic, mut next_quad) = (None, None);

        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                flush(&mut current, false);
                cursor = absolute(cursor, abs, x, y);
                subpath_start = cursor;
                current.push(cursor);
            }
            PathSegment::LineTo { abs, x, y } => {
                cursor = absolute(cursor, abs, x, y);
                current.push(cursor);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                cursor.x = if abs { x } else { cursor.x + x };
                current.push(cursor);
            }
            PathSegment::VerticalLineTo { abs, y } => {
                cursor.y = if abs { y } else { cursor.y + y };
                current.push(cursor);
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let c1 = absolute(cursor, abs, x1, y1);
                let c2 = absolute(cursor, abs, x2, y2);
                let to = absolute(cursor, abs, x, y);
                flatten_curve(&mut current, cubic(cursor, c1, c2, to));
                next_cubic = Some(c2);
                cursor = to;
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = reflect(cursor, last_cubic_ctrl);
                let c2 = absolute(cursor, abs, x2, y2);
                let to = absolute(cursor, abs, x, y);
                flatten_curve(&mut current, cubic(cursor, c1, c2, to));
                next_cubic = Some(c2);
                cursor = to;
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let ctrl = absolute(cursor, abs, x1, y1);
                let to = absolute(cursor, abs, x, y);
                flatten_curve(&mut current, quadratic(cursor, ctrl, to));
                next_quad = Some(ctrl);
                cursor = to;
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let ctrl = reflect(cursor, last_quad_ctrl);
                let to = absolute(cursor, abs, x, y);
                flatten_curve(&mut current, quadratic(cursor, ctrl, to));
                next_quad = Some(ctrl);
                cursor = to;
            }
            PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let to = absolute(cursor, abs, x, y);
                let arc = SvgArc {
                    from: pt(cursor),
                    to: pt(to),
                    radii: vector(rx, ry),
                    x_rotation: Angle::degrees(x_axis_rotation),
                    flags: ArcFlags { large_arc, sweep },
                };
                if arc.is_straight_line() {
                    current.push(to);
                } else {
                    arc.for_each_cubic_bezier(&mut |curve: &CubicBezierSegment<f64>| {
                        flatten_curve(&mut current, *curve);
                    });
                }
                cursor = to;
            }
            PathSegment::ClosePath { .. } => {
                // The closing segment is part of the path; its endpoint
                // matters for arc-length sampling.
                if current.last() != Some(&subpath_start) {
                    current.push(subpath_start);
                }
                cursor = subpath_start;
                flush(&mut current, true);
            }
        }

        last_cubic_ctrl = next_cubic;
        last_quad_ctrl = next_quad;
    }

    flush(&mut current, false);
    subpaths
}

#[inline]
fn absolute(cursor: Coord<f64>, abs: bool, x: f64, y: f64) -> Coord<f64> {
    if abs {
        Coord { x, y }
    } else {
        Coord {
            x: cursor.x + x,
            y: cursor.y + y,
        }
    }
}

/// Reflect the previous control point across the cursor (SVG smooth-curve
/// semantics); falls back to the cursor itself when there is none.
#[inline]
fn reflect(cursor: Coord<f64>, prev_ctrl: Option<Coord<f64>>) -> Coord<f64> {
    match prev_ctrl {
        Some(ctrl) => Coord {
            x: 2.0 * cursor.x - ctrl.x,
            y: 2.0 * cursor.y - ctrl.y,
        },
        None => cursor,
    }
}

#[inline]
fn pt(c: Coord<f64>) -> Point<f64> {
    point(c.x, c.y)
}

fn cubic(
    from: Coord<f64>,
    c1: Coord<f64>,
    c2: Coord<f64>,
    to: Coord<f64>,
) -> CubicBezierSegment<f64> {
    CubicBezierSegment {
        from: pt(from),
        ctrl1: pt(c1),
        ctrl2: pt(c2),
        to: pt(to),
    }
}

/// Quadratics are degree-elevated so one flattener serves every curve kind.
fn quadratic(from: Coord<f64>, ctrl: Coord<f64>, to: Coord<f64>) -> CubicBezierSegment<f64> {
    QuadraticBezierSegment {
        from: pt(from),
        ctrl: pt(ctrl),
        to: pt(to),
    }
    .to_cubic()
}

fn flatten_curve(out: &mut Vec<Coord<f64>>, curve: CubicBezierSegment<f64>) {
    curve.for_each_flattened(CURVE_TOLERANCE, &mut |line| {
        out.push(Coord {
            x: line.to.x,
            y: line.to.y,
        });
    });
}

/// Remove duplicate consecutive points left behind by curve flattening.
fn dedup_points(points: &mut Vec<Coord<f64>>) {
    points.dedup_by(|a, b| (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
}
