//! Geometric primitives for grid reconstruction.
//!
//! This module provides the point/line model that the skeleton builder and
//! table rebuilder operate on. Points carry connectivity flags recording
//! which cardinal directions have a line terminating at them; those flags
//! are what the cell-closing walk consumes.

use crate::error::{Error, Result};

/// Tolerance, in device units, within which two points compare equal.
///
/// Independently drawn segment endpoints rarely land on identical floating
/// coordinates, so point equality is proximity-based rather than exact.
pub const POINT_MERGE_TOLERANCE: f64 = 2.0;

/// Minimum determinant magnitude below which two lines are parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

bitflags::bitflags! {
    /// Cardinal connectivity flags for a grid vertex.
    ///
    /// A flag is set when a line terminates at (or passes through) the
    /// point in that direction; flags are only ever set with a backing
    /// line, and merging two coincident points unions them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Joints: u8 {
        /// A line continues upward from this point.
        const UP = 0b0001;
        /// A line continues downward from this point.
        const DOWN = 0b0010;
        /// A line continues leftward from this point.
        const LEFT = 0b0100;
        /// A line continues rightward from this point.
        const RIGHT = 0b1000;
    }
}

impl Default for Joints {
    fn default() -> Self {
        Joints::empty()
    }
}

/// A grid vertex with connectivity flags.
///
/// Coordinates are rounded to whole device units at construction; equality
/// is proximity-based within [`POINT_MERGE_TOLERANCE`] on both axes and
/// ignores the connectivity flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    /// X coordinate, rounded to a whole device unit
    pub x: f64,
    /// Y coordinate, rounded to a whole device unit
    pub y: f64,
    /// Cardinal directions with a line terminating here
    pub joints: Joints,
}

impl Point {
    /// Create a new point, rounding both coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_oxide::geometry::Point;
    ///
    /// let p = Point::new(10.4, 19.6);
    /// assert_eq!(p.x, 10.0);
    /// assert_eq!(p.y, 20.0);
    /// assert!(p.joints.is_empty());
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.round(),
            y: y.round(),
            joints: Joints::empty(),
        }
    }

    /// Create a point with connectivity flags already set.
    pub fn with_joints(x: f64, y: f64, joints: Joints) -> Self {
        let mut p = Self::new(x, y);
        p.joints = joints;
        p
    }

    /// Proximity test with an explicit tolerance on both axes.
    pub fn is_near(&self, other: &Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    /// Merge another coincident point into this one, unioning the
    /// connectivity flags. Flags are never overwritten or cleared.
    pub fn merge(&mut self, other: &Point) {
        self.joints |= other.joints;
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.is_near(other, POINT_MERGE_TOLERANCE)
    }
}

/// An axis-aligned painted segment between two grid vertices.
///
/// Construction canonicalizes point order — top-to-bottom for vertical
/// lines, left-to-right for horizontal — and sets the endpoint joint flags
/// as a side effect: the first endpoint gains the flag pointing into the
/// segment ([`Joints::DOWN`] or [`Joints::RIGHT`]) and the second the
/// opposite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Canonical first endpoint (top or left)
    pub p1: Point,
    /// Canonical second endpoint (bottom or right)
    pub p2: Point,
    /// Orientation: true when the segment runs top-to-bottom
    pub vertical: bool,
}

impl Line {
    /// Build a line from two endpoints.
    ///
    /// Returns `None` when the endpoints are proximity-equal — a
    /// degenerate segment cannot bound any cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_oxide::geometry::{Joints, Line, Point};
    ///
    /// // Endpoint order is canonicalized left-to-right.
    /// let line = Line::new(Point::new(100.0, 50.0), Point::new(0.0, 50.0)).unwrap();
    /// assert!(!line.vertical);
    /// assert_eq!(line.p1.x, 0.0);
    /// assert!(line.p1.joints.contains(Joints::RIGHT));
    /// assert!(line.p2.joints.contains(Joints::LEFT));
    ///
    /// assert!(Line::new(Point::new(5.0, 5.0), Point::new(5.0, 6.0)).is_none());
    /// ```
    pub fn new(a: Point, b: Point) -> Option<Self> {
        if a == b {
            return None;
        }
        let vertical = (a.x - b.x).abs() < (a.y - b.y).abs();
        let (mut p1, mut p2) = if vertical {
            if a.y <= b.y { (a, b) } else { (b, a) }
        } else if a.x <= b.x {
            (a, b)
        } else {
            (b, a)
        };
        if vertical {
            p1.joints |= Joints::DOWN;
            p2.joints |= Joints::UP;
        } else {
            p1.joints |= Joints::RIGHT;
            p2.joints |= Joints::LEFT;
        }
        Some(Self { p1, p2, vertical })
    }

    /// Euclidean length of the segment.
    pub fn length(&self) -> f64 {
        ((self.p2.x - self.p1.x).powi(2) + (self.p2.y - self.p1.y).powi(2)).sqrt()
    }

    /// Whether this line is perpendicular to another (one vertical, one
    /// horizontal). Only perpendicular pairs can form grid vertices.
    pub fn perpendicular_to(&self, other: &Line) -> bool {
        self.vertical != other.vertical
    }
}

/// Intersect the infinite extensions of two lines.
///
/// Treating segments as infinite compensates for drawn borders that stop
/// just short of where the table grid logically continues. Parallel or
/// coincident lines have no usable crossing and yield
/// [`Error::Geometry`]; the caller skips the pair.
///
/// The operation is symmetric: `intersect_infinite(a, b)` and
/// `intersect_infinite(b, a)` land on the same point.
///
/// # Examples
///
/// ```
/// use grid_oxide::geometry::{intersect_infinite, Line, Point};
///
/// let v = Line::new(Point::new(40.0, 10.0), Point::new(40.0, 90.0)).unwrap();
/// let h = Line::new(Point::new(0.0, 55.0), Point::new(30.0, 55.0)).unwrap();
/// // The horizontal segment stops short of x=40, but its extension crosses.
/// let p = intersect_infinite(&v, &h).unwrap();
/// assert_eq!((p.x, p.y), (40.0, 55.0));
/// ```
pub fn intersect_infinite(a: &Line, b: &Line) -> Result<Point> {
    let (x1, y1, x2, y2) = (a.p1.x, a.p1.y, a.p2.x, a.p2.y);
    let (x3, y3, x4, y4) = (b.p1.x, b.p1.y, b.p2.x, b.p2.y);

    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < PARALLEL_EPSILON {
        return Err(Error::Geometry(format!(
            "parallel lines have no intersection: ({x1},{y1})-({x2},{y2}) and ({x3},{y3})-({x4},{y4})"
        )));
    }

    let det_a = x1 * y2 - y1 * x2;
    let det_b = x3 * y4 - y3 * x4;
    let px = (det_a * (x3 - x4) - (x1 - x2) * det_b) / denom;
    let py = (det_a * (y3 - y4) - (y1 - y2) * det_b) / denom;
    Ok(Point::new(px, py))
}

/// Intersect two finite segments.
///
/// The crossing must lie within both segments; `tolerance` relaxes the
/// containment check at the endpoints so borders meeting at a near-miss
/// corner still register. Crossings outside either segment yield
/// [`Error::Geometry`].
pub fn intersect_segments(a: &Line, b: &Line, tolerance: f64) -> Result<Point> {
    let p = intersect_infinite(a, b)?;
    for line in [a, b] {
        let (min_x, max_x) = (line.p1.x.min(line.p2.x), line.p1.x.max(line.p2.x));
        let (min_y, max_y) = (line.p1.y.min(line.p2.y), line.p1.y.max(line.p2.y));
        if p.x < min_x - tolerance
            || p.x > max_x + tolerance
            || p.y < min_y - tolerance
            || p.y > max_y + tolerance
        {
            return Err(Error::Geometry(format!(
                "crossing ({}, {}) lies outside segment ({}, {})-({}, {})",
                p.x, p.y, line.p1.x, line.p1.y, line.p2.x, line.p2.y
            )));
        }
    }
    Ok(p)
}

/// Connectivity flags a line contributes at a point along it.
///
/// A point strictly between the endpoints has both of the line's
/// directions open; a point at (or beyond) an endpoint only has the
/// outward direction, back into the segment.
pub fn joints_at(line: &Line, point: &Point, tolerance: f64) -> Joints {
    if line.vertical {
        if point.y <= line.p1.y + tolerance {
            Joints::DOWN
        } else if point.y >= line.p2.y - tolerance {
            Joints::UP
        } else {
            Joints::UP | Joints::DOWN
        }
    } else if point.x <= line.p1.x + tolerance {
        Joints::RIGHT
    } else if point.x >= line.p2.x - tolerance {
        Joints::LEFT
    } else {
        Joints::LEFT | Joints::RIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vline(x: f64, y1: f64, y2: f64) -> Line {
        Line::new(Point::new(x, y1), Point::new(x, y2)).unwrap()
    }

    fn hline(y: f64, x1: f64, x2: f64) -> Line {
        Line::new(Point::new(x1, y), Point::new(x2, y)).unwrap()
    }

    #[test]
    fn test_point_rounding() {
        let p = Point::new(1.5, -2.4);
        assert_eq!(p.x, 2.0);
        assert_eq!(p.y, -2.0);
    }

    #[test]
    fn test_point_proximity_equality() {
        let a = Point::new(100.0, 200.0);
        let b = Point::new(101.0, 198.0);
        let c = Point::new(103.0, 200.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_point_merge_unions_flags() {
        let mut a = Point::with_joints(10.0, 10.0, Joints::UP | Joints::LEFT);
        let b = Point::with_joints(10.0, 10.0, Joints::DOWN);
        a.merge(&b);
        assert_eq!(a.joints, Joints::UP | Joints::DOWN | Joints::LEFT);
    }

    #[test]
    fn test_line_canonical_order_vertical() {
        let line = vline(10.0, 90.0, 20.0);
        assert!(line.vertical);
        assert_eq!(line.p1.y, 20.0);
        assert_eq!(line.p2.y, 90.0);
        assert!(line.p1.joints.contains(Joints::DOWN));
        assert!(line.p2.joints.contains(Joints::UP));
    }

    #[test]
    fn test_line_rejects_degenerate() {
        assert!(Line::new(Point::new(5.0, 5.0), Point::new(6.0, 5.0)).is_none());
    }

    #[test]
    fn test_line_length() {
        let line = hline(0.0, 10.0, 110.0);
        assert_eq!(line.length(), 100.0);
    }

    #[test]
    fn test_infinite_intersection_beyond_segments() {
        let v = vline(50.0, 0.0, 40.0);
        let h = hline(80.0, 0.0, 30.0);
        // Neither segment reaches the crossing, but the extensions do.
        let p = intersect_infinite(&v, &h).unwrap();
        assert_eq!((p.x, p.y), (50.0, 80.0));
    }

    #[test]
    fn test_parallel_lines_error() {
        let a = hline(10.0, 0.0, 100.0);
        let b = hline(20.0, 0.0, 100.0);
        assert!(matches!(intersect_infinite(&a, &b), Err(Error::Geometry(_))));
    }

    #[test]
    fn test_segment_intersection_inside() {
        let v = vline(50.0, 0.0, 100.0);
        let h = hline(30.0, 0.0, 100.0);
        let p = intersect_segments(&v, &h, 2.0).unwrap();
        assert_eq!((p.x, p.y), (50.0, 30.0));
    }

    #[test]
    fn test_segment_intersection_outside_rejected() {
        let v = vline(50.0, 0.0, 100.0);
        let h = hline(30.0, 60.0, 100.0);
        assert!(intersect_segments(&v, &h, 2.0).is_err());
    }

    #[test]
    fn test_segment_intersection_endpoint_tolerance() {
        // Horizontal border stops 1.5 units short of the vertical one.
        let v = vline(50.0, 0.0, 100.0);
        let h = hline(30.0, 0.0, 48.5);
        let p = intersect_segments(&v, &h, 2.0).unwrap();
        assert_eq!((p.x, p.y), (50.0, 30.0));
    }

    #[test]
    fn test_joints_at_interior_and_endpoints() {
        let v = vline(50.0, 0.0, 100.0);
        assert_eq!(joints_at(&v, &Point::new(50.0, 0.0), 2.0), Joints::DOWN);
        assert_eq!(joints_at(&v, &Point::new(50.0, 100.0), 2.0), Joints::UP);
        assert_eq!(
            joints_at(&v, &Point::new(50.0, 40.0), 2.0),
            Joints::UP | Joints::DOWN
        );

        let h = hline(10.0, 0.0, 100.0);
        assert_eq!(joints_at(&h, &Point::new(0.0, 10.0), 2.0), Joints::RIGHT);
        assert_eq!(joints_at(&h, &Point::new(100.0, 10.0), 2.0), Joints::LEFT);
        assert_eq!(
            joints_at(&h, &Point::new(60.0, 10.0), 2.0),
            Joints::LEFT | Joints::RIGHT
        );
    }

    proptest! {
        #[test]
        fn prop_infinite_intersection_symmetric(
            x in 0i32..2000,
            y in 0i32..2000,
            v_top in 0i32..1000,
            v_len in 1i32..1000,
            h_left in 0i32..1000,
            h_len in 1i32..1000,
        ) {
            let v = vline(f64::from(x), f64::from(v_top), f64::from(v_top + v_len));
            let h = hline(f64::from(y), f64::from(h_left), f64::from(h_left + h_len));
            let ab = intersect_infinite(&v, &h).unwrap();
            let ba = intersect_infinite(&h, &v).unwrap();
            prop_assert_eq!((ab.x, ab.y), (ba.x, ba.y));
        }

        #[test]
        fn prop_nearby_points_equal_and_merge(
            x in 0i32..2000,
            y in 0i32..2000,
            dx in -2i32..=2,
            dy in -2i32..=2,
            fa in 0u8..16,
            fb in 0u8..16,
        ) {
            let a = Point::with_joints(
                f64::from(x), f64::from(y), Joints::from_bits_truncate(fa));
            let b = Point::with_joints(
                f64::from(x + dx), f64::from(y + dy), Joints::from_bits_truncate(fb));
            prop_assert_eq!(a, a); // reflexive
            prop_assert_eq!(a, b); // tolerant on both axes
            let mut merged = a;
            merged.merge(&b);
            prop_assert_eq!(merged.joints, a.joints | b.joints);
        }
    }
}
