//! Shared core of the two grid reconstruction passes.
//!
//! Both the coarse skeleton and the exact rebuild reduce to the same two
//! steps once their intersection points exist: merge near-coincident
//! points (unioning connectivity flags), then walk the point set closing
//! rectangular loops into cells.

use crate::geometry::{Joints, Point};
use crate::table::Cell;

/// A set of grid vertices with proximity-based deduplication.
///
/// Inserting a point near an existing one merges into it, accumulating
/// connectivity flags instead of overwriting them.
#[derive(Debug)]
pub(crate) struct PointSet {
    points: Vec<Point>,
    tolerance: f64,
}

impl PointSet {
    pub(crate) fn new(tolerance: f64) -> Self {
        Self {
            points: Vec::new(),
            tolerance,
        }
    }

    /// Insert a point, merging into a near-equal existing vertex if any.
    pub(crate) fn insert(&mut self, point: Point) {
        match self
            .points
            .iter_mut()
            .find(|existing| existing.is_near(&point, self.tolerance))
        {
            Some(existing) => existing.merge(&point),
            None => self.points.push(point),
        }
    }

    /// Hand back the merged points in scan order (top-to-bottom, then
    /// left-to-right) so the closing walk is deterministic.
    pub(crate) fn into_points(self) -> Vec<Point> {
        let mut points = self.points;
        points.sort_by(|a, b| {
            a.y.partial_cmp(&b.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });
        points
    }
}

/// Close rectangular loops in a merged point set into cells.
///
/// From every candidate top-left corner (a vertex with lines continuing
/// down and right), find the nearest top-right corner on the same row,
/// then drop down both sides to the matching bottom corners; if both
/// descents land on the same row the loop closes and yields a cell.
/// Spanning cells fall out naturally: where an interior border is absent,
/// the nearest qualifying corner is further away and the closed loop
/// covers several grid positions.
pub(crate) fn close_cells(points: &[Point], tolerance: f64) -> Vec<Cell> {
    let mut cells: Vec<Cell> = Vec::new();

    for p1 in points {
        if !p1.joints.contains(Joints::DOWN | Joints::RIGHT) {
            continue;
        }
        let Some(p2) = nearest(points, |q| {
            (q.y - p1.y).abs() <= tolerance
                && q.x > p1.x + tolerance
                && q.joints.contains(Joints::DOWN | Joints::LEFT)
        }, |q| q.x) else {
            continue;
        };
        let Some(p4) = nearest(points, |q| {
            (q.x - p1.x).abs() <= tolerance
                && q.y > p1.y + tolerance
                && q.joints.contains(Joints::UP | Joints::RIGHT)
        }, |q| q.y) else {
            continue;
        };
        let Some(p3) = nearest(points, |q| {
            (q.x - p2.x).abs() <= tolerance
                && q.y > p2.y + tolerance
                && q.joints.contains(Joints::UP | Joints::LEFT)
        }, |q| q.y) else {
            continue;
        };
        if (p3.y - p4.y).abs() > tolerance {
            continue; // the two descents missed each other: no bottom edge
        }

        let cell = Cell::new(*p1, *p2, *p3, *p4);
        if !cells.contains(&cell) {
            cells.push(cell);
        }
    }
    cells
}

/// The matching point minimizing `key`, if any.
fn nearest<'a>(
    points: &'a [Point],
    matches: impl Fn(&Point) -> bool,
    key: impl Fn(&Point) -> f64,
) -> Option<&'a Point> {
    points
        .iter()
        .filter(|q| matches(q))
        .min_by(|a, b| {
            key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f64, y: f64, joints: Joints) -> Point {
        Point::with_joints(x, y, joints)
    }

    /// The nine vertices of a full 2x2 grid.
    fn full_grid_points() -> Vec<Point> {
        let all = Joints::all();
        let mut points = Vec::new();
        for (yi, y) in [0.0, 50.0, 100.0].into_iter().enumerate() {
            for (xi, x) in [0.0, 60.0, 120.0].into_iter().enumerate() {
                let mut joints = all;
                if yi == 0 {
                    joints &= !Joints::UP;
                }
                if yi == 2 {
                    joints &= !Joints::DOWN;
                }
                if xi == 0 {
                    joints &= !Joints::LEFT;
                }
                if xi == 2 {
                    joints &= !Joints::RIGHT;
                }
                points.push(vertex(x, y, joints));
            }
        }
        points
    }

    #[test]
    fn test_point_set_merges_and_sorts() {
        let mut set = PointSet::new(2.0);
        set.insert(vertex(10.0, 10.0, Joints::DOWN));
        set.insert(vertex(11.0, 9.0, Joints::RIGHT)); // merges into the first
        set.insert(vertex(5.0, 5.0, Joints::UP));
        let points = set.into_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].y, 5.0); // scan order
        assert_eq!(points[1].joints, Joints::DOWN | Joints::RIGHT);
    }

    #[test]
    fn test_close_cells_full_grid() {
        let cells = close_cells(&full_grid_points(), 2.0);
        assert_eq!(cells.len(), 4);
        // Top-left cell spans the first bands.
        assert_eq!((cells[0].p1.x, cells[0].p1.y), (0.0, 0.0));
        assert_eq!((cells[0].p3.x, cells[0].p3.y), (60.0, 50.0));
    }

    #[test]
    fn test_close_cells_requires_closed_loop() {
        // Remove the bottom-right vertex: the right column cannot close.
        let mut points = full_grid_points();
        points.retain(|p| !(p.x == 120.0 && p.y == 100.0));
        let cells = close_cells(&points, 2.0);
        assert_eq!(cells.len(), 3);
    }

    #[test]
    fn test_close_cells_deduplicates() {
        let mut points = full_grid_points();
        let duplicates = points.clone();
        points.extend(duplicates);
        let cells = close_cells(&points, 2.0);
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn test_close_cells_spanning_row() {
        // A 1x2 grid whose middle vertical border is missing in the top
        // row: the top cell spans both columns.
        let points = vec![
            vertex(0.0, 0.0, Joints::DOWN | Joints::RIGHT),
            vertex(120.0, 0.0, Joints::DOWN | Joints::LEFT),
            vertex(0.0, 50.0, Joints::UP | Joints::DOWN | Joints::RIGHT),
            vertex(60.0, 50.0, Joints::DOWN | Joints::LEFT | Joints::RIGHT),
            vertex(120.0, 50.0, Joints::UP | Joints::DOWN | Joints::LEFT),
            vertex(0.0, 100.0, Joints::UP | Joints::RIGHT),
            vertex(60.0, 100.0, Joints::UP | Joints::LEFT | Joints::RIGHT),
            vertex(120.0, 100.0, Joints::UP | Joints::LEFT),
        ];
        let cells = close_cells(&points, 2.0);
        assert_eq!(cells.len(), 3);
        let spanning = &cells[0];
        assert_eq!(spanning.p2.x - spanning.p1.x, 120.0);
    }
}
