//! Coarse grid skeleton from infinite line intersections.
//!
//! The skeleton treats every painted segment as infinitely long, so
//! borders that stop just short of where the table logically continues
//! still produce grid vertices. The resulting cells are approximate —
//! intersections can appear where no ink ever crossed — which is why this
//! pass is only advisory: it estimates the table's shape and is discarded
//! after use. The authoritative grid is re-derived from scratch by the
//! rebuild pass.

use crate::config::ExtractionOptions;
use crate::geometry::{intersect_infinite, joints_at, Line, Point};
use crate::table::grid::{close_cells, PointSet};
use crate::table::Cell;

/// The advisory grid estimate for one page.
#[derive(Debug)]
pub struct Skeleton {
    /// Merged intersection vertices
    pub points: Vec<Point>,
    /// Approximate cells closed from the vertices
    pub cells: Vec<Cell>,
}

impl Skeleton {
    /// Estimated row count: distinct top-edge coordinates of the cells.
    pub fn rows(&self, tolerance: f64) -> usize {
        count_distinct(self.cells.iter().map(|c| c.p1.y).collect(), tolerance)
    }

    /// Estimated column count: distinct left-edge coordinates of the cells.
    pub fn cols(&self, tolerance: f64) -> usize {
        count_distinct(self.cells.iter().map(|c| c.p1.x).collect(), tolerance)
    }
}

/// Build the skeleton from a page's line set.
pub fn build(lines: &[Line], options: &ExtractionOptions) -> Skeleton {
    let mut set = PointSet::new(options.point_tolerance);

    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            if !a.perpendicular_to(b) {
                continue;
            }
            match intersect_infinite(a, b) {
                Ok(mut point) => {
                    point.joints |= joints_at(a, &point, options.point_tolerance)
                        | joints_at(b, &point, options.point_tolerance);
                    set.insert(point);
                },
                Err(err) => log::trace!("skipping line pair: {err}"),
            }
        }
    }

    let points = set.into_points();
    let cells = close_cells(&points, options.point_tolerance);
    log::debug!(
        "skeleton: {} vertices, {} approximate cells",
        points.len(),
        cells.len()
    );
    Skeleton { points, cells }
}

fn count_distinct(mut values: Vec<f64>, tolerance: f64) -> usize {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut count = 0;
    let mut last = f64::NEG_INFINITY;
    for value in values {
        if value - last > tolerance {
            count += 1;
            last = value;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
        Line::new(Point::new(x1, y1), Point::new(x2, y2)).unwrap()
    }

    /// Borders of a 2x1 grid whose inner horizontal rule stops short of
    /// the right border.
    fn gappy_lines() -> Vec<Line> {
        vec![
            line(0.0, 0.0, 120.0, 0.0),
            line(0.0, 50.0, 112.0, 50.0), // stops 8 units short
            line(0.0, 100.0, 120.0, 100.0),
            line(0.0, 0.0, 0.0, 100.0),
            line(120.0, 0.0, 120.0, 100.0),
        ]
    }

    #[test]
    fn test_skeleton_bridges_drawing_gaps() {
        let skeleton = build(&gappy_lines(), &ExtractionOptions::default());
        // Infinite extension still crosses the right border at y=50.
        assert!(skeleton.points.iter().any(|p| p.x == 120.0 && p.y == 50.0));
        assert_eq!(skeleton.cells.len(), 2);
        assert_eq!(skeleton.rows(2.0), 2);
        assert_eq!(skeleton.cols(2.0), 1);
    }

    #[test]
    fn test_skeleton_idempotent() {
        let options = ExtractionOptions::default();
        let first = build(&gappy_lines(), &options);
        let second = build(&gappy_lines(), &options);
        assert_eq!(first.cells.len(), second.cells.len());
        for (a, b) in first.cells.iter().zip(second.cells.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_skeleton_empty_lines() {
        let skeleton = build(&[], &ExtractionOptions::default());
        assert!(skeleton.points.is_empty());
        assert!(skeleton.cells.is_empty());
        assert_eq!(skeleton.rows(2.0), 0);
    }
}
