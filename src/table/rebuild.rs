//! Exact grid rebuild from finite-segment intersections.
//!
//! Unlike the skeleton, the rebuild works from the painted ink itself: the
//! original segment endpoints are materialized as vertices, and a crossing
//! only counts when it lies within both segments (with a small tolerance
//! at endpoints for near-miss corners). Vertices carry authoritative
//! connectivity — a crossing strictly between a line's endpoints opens
//! both of that line's directions, an endpoint only the outward one.
//! Vertices left with exactly two opposite flags are pure pass-throughs
//! (collinear segments abutting mid-border, not a corner) and cannot bound
//! any cell, so they are pruned before the closing walk.

use crate::config::ExtractionOptions;
use crate::geometry::{intersect_segments, joints_at, Joints, Line};
use crate::table::grid::{close_cells, PointSet};
use crate::table::Cell;

/// Rebuild the authoritative cell set from a page's line set.
pub fn rebuild(lines: &[Line], options: &ExtractionOptions) -> Vec<Cell> {
    let mut set = PointSet::new(options.point_tolerance);

    for line in lines {
        set.insert(line.p1);
        set.insert(line.p2);
    }

    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            if !a.perpendicular_to(b) {
                continue;
            }
            match intersect_segments(a, b, options.endpoint_tolerance) {
                Ok(mut point) => {
                    point.joints |= joints_at(a, &point, options.endpoint_tolerance)
                        | joints_at(b, &point, options.endpoint_tolerance);
                    set.insert(point);
                },
                Err(err) => log::trace!("skipping line pair: {err}"),
            }
        }
    }

    let mut points = set.into_points();
    points.retain(|p| {
        p.joints != (Joints::UP | Joints::DOWN) && p.joints != (Joints::LEFT | Joints::RIGHT)
    });

    let cells = close_cells(&points, options.point_tolerance);
    log::debug!("rebuild: {} vertices, {} cells", points.len(), cells.len());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
        Line::new(Point::new(x1, y1), Point::new(x2, y2)).unwrap()
    }

    /// Full borders of a 2x2 grid.
    fn grid_lines() -> Vec<Line> {
        vec![
            line(0.0, 0.0, 120.0, 0.0),
            line(0.0, 50.0, 120.0, 50.0),
            line(0.0, 100.0, 120.0, 100.0),
            line(0.0, 0.0, 0.0, 100.0),
            line(60.0, 0.0, 60.0, 100.0),
            line(120.0, 0.0, 120.0, 100.0),
        ]
    }

    #[test]
    fn test_rebuild_full_grid() {
        let cells = rebuild(&grid_lines(), &ExtractionOptions::default());
        assert_eq!(cells.len(), 4);
        for cell in &cells {
            let corners = cell.corners();
            for i in 0..4 {
                for j in (i + 1)..4 {
                    assert_ne!(corners[i], corners[j], "corners must be distinct");
                }
            }
        }
    }

    #[test]
    fn test_rebuild_does_not_invent_missing_crossings() {
        // The inner rule stops 20 units short of the right border. The
        // skeleton would bridge the gap; the exact pass must not, and the
        // dangling rule leaves nothing that closes.
        let lines = vec![
            line(0.0, 0.0, 120.0, 0.0),
            line(0.0, 50.0, 100.0, 50.0),
            line(0.0, 100.0, 120.0, 100.0),
            line(0.0, 0.0, 0.0, 100.0),
            line(120.0, 0.0, 120.0, 100.0),
        ];
        let cells = rebuild(&lines, &ExtractionOptions::default());
        assert!(cells.is_empty());
    }

    #[test]
    fn test_rebuild_per_cell_borders_merge_at_junctions() {
        // A 1x2 table drawn cell by cell: collinear border segments abut
        // at the shared junction without crossing anything there. The
        // endpoint vertices merge into proper T-junctions.
        let lines = vec![
            line(0.0, 0.0, 60.0, 0.0),
            line(60.0, 0.0, 120.0, 0.0),
            line(0.0, 50.0, 60.0, 50.0),
            line(60.0, 50.0, 120.0, 50.0),
            line(0.0, 0.0, 0.0, 50.0),
            line(60.0, 0.0, 60.0, 50.0),
            line(120.0, 0.0, 120.0, 50.0),
        ];
        let cells = rebuild(&lines, &ExtractionOptions::default());
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].p2.x - cells[0].p1.x, 60.0);
        assert_eq!(cells[1].p2.x - cells[1].p1.x, 60.0);
    }

    #[test]
    fn test_rebuild_merged_header_spans() {
        // Middle vertical border only below y=50: the top row is one
        // spanning cell, the bottom row two.
        let lines = vec![
            line(0.0, 0.0, 120.0, 0.0),
            line(0.0, 50.0, 120.0, 50.0),
            line(0.0, 100.0, 120.0, 100.0),
            line(0.0, 0.0, 0.0, 100.0),
            line(60.0, 50.0, 60.0, 100.0),
            line(120.0, 0.0, 120.0, 100.0),
        ];
        let cells = rebuild(&lines, &ExtractionOptions::default());
        assert_eq!(cells.len(), 3);
        let header = cells
            .iter()
            .find(|c| c.p1.y == 0.0)
            .expect("header cell present");
        assert_eq!(header.p2.x - header.p1.x, 120.0);
    }

    #[test]
    fn test_rebuild_lone_cross_closes_nothing() {
        let lines = vec![line(0.0, 50.0, 120.0, 50.0), line(60.0, 0.0, 60.0, 100.0)];
        let cells = rebuild(&lines, &ExtractionOptions::default());
        assert!(cells.is_empty());
    }

    #[test]
    fn test_rebuild_idempotent() {
        let options = ExtractionOptions::default();
        let first = rebuild(&grid_lines(), &options);
        let second = rebuild(&grid_lines(), &options);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a, b);
            assert_eq!(
                a.corners().map(|p| (p.x, p.y)),
                b.corners().map(|p| (p.x, p.y))
            );
        }
    }
}
