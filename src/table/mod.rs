//! Cells, tables, and text-to-cell assignment.
//!
//! The rebuild pass produces [`Cell`] quadrilaterals; this module assigns
//! text fragments into them and arranges them into the row/column
//! addressable [`Table`] exposed to downstream consumers. Spanning cells
//! are shared: one `Arc<Cell>` can sit under several (row, column) keys.

pub mod grid;
pub mod rebuild;
pub mod skeleton;

use crate::content::TextFragment;
use crate::error::{Error, Result};
use crate::geometry::{Point, POINT_MERGE_TOLERANCE};
use indexmap::IndexMap;
use std::sync::{Arc, OnceLock};

/// One table cell: four corners plus the text that landed inside it.
///
/// Corners run clockwise from the top-left: `p1` top-left, `p2`
/// top-right, `p3` bottom-right, `p4` bottom-left. Equality is
/// rotation-invariant — any cyclic rotation of the corners compares equal —
/// which is what makes cell deduplication insensitive to which corner a
/// closing walk started from. Implemented as an explicit comparison of all
/// four rotations; do not replace with a derived structural equality.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Top-left corner
    pub p1: Point,
    /// Top-right corner
    pub p2: Point,
    /// Bottom-right corner
    pub p3: Point,
    /// Bottom-left corner
    pub p4: Point,
    fragments: Vec<TextFragment>,
    merged: OnceLock<String>,
}

impl Cell {
    /// Create an empty cell from its four corners.
    pub fn new(p1: Point, p2: Point, p3: Point, p4: Point) -> Self {
        Self {
            p1,
            p2,
            p3,
            p4,
            fragments: Vec::new(),
            merged: OnceLock::new(),
        }
    }

    /// The corners in clockwise order.
    pub fn corners(&self) -> [Point; 4] {
        [self.p1, self.p2, self.p3, self.p4]
    }

    /// Axis-aligned bounds `(left, top, right, bottom)` spanned by the
    /// first and third corners.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.p1.x.min(self.p3.x),
            self.p1.y.min(self.p3.y),
            self.p1.x.max(self.p3.x),
            self.p1.y.max(self.p3.y),
        )
    }

    /// Whether an anchor point falls inside this cell's bounds.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (left, top, right, bottom) = self.bounds();
        x >= left && x <= right && y >= top && y <= bottom
    }

    /// Append a text fragment. Fragments keep their arrival order.
    pub fn push_fragment(&mut self, fragment: TextFragment) {
        self.fragments.push(fragment);
    }

    /// The fragments assigned to this cell.
    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    /// The cell's merged text, computed lazily on first access.
    ///
    /// Fragments are merged in positional order: an anchor at or to the
    /// right of the running anchor continues the current line, an anchor
    /// below it starts a new one.
    pub fn text(&self) -> &str {
        self.merged.get_or_init(|| merge_fragments(&self.fragments))
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        let a = self.corners();
        let b = other.corners();
        (0..4).any(|rotation| (0..4).all(|i| a[i] == b[(i + rotation) % 4]))
    }
}

fn merge_fragments(fragments: &[TextFragment]) -> String {
    let mut out = String::new();
    let mut running: Option<(f64, f64)> = None;
    for fragment in fragments {
        match running {
            None => out.push_str(&fragment.text),
            Some((_, y)) if fragment.y > y + POINT_MERGE_TOLERANCE => {
                out.push('\n');
                out.push_str(&fragment.text);
            },
            Some(_) => {
                out.push(' ');
                out.push_str(&fragment.text);
            },
        }
        running = Some((fragment.x, fragment.y));
    }
    out
}

/// Assign each text fragment to the unique cell containing its anchor.
///
/// Fragments anchored outside every cell (captions, footnotes near the
/// table) are dropped.
pub fn assign_text(cells: &mut [Cell], fragments: &[TextFragment]) {
    for fragment in fragments {
        if let Some(cell) = cells
            .iter_mut()
            .find(|cell| cell.contains(fragment.x, fragment.y))
        {
            cell.push_fragment(fragment.clone());
        } else {
            log::trace!(
                "fragment {:?} at ({}, {}) falls outside every cell",
                fragment.text,
                fragment.x,
                fragment.y
            );
        }
    }
}

/// A row/column addressable grid of shared cells.
///
/// Rows group cells by shared top-edge y coordinate; columns order by x
/// within a row. A spanning cell appears under every grid position it
/// covers, as the same `Arc`. Lookups outside the grid fail with
/// [`Error::Lookup`] rather than returning defaults.
#[derive(Debug, Clone, Default)]
pub struct Table {
    grid: IndexMap<usize, IndexMap<usize, Arc<Cell>>>,
    rows: usize,
    cols: usize,
}

impl Table {
    /// Arrange finished cells into the grid.
    ///
    /// Row bands come from the distinct top-edge y coordinates and column
    /// bands from the distinct left-edge x coordinates; each cell is
    /// registered under every band its extent covers.
    pub fn from_cells(cells: Vec<Cell>, tolerance: f64) -> Self {
        if cells.is_empty() {
            return Self::default();
        }

        let row_bands = cluster(
            cells.iter().map(|c| c.p1.y.min(c.p2.y)).collect(),
            tolerance,
        );
        let col_bands = cluster(
            cells.iter().map(|c| c.p1.x.min(c.p4.x)).collect(),
            tolerance,
        );

        let mut grid: IndexMap<usize, IndexMap<usize, Arc<Cell>>> = IndexMap::new();
        for cell in cells {
            let top = cell.p1.y.min(cell.p2.y);
            let bottom = cell.p4.y.max(cell.p3.y);
            let left = cell.p1.x.min(cell.p4.x);
            let right = cell.p2.x.max(cell.p3.x);
            let shared = Arc::new(cell);

            for (ri, &row_y) in row_bands.iter().enumerate() {
                if row_y < top - tolerance || row_y >= bottom - tolerance {
                    continue;
                }
                for (ci, &col_x) in col_bands.iter().enumerate() {
                    if col_x < left - tolerance || col_x >= right - tolerance {
                        continue;
                    }
                    grid.entry(ri)
                        .or_default()
                        .insert(ci, Arc::clone(&shared));
                }
            }
        }

        // Deterministic iteration order regardless of cell arrival order.
        grid.sort_keys();
        for row in grid.values_mut() {
            row.sort_keys();
        }

        Self {
            grid,
            rows: row_bands.len(),
            cols: col_bands.len(),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the table has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// The cells of row `n`, ordered by column.
    ///
    /// A cell spanning several columns appears once per position.
    pub fn row(&self, n: usize) -> Result<Vec<Arc<Cell>>> {
        self.grid
            .get(&n)
            .map(|row| row.values().cloned().collect())
            .ok_or(Error::Lookup {
                kind: "row",
                index: n,
                rows: self.rows,
                cols: self.cols,
            })
    }

    /// The cells of column `n`, ordered by row.
    pub fn col(&self, n: usize) -> Result<Vec<Arc<Cell>>> {
        let cells: Vec<Arc<Cell>> = self
            .grid
            .values()
            .filter_map(|row| row.get(&n).cloned())
            .collect();
        if cells.is_empty() {
            return Err(Error::Lookup {
                kind: "column",
                index: n,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(cells)
    }

    /// The cell at (row, col).
    pub fn cell(&self, row: usize, col: usize) -> Result<Arc<Cell>> {
        let cells = self.grid.get(&row).ok_or(Error::Lookup {
            kind: "row",
            index: row,
            rows: self.rows,
            cols: self.cols,
        })?;
        cells.get(&col).cloned().ok_or(Error::Lookup {
            kind: "column",
            index: col,
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// How many grid positions a cell occupies, as (row span, column
    /// span), counted from its appearances across the mapping.
    pub fn cell_span(&self, cell: &Arc<Cell>) -> Result<(usize, usize)> {
        let mut row_span = 0;
        let mut col_span = 0;
        for row in self.grid.values() {
            let count = row
                .values()
                .filter(|candidate| Arc::ptr_eq(candidate, cell))
                .count();
            if count > 0 {
                row_span += 1;
                col_span = col_span.max(count);
            }
        }
        if row_span == 0 {
            return Err(Error::Lookup {
                kind: "cell",
                index: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok((row_span, col_span))
    }
}

/// Collapse sorted coordinate values into distinct bands within a
/// tolerance.
fn cluster(mut values: Vec<f64>, tolerance: f64) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut bands: Vec<f64> = Vec::new();
    for value in values {
        match bands.last() {
            Some(&last) if value - last <= tolerance => {},
            _ => bands.push(value),
        }
    }
    bands
}
