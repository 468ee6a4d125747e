//! # Grid Oxide
//!
//! Table reconstruction from fixed-layout document content streams.
//!
//! Pages of datasheet-style documents paint their tables as bare drawing
//! instructions — positioned rectangles, rules, and text-show operators —
//! with no structured table markup anywhere. This crate replays that
//! instruction stream and recovers the logical table purely from the
//! geometry it painted:
//!
//! 1. **Parse** — each instruction line becomes a [`Command`] (opcode +
//!    typed operands).
//! 2. **Replay** — a graphics-state interpreter turns drawing operators
//!    into canonical line segments and text-show operators into anchored
//!    text fragments.
//! 3. **Skeleton** — infinite-extension intersections give a coarse,
//!    advisory estimate of the grid shape.
//! 4. **Rebuild** — exact finite-segment intersections produce the
//!    authoritative cell set, including spanning cells.
//! 5. **Assign** — each text fragment lands in the unique cell containing
//!    its anchor, and the cells arrange into a row/column addressable
//!    [`Table`].
//!
//! ## Quick start
//!
//! ```
//! use grid_oxide::{ExtractionOptions, PageSource, TableExtractor};
//! use indexmap::IndexMap;
//!
//! // A 1x1 table: four borders and one label.
//! let stream = b"0 0 100 0 re\n0 0 0 50 re\n100 0 0 50 re\n0 50 100 0 re\n\
//!                BT\n1 0 0 1 40 20 Tm\n(X) Tj\nET";
//!
//! let page = PageSource::new(stream.as_slice(), (200.0, 100.0), IndexMap::new());
//! let extractor = TableExtractor::new(ExtractionOptions::default().with_flip_y(false));
//! let table = extractor.extract(&page)?;
//!
//! assert_eq!(table.rows(), 1);
//! assert_eq!(table.cell(0, 0)?.text(), "X");
//! # Ok::<(), grid_oxide::Error>(())
//! ```
//!
//! ## Scope
//!
//! Replay fidelity is intentionally partial: curves collapse to straight
//! segments, paint/fill operators are no-ops, and only the operator subset
//! needed to recover a grid of cells and their text is interpreted.
//! Locating the page that holds a named table, turning cell text into
//! structured attributes, and fetching documents are all left to
//! collaborators.
//!
//! Extraction is single-threaded and deterministic within a page; pages
//! are fully independent, so batches can be fanned out across threads
//! with one extractor clone per worker and no locking.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Content-stream parsing and replay
pub mod content;

// Geometric primitives
pub mod geometry;

// Grid reconstruction and the table model
pub mod table;

// Per-page pipeline
pub mod extractor;

pub use config::ExtractionOptions;
pub use content::{Command, Operand, TextFragment};
pub use error::{Error, Result};
pub use extractor::{PageSource, TableExtractor};
pub use geometry::{Joints, Line, Point};
pub use table::{Cell, Table};
