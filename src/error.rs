//! Error types for the table reconstruction library.
//!
//! This module defines all error types that can occur while parsing content
//! streams and rebuilding table grids.

/// Result type alias for table reconstruction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during content-stream interpretation and
/// grid reconstruction.
///
/// Failure granularity follows the pipeline: parse errors skip a line,
/// geometry errors skip a candidate pair, `NotATable` abandons a page, and
/// lookup errors surface bad grid queries to the caller instead of handing
/// back defaults.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A content-stream line did not match the command grammar.
    ///
    /// Never fatal: the extractor logs the line and continues with the next.
    #[error("failed to parse content line {line}: {reason}")]
    Parse {
        /// 1-based line number within the page's content stream
        line: usize,
        /// Reason the grammar rejected the line
        reason: String,
    },

    /// A candidate line pair had no usable intersection (parallel lines,
    /// coincident or degenerate segments, crossing outside both segments).
    ///
    /// The pair is skipped; the build continues.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// The page painted more line primitives than the configured ceiling,
    /// so it is judged not to contain a table.
    ///
    /// Reported to the caller as "no table on this page", not as a hard
    /// failure, and raised before any quadratic intersection pass runs.
    #[error("page drew {lines} lines, exceeding the table ceiling of {limit}")]
    NotATable {
        /// Number of line primitives the page painted
        lines: usize,
        /// Configured ceiling that was exceeded
        limit: usize,
    },

    /// A row, column, or cell query addressed coordinates absent from the
    /// table grid.
    #[error("no {kind} {index} in a {rows}x{cols} table")]
    Lookup {
        /// What was looked up ("row", "column", or "cell")
        kind: &'static str,
        /// The offending index
        index: usize,
        /// Row count of the table queried
        rows: usize,
        /// Column count of the table queried
        cols: usize,
    },
}
