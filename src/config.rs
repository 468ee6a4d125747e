//! Extraction configuration.
//!
//! Every empirically tuned threshold in the pipeline lives here rather than
//! as a constant: the kerning/spacing values that split text runs into
//! fragments were tuned against one family of document producers and other
//! producers may need different numbers. Profiles serialize to JSON so a
//! threshold set can be stored next to the documents it was tuned for.

use serde::{Deserialize, Serialize};

/// Options controlling content-stream interpretation and grid rebuilding.
///
/// # Example
///
/// ```
/// use grid_oxide::config::ExtractionOptions;
///
/// // Defaults: top-down page coordinates, full-page content band.
/// let opts = ExtractionOptions::default();
/// assert!(opts.flip_y);
///
/// // A producer profile for tall datasheet pages with running headers.
/// let tuned = ExtractionOptions::default()
///     .with_content_band(60.0, 20.0)
///     .with_max_lines(500);
/// assert_eq!(tuned.band_top, 60.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Flip the y axis so coordinates grow downward from the page top.
    ///
    /// Content streams position content from the bottom-left corner; table
    /// reading order wants top-down rows. When set, every y coordinate is
    /// mirrored against the crop-box height before any geometry is built.
    pub flip_y: bool,

    /// Top margin of the useful content band, in device units.
    ///
    /// Rectangles whose (flipped) y coordinate lands above this margin are
    /// discarded before any geometry work — a cheap filter for page
    /// headers. 0 keeps the full page.
    pub band_top: f64,

    /// Bottom margin of the useful content band, in device units, measured
    /// up from the crop-box bottom edge. 0 keeps the full page.
    pub band_bottom: f64,

    /// Minimum length for a painted segment to count as a table line;
    /// anything shorter is discarded as noise.
    pub min_line_length: f64,

    /// Proximity tolerance for merging near-coincident points and for
    /// matching shared row/column coordinates while closing cells.
    ///
    /// Independently drawn segment endpoints rarely land on identical
    /// floating coordinates; two points within this distance on both axes
    /// are the same vertex.
    pub point_tolerance: f64,

    /// Tolerance applied at segment endpoints during exact intersection:
    /// a crossing this close to an endpoint still counts as touching,
    /// tolerating borders that stop just short of a corner.
    pub endpoint_tolerance: f64,

    /// Positional adjustment, in device units, above which a kerning
    /// offset or char/word spacing advance starts a new text fragment.
    ///
    /// This is the heuristic that turns a kerned run of characters back
    /// into discrete words. The shipped default was tuned empirically and
    /// is not universal across producers.
    pub fragment_gap_threshold: f64,

    /// Font size used when the stream selects a font with the invalid
    /// size 0.
    pub default_font_size: f64,

    /// Ceiling on the number of line primitives a page may paint before it
    /// is judged "not a table" and the quadratic intersection passes are
    /// skipped entirely.
    pub max_lines: usize,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            flip_y: true,
            band_top: 0.0,
            band_bottom: 0.0,
            min_line_length: 3.0,
            point_tolerance: 2.0,
            endpoint_tolerance: 2.0,
            fragment_gap_threshold: 2.0,
            default_font_size: 12.0,
            max_lines: 1000,
        }
    }
}

impl ExtractionOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the y-axis flip flag.
    pub fn with_flip_y(mut self, flip: bool) -> Self {
        self.flip_y = flip;
        self
    }

    /// Set the useful content band margins (top, bottom) in device units.
    pub fn with_content_band(mut self, top: f64, bottom: f64) -> Self {
        self.band_top = top;
        self.band_bottom = bottom;
        self
    }

    /// Set the minimum line length.
    pub fn with_min_line_length(mut self, length: f64) -> Self {
        self.min_line_length = length;
        self
    }

    /// Set the point merge tolerance.
    pub fn with_point_tolerance(mut self, tolerance: f64) -> Self {
        self.point_tolerance = tolerance;
        self
    }

    /// Set the segment endpoint tolerance.
    pub fn with_endpoint_tolerance(mut self, tolerance: f64) -> Self {
        self.endpoint_tolerance = tolerance;
        self
    }

    /// Set the fragment gap threshold.
    pub fn with_fragment_gap_threshold(mut self, threshold: f64) -> Self {
        self.fragment_gap_threshold = threshold;
        self
    }

    /// Set the fallback font size for invalid `Tf` sizes.
    pub fn with_default_font_size(mut self, size: f64) -> Self {
        self.default_font_size = size;
        self
    }

    /// Set the not-a-table line ceiling.
    pub fn with_max_lines(mut self, limit: usize) -> Self {
        self.max_lines = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ExtractionOptions::default();
        assert!(opts.flip_y);
        assert_eq!(opts.band_top, 0.0);
        assert_eq!(opts.band_bottom, 0.0);
        assert_eq!(opts.max_lines, 1000);
    }

    #[test]
    fn test_builders() {
        let opts = ExtractionOptions::new()
            .with_flip_y(false)
            .with_content_band(60.0, 20.0)
            .with_min_line_length(5.0)
            .with_fragment_gap_threshold(1.5)
            .with_max_lines(250);
        assert!(!opts.flip_y);
        assert_eq!(opts.band_top, 60.0);
        assert_eq!(opts.band_bottom, 20.0);
        assert_eq!(opts.min_line_length, 5.0);
        assert_eq!(opts.fragment_gap_threshold, 1.5);
        assert_eq!(opts.max_lines, 250);
    }

    #[test]
    fn test_serde_round_trip() {
        let opts = ExtractionOptions::default().with_content_band(50.0, 10.0);
        let json = serde_json::to_string(&opts).unwrap();
        let back: ExtractionOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }
}
