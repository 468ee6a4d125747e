//! Per-page table extraction pipeline.
//!
//! Wires the stages together in strict order: decode the raw instruction
//! bytes, parse line by line (bad lines are logged and skipped), replay
//! into geometry and text, apply the not-a-table resource guard, estimate
//! the grid with the skeleton, rebuild the exact grid, and assign text.
//! Every stage only consumes the output of the previous one.

use crate::config::ExtractionOptions;
use crate::content::parser::encode_escapes;
use crate::content::{parse_commands, FontTable, Interpreter};
use crate::error::{Error, Result};
use crate::table::{assign_text, rebuild, skeleton, Table};
use indexmap::IndexMap;

/// Everything the document-parsing collaborator supplies for one page:
/// the raw content-stream instruction bytes, the declared crop-box
/// dimensions, and the resource table mapping in-stream font keys to
/// family names.
#[derive(Debug, Clone)]
pub struct PageSource {
    content: Vec<u8>,
    crop: (f64, f64),
    fonts: IndexMap<String, String>,
}

impl PageSource {
    /// Bundle a page's inputs.
    pub fn new(
        content: impl Into<Vec<u8>>,
        crop: (f64, f64),
        fonts: IndexMap<String, String>,
    ) -> Self {
        Self {
            content: content.into(),
            crop,
            fonts,
        }
    }

    /// The page's crop-box dimensions (width, height).
    pub fn crop(&self) -> (f64, f64) {
        self.crop
    }
}

/// Extracts a [`Table`] from a page's content stream.
///
/// An extractor holds only configuration; each [`extract`](Self::extract)
/// call builds all per-page state fresh and discards it with the returned
/// table, so independent pages can be processed on independent threads
/// with separate extractors (or clones of one) and zero shared state.
///
/// # Examples
///
/// ```
/// use grid_oxide::{ExtractionOptions, PageSource, TableExtractor};
/// use indexmap::IndexMap;
///
/// let stream = b"0 0 100 0 re\n0 0 0 50 re\n100 0 0 50 re\n0 50 100 0 re\n\
///               BT\n1 0 0 1 40 20 Tm\n(X) Tj\nET";
/// let page = PageSource::new(stream.as_slice(), (200.0, 100.0), IndexMap::new());
/// let extractor = TableExtractor::new(ExtractionOptions::default().with_flip_y(false));
/// let table = extractor.extract(&page).unwrap();
/// assert_eq!(table.cell(0, 0).unwrap().text(), "X");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableExtractor {
    options: ExtractionOptions,
}

impl TableExtractor {
    /// Create an extractor with the given options.
    pub fn new(options: ExtractionOptions) -> Self {
        Self { options }
    }

    /// The active options.
    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Extract the table painted on one page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotATable`] when the page paints more line
    /// primitives than the configured ceiling; the quadratic intersection
    /// passes are skipped entirely in that case. A page that parses
    /// cleanly but closes no cells yields an empty table, not an error.
    pub fn extract(&self, page: &PageSource) -> Result<Table> {
        let text = decode_stream(&page.content);
        let mut interpreter = Interpreter::new(
            self.options.clone(),
            page.crop,
            FontTable::new(page.fonts.clone()),
        );

        for (index, raw_line) in text.lines().enumerate() {
            let line = encode_escapes(raw_line);
            match parse_commands(index + 1, &line) {
                Ok(commands) => interpreter.execute_all(&commands),
                Err(err) => log::debug!("{err}"),
            }
        }

        let (lines, fragments) = interpreter.finish();
        if lines.len() > self.options.max_lines {
            return Err(Error::NotATable {
                lines: lines.len(),
                limit: self.options.max_lines,
            });
        }

        let estimate = skeleton::build(&lines, &self.options);
        log::debug!(
            "estimated table shape: {} rows x {} cols",
            estimate.rows(self.options.point_tolerance),
            estimate.cols(self.options.point_tolerance)
        );

        let mut cells = rebuild::rebuild(&lines, &self.options);
        if cells.len() != estimate.cells.len() {
            log::debug!(
                "rebuild found {} cells against a skeleton estimate of {}",
                cells.len(),
                estimate.cells.len()
            );
        }

        assign_text(&mut cells, &fragments);
        Ok(Table::from_cells(cells, self.options.point_tolerance))
    }

    /// Extract tables from many pages, isolating failures.
    ///
    /// Each page gets its own result; a failure on one page is logged at
    /// page granularity and never aborts the others.
    pub fn extract_batch<'a>(
        &self,
        pages: impl IntoIterator<Item = &'a PageSource>,
    ) -> Vec<Result<Table>> {
        pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| {
                let result = self.extract(page);
                if let Err(err) = &result {
                    log::warn!("page {index}: {err}");
                }
                result
            })
            .collect()
    }
}

/// Decode raw stream bytes into text, one char per byte.
///
/// The instruction set is ASCII; string contents ride along bytewise and
/// any multi-byte artifacts are repaired after decoding.
fn decode_stream(content: &[u8]) -> String {
    content.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(stream: &str) -> PageSource {
        PageSource::new(stream.as_bytes(), (200.0, 100.0), IndexMap::new())
    }

    fn extractor() -> TableExtractor {
        TableExtractor::new(ExtractionOptions::default().with_flip_y(false))
    }

    #[test]
    fn test_line_ceiling_short_circuits() {
        let mut stream = String::new();
        for i in 0..20 {
            stream.push_str(&format!("0 {} 100 0 re\n", i * 4));
        }
        let options = ExtractionOptions::default()
            .with_flip_y(false)
            .with_max_lines(10);
        let err = TableExtractor::new(options).extract(&page(&stream)).unwrap_err();
        match err {
            Error::NotATable { lines, limit } => {
                assert_eq!(lines, 20);
                assert_eq!(limit, 10);
            },
            other => panic!("expected NotATable, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_lines_are_skipped_not_fatal() {
        let stream = "not (a valid\n0 0 100 0 re\n0 0 0 50 re\n100 0 0 50 re\n0 50 100 0 re";
        let table = extractor().extract(&page(stream)).unwrap();
        assert_eq!(table.rows(), 1);
        assert_eq!(table.cols(), 1);
    }

    #[test]
    fn test_empty_page_yields_empty_table() {
        let table = extractor().extract(&page("BT\nET")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_batch_isolates_failures() {
        let good = page("0 0 100 0 re\n0 0 0 50 re\n100 0 0 50 re\n0 50 100 0 re");
        let mut noisy = String::new();
        for i in 0..30 {
            noisy.push_str(&format!("0 {} 100 0 re\n", i * 3));
        }
        let options = ExtractionOptions::default()
            .with_flip_y(false)
            .with_max_lines(10);
        let bad = page(&noisy);
        let results = TableExtractor::new(options).extract_batch([&bad, &good]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
        assert_eq!(results[1].as_ref().unwrap().rows(), 1);
    }

    #[test]
    fn test_escaped_delimiters_reach_cell_text() {
        let stream = "0 0 100 0 re\n0 0 0 50 re\n100 0 0 50 re\n0 50 100 0 re\n\
                      BT\n1 0 0 1 10 20 Tm\n(VDD \\(core\\)) Tj\nET";
        let table = extractor().extract(&page(stream)).unwrap();
        assert_eq!(table.cell(0, 0).unwrap().text(), "VDD (core)");
    }
}
