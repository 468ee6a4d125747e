//! Font resource table and approximate text metrics.
//!
//! Text-show replay needs character advance widths to move the cursor, but
//! glyph rendering itself is out of scope: widths only have to be close
//! enough that fragment anchors land in the right cell. Widths are the
//! standard proportional metrics in thousandths of an em, with a fixed
//! pitch for Courier-family fonts; anything unknown falls back to an
//! average width.
//!
//! Lookups are memoized in a cache owned by the table instance — it is
//! constructed and discarded with the interpreter that owns it, never
//! shared process-wide.

use indexmap::IndexMap;
use std::collections::HashMap;

/// Proportional character advance widths, in thousandths of an em
/// (Helvetica metrics).
static PROPORTIONAL_WIDTHS: phf::Map<char, u16> = phf::phf_map! {
    ' ' => 278, '!' => 278, '"' => 355, '#' => 556, '$' => 556,
    '%' => 889, '&' => 667, '\'' => 191, '(' => 333, ')' => 333,
    '*' => 389, '+' => 584, ',' => 278, '-' => 333, '.' => 278,
    '/' => 278, '0' => 556, '1' => 556, '2' => 556, '3' => 556,
    '4' => 556, '5' => 556, '6' => 556, '7' => 556, '8' => 556,
    '9' => 556, ':' => 278, ';' => 278, '<' => 584, '=' => 584,
    '>' => 584, '?' => 556, '@' => 1015, 'A' => 667, 'B' => 667,
    'C' => 722, 'D' => 722, 'E' => 667, 'F' => 611, 'G' => 778,
    'H' => 722, 'I' => 278, 'J' => 500, 'K' => 667, 'L' => 556,
    'M' => 833, 'N' => 722, 'O' => 778, 'P' => 667, 'Q' => 778,
    'R' => 722, 'S' => 667, 'T' => 611, 'U' => 722, 'V' => 667,
    'W' => 944, 'X' => 667, 'Y' => 667, 'Z' => 611, '[' => 278,
    '\\' => 278, ']' => 278, '^' => 469, '_' => 556, '`' => 333,
    'a' => 556, 'b' => 556, 'c' => 500, 'd' => 556, 'e' => 556,
    'f' => 278, 'g' => 556, 'h' => 556, 'i' => 222, 'j' => 222,
    'k' => 500, 'l' => 222, 'm' => 833, 'n' => 556, 'o' => 556,
    'p' => 556, 'q' => 556, 'r' => 333, 's' => 500, 't' => 278,
    'u' => 556, 'v' => 500, 'w' => 722, 'x' => 500, 'y' => 500,
    'z' => 500, '{' => 334, '|' => 260, '}' => 334, '~' => 584,
};

/// Fixed advance for Courier-family (monospaced) fonts.
const FIXED_PITCH_WIDTH: u16 = 600;

/// Average advance used for characters outside the width table.
const FALLBACK_WIDTH: u16 = 556;

/// Maps in-stream font keys to family names and measures character
/// advances for the active font.
#[derive(Debug, Clone)]
pub struct FontTable {
    /// In-stream key (e.g. `F4`) to font family name, page-resource order
    resources: IndexMap<String, String>,
    /// Memoized (font key, char) advance lookups
    cache: HashMap<(String, char), f64>,
}

impl FontTable {
    /// Build a font table from a page's resource mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_oxide::content::FontTable;
    /// use indexmap::IndexMap;
    ///
    /// let mut resources = IndexMap::new();
    /// resources.insert("F4".to_string(), "Helvetica".to_string());
    /// let fonts = FontTable::new(resources);
    /// assert_eq!(fonts.family("F4"), Some("Helvetica"));
    /// assert_eq!(fonts.family("F9"), None);
    /// ```
    pub fn new(resources: IndexMap<String, String>) -> Self {
        Self {
            resources,
            cache: HashMap::new(),
        }
    }

    /// Family name registered for an in-stream font key.
    pub fn family(&self, key: &str) -> Option<&str> {
        self.resources.get(key).map(String::as_str)
    }

    /// Advance width of `ch` in the font selected by `key`, in
    /// thousandths of an em. Memoized per (key, char).
    pub fn advance(&mut self, key: &str, ch: char) -> f64 {
        let cache_key = (key.to_string(), ch);
        if let Some(&width) = self.cache.get(&cache_key) {
            return width;
        }
        let fixed_pitch = self
            .family(key)
            .is_some_and(|family| family.contains("Courier") || family.contains("Mono"));
        let width = if fixed_pitch {
            f64::from(FIXED_PITCH_WIDTH)
        } else {
            f64::from(
                PROPORTIONAL_WIDTHS
                    .get(&ch)
                    .copied()
                    .unwrap_or(FALLBACK_WIDTH),
            )
        };
        self.cache.insert(cache_key, width);
        width
    }
}
