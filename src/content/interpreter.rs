//! Graphics-state replay for one page.
//!
//! The interpreter consumes the ordered [`Command`] sequence of a page and
//! produces the two inputs of grid reconstruction: canonical [`Line`]
//! segments from the box/line drawing operators, and anchored
//! [`TextFragment`]s from the text-show operators. Replay is strictly
//! sequential against one mutable [`GraphicsState`] — no operator may read
//! state set by a later one, and nothing here is shared across pages.
//!
//! Fidelity is deliberately partial: curves collapse to straight segments,
//! paint/fill operators are no-ops, and the figure transform is replaced
//! wholesale by `cm` rather than composed.

use crate::config::ExtractionOptions;
use crate::content::command::{Command, Operand};
use crate::content::fonts::FontTable;
use crate::geometry::{Line, Point};

/// A six-component affine transform.
///
/// Used for both the figure transform (`cm`) and the text transform
/// (`Tm`). Operand order in the stream is
/// `scale_x shear_x shear_y scale_y offset_x offset_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Horizontal scaling component
    pub scale_x: f64,
    /// Horizontal shear component
    pub shear_x: f64,
    /// Vertical shear component
    pub shear_y: f64,
    /// Vertical scaling component
    pub scale_y: f64,
    /// Horizontal translation
    pub offset_x: f64,
    /// Vertical translation
    pub offset_y: f64,
}

impl Transform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            shear_x: 0.0,
            shear_y: 0.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Build a transform from the six operands of `cm`/`Tm`.
    pub fn from_operands(cmd: &Command) -> Self {
        Self {
            scale_x: cmd.number(0).unwrap_or(1.0),
            shear_x: cmd.number(1).unwrap_or(0.0),
            shear_y: cmd.number(2).unwrap_or(0.0),
            scale_y: cmd.number(3).unwrap_or(1.0),
            offset_x: cmd.number(4).unwrap_or(0.0),
            offset_y: cmd.number(5).unwrap_or(0.0),
        }
    }

    /// Apply the transform to a point.
    ///
    /// # Examples
    ///
    /// ```
    /// use grid_oxide::content::Transform;
    ///
    /// let mut t = Transform::identity();
    /// t.scale_x = 2.0;
    /// t.offset_x = 10.0;
    /// assert_eq!(t.apply(5.0, 3.0), (20.0, 3.0));
    /// ```
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.scale_x * x + self.shear_y * y + self.offset_x,
            self.shear_x * x + self.scale_y * y + self.offset_y,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Mutable graphics state for one page's replay.
///
/// One instance per page, owned by the [`Interpreter`], never shared
/// across pages or threads.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current figure (drawing) transform
    pub figure: Transform,
    /// Current text transform
    pub text: Transform,
    /// Text cursor position in device space
    pub cursor: (f64, f64),
    /// Line leading (`TL` / `TD`)
    pub leading: f64,
    /// Character spacing (`Tc`)
    pub char_spacing: f64,
    /// Word spacing (`Tw`)
    pub word_spacing: f64,
    /// Text rise (`Ts`)
    pub rise: f64,
    /// Active in-stream font key (`Tf`)
    pub font_key: String,
    /// Active font size (`Tf`)
    pub font_size: f64,
    /// Page crop-box dimensions (width, height)
    pub crop: (f64, f64),
    /// Mirror y coordinates against the crop height
    pub flip_y: bool,
}

impl GraphicsState {
    /// Fresh state for a page.
    pub fn new(crop: (f64, f64), flip_y: bool, font_size: f64) -> Self {
        let mut state = Self {
            figure: Transform::identity(),
            text: Transform::identity(),
            cursor: (0.0, 0.0),
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            rise: 0.0,
            font_key: String::new(),
            font_size,
            crop,
            flip_y,
        };
        state.reset_cursor();
        state
    }

    /// Mirror a y coordinate against the crop height when flipping.
    pub fn flip(&self, y: f64) -> f64 {
        if self.flip_y {
            self.crop.1 - y
        } else {
            y
        }
    }

    /// Move the text cursor back to the page top (`BT`/`ET`).
    pub fn reset_cursor(&mut self) {
        self.cursor = if self.flip_y {
            (0.0, 0.0)
        } else {
            (0.0, self.crop.1)
        };
    }
}

/// A shown string plus the cursor anchor where it began rendering.
///
/// The anchor is what assigns the fragment to a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// The shown text
    pub text: String,
    /// X coordinate of the anchor
    pub x: f64,
    /// Y coordinate of the anchor
    pub y: f64,
}

/// Replays a page's commands into lines and text fragments.
pub struct Interpreter {
    state: GraphicsState,
    options: ExtractionOptions,
    fonts: FontTable,
    lines: Vec<Line>,
    fragments: Vec<TextFragment>,
    /// Current point for `m`/`l`/`c` path construction
    path_cursor: Option<(f64, f64)>,
}

impl Interpreter {
    /// Create an interpreter for one page.
    pub fn new(options: ExtractionOptions, crop: (f64, f64), fonts: FontTable) -> Self {
        let state = GraphicsState::new(crop, options.flip_y, options.default_font_size);
        Self {
            state,
            options,
            fonts,
            lines: Vec::new(),
            fragments: Vec::new(),
            path_cursor: None,
        }
    }

    /// The current graphics state.
    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    /// Execute one command against the state.
    pub fn execute(&mut self, cmd: &Command) {
        match cmd.opcode.as_str() {
            "cm" => self.state.figure = Transform::from_operands(cmd),
            "re" => self.op_rectangle(cmd),
            "Tf" => self.op_set_font(cmd),
            "Td" => self.op_translate_cursor(cmd, false),
            "TD" => self.op_translate_cursor(cmd, true),
            "Tm" => self.op_text_transform(cmd),
            "Tc" => self.state.char_spacing = cmd.number(0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = cmd.number(0).unwrap_or(0.0),
            "TL" => self.state.leading = cmd.number(0).unwrap_or(0.0),
            "Ts" => self.state.rise = cmd.number(0).unwrap_or(0.0),
            "T*" => self.op_next_line(),
            "Tj" => self.op_show(cmd),
            "TJ" => self.op_show_kerned(cmd),
            "BT" | "ET" => self.state.reset_cursor(),
            "m" => self.op_move_to(cmd),
            "l" => self.op_line_to(cmd, 0, 1),
            "c" => self.op_line_to(cmd, 4, 5), // curve endpoint; straight approximation
            other => log::trace!("ignoring opcode {other:?}"),
        }
    }

    /// Execute a whole command sequence in order.
    pub fn execute_all<'a>(&mut self, commands: impl IntoIterator<Item = &'a Command>) {
        for cmd in commands {
            self.execute(cmd);
        }
    }

    /// Finish replay, handing over the collected lines and fragments.
    pub fn finish(self) -> (Vec<Line>, Vec<TextFragment>) {
        (self.lines, self.fragments)
    }

    /// `re`: classify a rectangle as one horizontal line, one vertical
    /// line, or a filled box (no line), keeping only rectangles inside the
    /// useful content band.
    fn op_rectangle(&mut self, cmd: &Command) {
        let x = cmd.number(0).unwrap_or(0.0);
        let y = cmd.number(1).unwrap_or(0.0);
        let w = cmd.number(2).unwrap_or(0.0);
        let h = cmd.number(3).unwrap_or(0.0);

        let (tx, ty) = self.state.figure.apply(x, y);
        let width = w * self.state.figure.scale_x;
        let height = h * self.state.figure.scale_y;
        let fy = self.state.flip(ty);

        if !self.in_content_band(fy) {
            return;
        }

        if width.abs() > height.abs() {
            let a = Point::new(tx, fy);
            let b = Point::new(tx + width, fy);
            self.push_line(a, b);
        } else if height.abs() > width.abs() {
            let a = Point::new(tx, fy);
            let b = Point::new(tx, self.state.flip(ty + height));
            self.push_line(a, b);
        }
        // width == height: a filled box, not a border stroke
    }

    /// `Tf`: select font key and size; size 0 is invalid and falls back to
    /// the configured default.
    fn op_set_font(&mut self, cmd: &Command) {
        if let Some(key) = cmd.text(0) {
            self.state.font_key = key.to_string();
        }
        let size = cmd.number(1).unwrap_or(0.0);
        self.state.font_size = if size == 0.0 {
            log::debug!("font {:?} selected with size 0, using default", self.state.font_key);
            self.options.default_font_size
        } else {
            size
        };
    }

    /// `Td`/`TD`: translate the cursor by the scaled offsets. `TD` also
    /// derives the leading from the vertical offset.
    fn op_translate_cursor(&mut self, cmd: &Command, set_leading: bool) {
        let dx = cmd.number(0).unwrap_or(0.0);
        let dy = cmd.number(1).unwrap_or(0.0);
        self.state.cursor.0 += dx * self.state.text.scale_x;
        let step = dy * self.state.text.scale_y;
        if self.state.flip_y {
            self.state.cursor.1 -= step;
        } else {
            self.state.cursor.1 += step;
        }
        if set_leading {
            self.state.leading = if self.state.flip_y { -dy } else { dy };
        }
    }

    /// `Tm`: replace the text transform wholesale and reposition the
    /// cursor at its offset.
    fn op_text_transform(&mut self, cmd: &Command) {
        let transform = Transform::from_operands(cmd);
        self.state.cursor = (transform.offset_x, self.state.flip(transform.offset_y));
        self.state.text = transform;
    }

    /// `T*`: advance the cursor by the current leading only.
    fn op_next_line(&mut self) {
        if self.state.flip_y {
            self.state.cursor.1 += self.state.leading;
        } else {
            self.state.cursor.1 -= self.state.leading;
        }
    }

    /// `Tj`: one fragment at the current cursor, then the flip-mode
    /// line-height compensation nudge.
    fn op_show(&mut self, cmd: &Command) {
        if let Some(text) = cmd.text(0) {
            let anchor = self.text_anchor();
            self.push_fragment(text.to_string(), anchor);
        }
        if self.state.flip_y {
            self.state.cursor.1 += self.state.font_size / 2.0;
        }
    }

    /// `TJ`: kerned show. Each kerning offset moves the cursor before its
    /// string renders; strings advance character by character through the
    /// measured widths plus char/word spacing. A new fragment starts
    /// whenever a positional adjustment exceeds the configured gap
    /// threshold — the heuristic that recovers discrete words from a
    /// kerned run.
    fn op_show_kerned(&mut self, cmd: &Command) {
        let font_size = self.state.font_size;
        let scale_x = self.state.text.scale_x;
        let char_spacing = self.state.char_spacing;
        let word_spacing = self.state.word_spacing;
        let font_key = self.state.font_key.clone();
        let threshold = self.options.fragment_gap_threshold;

        let mut pending = String::new();
        let mut anchor = self.text_anchor();

        for operand in &cmd.operands {
            let Operand::Text(text, kerning) = operand else {
                continue;
            };
            // Positive kerning tightens the run; negative opens a gap.
            let shift = -kerning / 1000.0 * font_size * scale_x;
            if shift > threshold && !pending.is_empty() {
                self.push_fragment(std::mem::take(&mut pending), anchor);
            }
            self.state.cursor.0 += shift;

            for ch in text.chars() {
                let gap = char_spacing + if ch == ' ' { word_spacing } else { 0.0 };
                if (ch == ' ' || gap > threshold) && !pending.is_empty() {
                    self.push_fragment(std::mem::take(&mut pending), anchor);
                }
                if pending.is_empty() {
                    anchor = self.text_anchor();
                }
                let advance = self.fonts.advance(&font_key, ch) / 1000.0 * font_size * scale_x;
                if ch != ' ' {
                    pending.push(ch);
                }
                self.state.cursor.0 += advance + gap;
            }
        }
        if !pending.is_empty() {
            self.push_fragment(pending, anchor);
        }
    }

    /// `m`: begin a path at the transformed point.
    fn op_move_to(&mut self, cmd: &Command) {
        let x = cmd.number(0).unwrap_or(0.0);
        let y = cmd.number(1).unwrap_or(0.0);
        let (tx, ty) = self.state.figure.apply(x, y);
        self.path_cursor = Some((tx, self.state.flip(ty)));
    }

    /// `l`/`c`: straight segment from the path cursor to the endpoint at
    /// the given operand indices. Diagonal segments cannot bound a
    /// rectilinear grid and are dropped.
    fn op_line_to(&mut self, cmd: &Command, x_index: usize, y_index: usize) {
        let x = cmd.number(x_index).unwrap_or(0.0);
        let y = cmd.number(y_index).unwrap_or(0.0);
        let (tx, ty) = self.state.figure.apply(x, y);
        let end = (tx, self.state.flip(ty));

        if let Some(start) = self.path_cursor {
            let axis_aligned = (start.0 - end.0).abs() <= self.options.point_tolerance
                || (start.1 - end.1).abs() <= self.options.point_tolerance;
            if axis_aligned && self.in_content_band(start.1) && self.in_content_band(end.1) {
                self.push_line(Point::new(start.0, start.1), Point::new(end.0, end.1));
            }
        }
        self.path_cursor = Some(end);
    }

    /// Whether a flipped y coordinate falls inside the useful content band.
    fn in_content_band(&self, y: f64) -> bool {
        y >= self.options.band_top && y <= self.state.crop.1 - self.options.band_bottom
    }

    /// Keep a segment if it is non-degenerate and long enough to be a
    /// table border rather than noise.
    fn push_line(&mut self, a: Point, b: Point) {
        if let Some(line) = Line::new(a, b) {
            if line.length() >= self.options.min_line_length {
                self.lines.push(line);
            }
        }
    }

    /// The anchor a fragment started at: the cursor, lifted by the rise.
    fn text_anchor(&self) -> (f64, f64) {
        if self.state.flip_y {
            (self.state.cursor.0, self.state.cursor.1 - self.state.rise)
        } else {
            (self.state.cursor.0, self.state.cursor.1 + self.state.rise)
        }
    }

    fn push_fragment(&mut self, text: String, anchor: (f64, f64)) {
        let cleaned = clean_text(&text);
        if cleaned.trim().is_empty() {
            return;
        }
        self.fragments.push(TextFragment {
            text: cleaned,
            x: anchor.0,
            y: anchor.1,
        });
    }
}

/// Repair mojibake that byte-oriented stream decoding leaves behind in
/// shown text.
fn clean_text(text: &str) -> String {
    text.replace("â€“", "-")
        .replace('\u{2013}', "-")
        .replace("Ã—", "x")
        .replace('\u{d7}', "x")
}
