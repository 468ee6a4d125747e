//! Structured content-stream commands.
//!
//! Instructions use postfix notation: operands precede the one- to
//! three-character opcode. An operand is sometimes a bare number and
//! sometimes a string with an attached kerning adjustment, so operands are
//! an explicit tagged union rather than anything resolved by runtime
//! inspection.

/// A single operand of a content-stream command.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A numeric operand.
    Number(f64),
    /// A string operand with the kerning adjustment that preceded it
    /// inside a show-text group (0 when none was given).
    Text(String, f64),
}

impl Operand {
    /// The numeric value, if this operand is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n),
            Operand::Text(..) => None,
        }
    }

    /// The string value, if this operand is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Operand::Text(s, _) => Some(s),
            Operand::Number(_) => None,
        }
    }

    /// The kerning adjustment attached to a text operand.
    pub fn kerning(&self) -> f64 {
        match self {
            Operand::Text(_, k) => *k,
            Operand::Number(_) => 0.0,
        }
    }
}

/// One parsed instruction: an opcode plus its ordered operands.
///
/// Commands are immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Operator name, e.g. `re`, `Tj`, `cm`
    pub opcode: String,
    /// Operands in stream order
    pub operands: Vec<Operand>,
}

impl Command {
    /// Create a command from an opcode and operand list.
    pub fn new(opcode: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            opcode: opcode.into(),
            operands,
        }
    }

    /// Numeric operand at `index`, if present and numeric.
    pub fn number(&self, index: usize) -> Option<f64> {
        self.operands.get(index).and_then(Operand::as_number)
    }

    /// Text operand at `index`, if present and textual.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.operands.get(index).and_then(Operand::as_text)
    }
}
