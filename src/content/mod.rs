//! Content-stream parsing and replay.
//!
//! A page's appearance is painted by a stream of positioned drawing and
//! text-show instructions with persistent graphics state. This module
//! turns raw instruction lines into structured [`Command`]s and replays
//! them into geometry and anchored text.

pub mod command;
pub mod fonts;
pub mod interpreter;
pub mod parser;

pub use command::{Command, Operand};
pub use fonts::FontTable;
pub use interpreter::{GraphicsState, Interpreter, TextFragment, Transform};
pub use parser::parse_commands;
