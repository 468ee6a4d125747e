//! Content-stream command parser.
//!
//! Instructions arrive one line at a time in postfix notation — operands
//! before the opcode:
//!
//! ```text
//! BT
//! /F4 9 Tf
//! 1 0 0 1 306.14 761.82 Tm
//! [(T)72.3(a)5.5(ble 4.)] TJ
//! 0 273.98 124.15 0.48 re
//! ET
//! ```
//!
//! A line is parsed into zero or more [`Command`]s. Literal delimiter
//! characters inside string operands arrive pre-escaped by the caller as
//! sentinel bytes (see [`encode_escapes`]) and are decoded back before
//! storage. A line that matches no grammar alternative yields
//! [`Error::Parse`]; the caller logs it and moves on — a bad line is never
//! fatal to the page.

use crate::content::command::{Command, Operand};
use crate::error::{Error, Result};
use nom::branch::alt;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::{char, digit0, digit1, multispace0, one_of};
use nom::combinator::{opt, recognize, verify};
use nom::multi::many1;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

/// Sentinel standing in for an escaped `(` inside a string operand.
pub const ESCAPED_LPAREN: char = '\u{1}';
/// Sentinel standing in for an escaped `)` inside a string operand.
pub const ESCAPED_RPAREN: char = '\u{2}';
/// Sentinel standing in for an escaped `<` inside a string operand.
pub const ESCAPED_LANGLE: char = '\u{3}';
/// Sentinel standing in for an escaped `>` inside a string operand.
pub const ESCAPED_RANGLE: char = '\u{4}';

/// Replace backslash-escaped string delimiters with sentinel characters so
/// the grammar can treat every remaining delimiter as structural.
///
/// The parser decodes the sentinels back into literal delimiter characters
/// when it stores text operands.
pub fn encode_escapes(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('(') => out.push(ESCAPED_LPAREN),
            Some(')') => out.push(ESCAPED_RPAREN),
            Some('<') => out.push(ESCAPED_LANGLE),
            Some('>') => out.push(ESCAPED_RANGLE),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            },
            None => out.push('\\'),
        }
    }
    out
}

/// Decode delimiter sentinels back into their literal characters.
fn decode_escapes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ESCAPED_LPAREN => '(',
            ESCAPED_RPAREN => ')',
            ESCAPED_LANGLE => '<',
            ESCAPED_RANGLE => '>',
            other => other,
        })
        .collect()
}

/// Parse one instruction line into commands.
///
/// Lines beginning with the resource-name marker `/` are short-circuited
/// into a single name/number command without full grammar parsing. Empty
/// lines produce no commands.
///
/// # Examples
///
/// ```
/// use grid_oxide::content::parse_commands;
///
/// let cmds = parse_commands(1, "0 273.98 124.15 0.48 re").unwrap();
/// assert_eq!(cmds.len(), 1);
/// assert_eq!(cmds[0].opcode, "re");
/// assert_eq!(cmds[0].number(2), Some(124.15));
///
/// let cmds = parse_commands(2, "/F4 9 Tf").unwrap();
/// assert_eq!(cmds[0].text(0), Some("F4"));
/// assert_eq!(cmds[0].number(1), Some(9.0));
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] when the line matches no grammar alternative;
/// the error carries `line` so the caller can log and skip it.
pub fn parse_commands(line: usize, input: &str) -> Result<Vec<Command>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(rest) = trimmed.strip_prefix('/') {
        return resource_command(line, rest).map(|cmd| vec![cmd]);
    }

    let mut commands = Vec::new();
    let mut remaining = trimmed;
    while !remaining.trim_start().is_empty() {
        match command(remaining.trim_start()) {
            Ok((rest, cmd)) => {
                commands.push(cmd);
                remaining = rest;
            },
            Err(err) => {
                return Err(Error::Parse {
                    line,
                    reason: format!("unrecognized instruction {remaining:?}: {err}"),
                });
            },
        }
    }
    Ok(commands)
}

/// Short-circuit a resource-marker line (`/F4 9 Tf`) into one command.
///
/// The marker names a resource (a font key, a graphics-state dictionary);
/// the final token is the opcode and any tokens between parse as numbers.
fn resource_command(line: usize, rest: &str) -> Result<Command> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let (&opcode, middle) = tokens.split_last().ok_or_else(|| Error::Parse {
        line,
        reason: "resource marker with no opcode".to_string(),
    })?;
    let (&name, numbers) = middle.split_first().ok_or_else(|| Error::Parse {
        line,
        reason: format!("resource opcode {opcode:?} with no resource name"),
    })?;

    let mut operands = vec![Operand::Text(name.to_string(), 0.0)];
    for token in numbers {
        let value = token.parse::<f64>().map_err(|_| Error::Parse {
            line,
            reason: format!("bad numeric operand {token:?} after resource name"),
        })?;
        operands.push(Operand::Number(value));
    }
    Ok(Command::new(opcode, operands))
}

/// One command: operands (in one of the grammar's shapes) then an opcode.
fn command(input: &str) -> IResult<&str, Command> {
    alt((
        bracketed_command,
        numeric_command,
        text_command,
        name_command,
        bare_command,
    ))(input)
}

/// `[` TextArg+ `]` OPCODE — a show-text group with kerning adjustments.
fn bracketed_command(input: &str) -> IResult<&str, Command> {
    let (input, operands) = delimited(
        char('['),
        many1(preceded(multispace0, text_arg)),
        preceded(multispace0, char(']')),
    )(input)?;
    let (input, opcode) = preceded(multispace0, opcode)(input)?;
    Ok((input, Command::new(opcode, operands)))
}

/// Number+ OPCODE — a numeric operator such as `cm`, `re`, or `Td`.
fn numeric_command(input: &str) -> IResult<&str, Command> {
    let (input, numbers) = many1(preceded(multispace0, number))(input)?;
    let (input, opcode) = preceded(multispace0, opcode)(input)?;
    let operands = numbers.into_iter().map(Operand::Number).collect();
    Ok((input, Command::new(opcode, operands)))
}

/// Text OPCODE — a single string operator such as `Tj`.
fn text_command(input: &str) -> IResult<&str, Command> {
    let (input, text) = text_literal(input)?;
    let (input, opcode) = preceded(multispace0, opcode)(input)?;
    Ok((input, Command::new(opcode, vec![Operand::Text(text, 0.0)])))
}

/// Bareword Number+ OPCODE — a resource operand that lost its marker.
fn name_command(input: &str) -> IResult<&str, Command> {
    let (input, name) = bareword(input)?;
    let (input, numbers) = many1(preceded(multispace0, number))(input)?;
    let (input, opcode) = preceded(multispace0, opcode)(input)?;
    let mut operands = vec![Operand::Text(name.to_string(), 0.0)];
    operands.extend(numbers.into_iter().map(Operand::Number));
    Ok((input, Command::new(opcode, operands)))
}

/// A bare OPCODE with no operands, such as `BT` or `T*`.
fn bare_command(input: &str) -> IResult<&str, Command> {
    let (input, opcode) = opcode(input)?;
    Ok((input, Command::new(opcode, Vec::new())))
}

/// Optional kerning number followed by a string literal.
fn text_arg(input: &str) -> IResult<&str, Operand> {
    let (input, kerning) = opt(terminated(number, multispace0))(input)?;
    let (input, text) = text_literal(input)?;
    Ok((input, Operand::Text(text, kerning.unwrap_or(0.0))))
}

/// A string literal in either delimiter form.
fn text_literal(input: &str) -> IResult<&str, String> {
    alt((paren_text, hex_text))(input)
}

fn paren_text(input: &str) -> IResult<&str, String> {
    let (input, body) = delimited(char('('), take_while(|c| c != ')'), char(')'))(input)?;
    Ok((input, decode_escapes(body)))
}

fn hex_text(input: &str) -> IResult<&str, String> {
    let (input, body) = delimited(char('<'), take_while(|c| c != '>'), char('>'))(input)?;
    let digits: Vec<u8> = body
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|c| c.to_digit(16).map(|d| d as u8))
        .collect();
    let text = digits
        .chunks(2)
        .map(|pair| {
            let byte = if pair.len() == 2 {
                pair[0] << 4 | pair[1]
            } else {
                pair[0] << 4 // odd final digit: low nibble is 0
            };
            char::from(byte)
        })
        .collect();
    Ok((input, text))
}

/// An optionally signed, optionally decimal number token.
fn number(input: &str) -> IResult<&str, f64> {
    let (input, token) = recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(tuple((digit1, char('.'), digit0))),
            recognize(pair(char('.'), digit1)),
            recognize(digit1),
        )),
    ))(input)?;
    match token.parse::<f64>() {
        Ok(value) => Ok((input, value)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// An operator name: letters plus the `*`, `'`, `"` opcode characters.
fn opcode(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic() || c == '*' || c == '\'' || c == '"')(input)
}

/// A resource word, e.g. the font key `F4`.
///
/// Must mix letters and digits: a purely alphabetic token is an opcode,
/// not a resource name, and ambiguity between the two would swallow bare
/// operators like `BT` into the name alternative.
fn bareword(input: &str) -> IResult<&str, &str> {
    verify(take_while1(|c: char| c.is_ascii_alphanumeric()), |s: &str| {
        s.contains(|c: char| c.is_ascii_digit()) && s.contains(|c: char| c.is_ascii_alphabetic())
    })(input)
}
