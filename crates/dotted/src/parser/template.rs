//! Source classification and template parsing.
//!
//! Every string stored under an expression key is classified before
//! evaluation: plain text stays literal, structured sources and call
//! sources parse as a single expression, and sources containing `${...}`
//! markers parse as templates. A template whose entire source parses as
//! one expression is computed and yields a typed value; any other template
//! concatenates its segments into a string. `$$` renders a literal `$`.

use winnow::combinator::{alt, repeat};
use winnow::prelude::*;
use winnow::token::any;

use super::ast::{Segment, Template};
use super::error::ParseError;
use super::expr::{calculate_position, marker, parse_expression, syntax_error};
use super::{Parsed, SourceKind};

/// Classify an expression source by shape.
pub fn classify(source: &str) -> SourceKind {
    if source.contains("${") {
        return SourceKind::Template;
    }
    if matches!(
        source.trim_start().chars().next(),
        Some('[' | '{' | '"' | '\'')
    ) {
        return SourceKind::Structured;
    }
    if contains_call_syntax(source) {
        return SourceKind::Call;
    }
    SourceKind::Literal
}

/// Whether the source contains an identifier immediately followed by an
/// opening parenthesis.
fn contains_call_syntax(source: &str) -> bool {
    let mut prev: Option<char> = None;
    for ch in source.chars() {
        if ch == '(' && prev.is_some_and(|p| p.is_ascii_alphanumeric() || p == '_') {
            return true;
        }
        prev = Some(ch);
    }
    false
}

/// Classify and parse a source into its evaluatable form.
pub fn parse_source(source: &str) -> Result<Parsed, ParseError> {
    match classify(source) {
        SourceKind::Literal => Ok(Parsed::Literal(source.to_string())),
        SourceKind::Structured | SourceKind::Call => {
            parse_expression(source).map(Parsed::Expression)
        }
        SourceKind::Template => {
            // Computed template: the whole source, modulo surrounding
            // whitespace, is one expression and yields its typed value.
            if let Ok(expr) = parse_expression(source) {
                return Ok(Parsed::Expression(expr));
            }
            parse_template(source).map(Parsed::Template)
        }
    }
}

/// Parse a template string into segments.
pub fn parse_template(input: &str) -> Result<Template, ParseError> {
    let mut remaining = input;
    match template(&mut remaining) {
        Ok(t) => {
            if remaining.is_empty() {
                Ok(t)
            } else {
                let (line, column) = calculate_position(input, remaining);
                Err(ParseError::Syntax {
                    line,
                    column,
                    message: format!(
                        "unexpected character: '{}'",
                        remaining.chars().next().unwrap_or('?')
                    ),
                })
            }
        }
        Err(e) => Err(syntax_error(input, remaining, &e)),
    }
}

/// Parse a complete template into segments.
fn template(input: &mut &str) -> ModalResult<Template> {
    let segments: Vec<Segment> = repeat(0.., segment).parse_next(input)?;
    Ok(Template {
        segments: merge_literals(segments),
    })
}

/// Parse a single segment (escape, marker, or literal character).
fn segment(input: &mut &str) -> ModalResult<Segment> {
    alt((
        "$$".value(Segment::Literal("$".to_string())),
        marker.map(Segment::Interpolation),
        literal_char,
    ))
    .parse_next(input)
}

fn literal_char(input: &mut &str) -> ModalResult<Segment> {
    any.map(|c: char| Segment::Literal(c.to_string()))
        .parse_next(input)
}

/// Merge adjacent Literal segments into single segments.
fn merge_literals(segments: Vec<Segment>) -> Vec<Segment> {
    let mut result = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Literal(text) => {
                if let Some(Segment::Literal(prev)) = result.last_mut() {
                    prev.push_str(&text);
                } else {
                    result.push(Segment::Literal(text));
                }
            }
            other => result.push(other),
        }
    }
    result
}
