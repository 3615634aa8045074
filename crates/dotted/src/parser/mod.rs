//! Parsers for expression sources: classification, templates, and the
//! closed expression grammar.

pub mod ast;
pub mod error;
pub mod expr;
pub mod template;

pub use ast::{BinaryOp, Expr, Reference, Segment, StrPart, Template, UnaryOp};
pub use error::ParseError;
pub use expr::parse_expression;
pub use template::{classify, parse_source, parse_template};

/// The shape of an expression source, decided before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain text with no markers, structure, or call syntax. Returned
    /// verbatim without evaluation.
    Literal,
    /// Contains at least one `${...}` marker.
    Template,
    /// Starts with `[`, `{`, `"`, or `'`: a list, map, or string literal.
    Structured,
    /// Contains call syntax such as `fetchUser(id)`.
    Call,
}

/// A classified and parsed source, ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Plain text, used as the value directly.
    Literal(String),
    /// A template evaluated segment by segment.
    Template(Template),
    /// A single expression evaluated to a typed value.
    Expression(Expr),
}
