//! Expression parser using winnow.
//!
//! Parses the closed expression grammar used inside `${...}` markers and in
//! computed sources. Precedence, loosest first: ternary, `||`, `&&`,
//! equality, relational, additive, multiplicative, unary, postfix access.
//!
//! References are tight dotted chains (`.user.name`, `...company`), calls
//! are flat names (`fetchUser(id)`), and `${...}` may nest inside string
//! literals.

use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated, terminated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use super::ast::{BinaryOp, Expr, Reference, StrPart, UnaryOp};
use super::error::ParseError;

/// Parse a complete source as one expression. The whole input must be
/// consumed, modulo surrounding whitespace.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let mut remaining = input;
    match delimited(ws, expression, ws).parse_next(&mut remaining) {
        Ok(expr) => {
            if remaining.is_empty() {
                Ok(expr)
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

/// Calculate line and column from original input and remaining input.
pub(super) fn calculate_position(original: &str, remaining: &str) -> (usize, usize) {
    let consumed = original.len() - remaining.len();
    let consumed_str = &original[..consumed];
    let line = consumed_str.chars().filter(|&c| c == '\n').count() + 1;
    let last_newline = consumed_str.rfind('\n');
    let column = match last_newline {
        Some(pos) => consumed - pos,
        None => consumed + 1,
    };
    (line, column)
}

/// Map a winnow failure to a [`ParseError`] at the failure position.
pub(super) fn syntax_error(
    original: &str,
    remaining: &str,
    err: &ErrMode<ContextError>,
) -> ParseError {
    let (line, column) = calculate_position(original, remaining);
    if remaining.is_empty() {
        ParseError::UnexpectedEof { line, column }
    } else {
        ParseError::Syntax {
            line,
            column,
            message: format!("parse error: {err}"),
        }
    }
}

/// Parse a full expression, ternary and below.
pub(super) fn expression(input: &mut &str) -> ModalResult<Expr> {
    let condition = or_expr(input)?;
    let branches: Option<(Expr, Expr)> = opt((
        preceded((ws, '?', ws), expression),
        preceded((ws, ':', ws), expression),
    ))
    .parse_next(input)?;
    Ok(match branches {
        Some((then_branch, else_branch)) => Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
        None => condition,
    })
}

/// Parse a `${ expression }` marker. Once the opening token is seen the
/// marker must complete, so failures inside are hard errors.
pub(super) fn marker(input: &mut &str) -> ModalResult<Expr> {
    preceded(
        "${",
        cut_err(terminated(delimited(ws, expression, ws), '}')),
    )
    .parse_next(input)
}

/// Parse optional whitespace.
pub(super) fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

/// Left-associative chain of one precedence level.
fn binary_chain(
    input: &mut &str,
    operand: fn(&mut &str) -> ModalResult<Expr>,
    op: fn(&mut &str) -> ModalResult<BinaryOp>,
) -> ModalResult<Expr> {
    let mut lhs = operand(input)?;
    loop {
        let parsed: Option<(BinaryOp, Expr)> =
            opt((delimited(ws, op, ws), operand)).parse_next(input)?;
        match parsed {
            Some((op, rhs)) => lhs = Expr::binary(op, lhs, rhs),
            None => return Ok(lhs),
        }
    }
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    binary_chain(input, and_expr, or_op)
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    binary_chain(input, equality, and_op)
}

fn equality(input: &mut &str) -> ModalResult<Expr> {
    binary_chain(input, relational, equality_op)
}

fn relational(input: &mut &str) -> ModalResult<Expr> {
    binary_chain(input, additive, relational_op)
}

fn additive(input: &mut &str) -> ModalResult<Expr> {
    binary_chain(input, multiplicative, additive_op)
}

fn multiplicative(input: &mut &str) -> ModalResult<Expr> {
    binary_chain(input, unary, multiplicative_op)
}

fn or_op(input: &mut &str) -> ModalResult<BinaryOp> {
    "||".value(BinaryOp::Or).parse_next(input)
}

fn and_op(input: &mut &str) -> ModalResult<BinaryOp> {
    "&&".value(BinaryOp::And).parse_next(input)
}

fn equality_op(input: &mut &str) -> ModalResult<BinaryOp> {
    alt(("==".value(BinaryOp::Eq), "!=".value(BinaryOp::Ne))).parse_next(input)
}

fn relational_op(input: &mut &str) -> ModalResult<BinaryOp> {
    alt((
        "<=".value(BinaryOp::Le),
        ">=".value(BinaryOp::Ge),
        '<'.value(BinaryOp::Lt),
        '>'.value(BinaryOp::Gt),
    ))
    .parse_next(input)
}

fn additive_op(input: &mut &str) -> ModalResult<BinaryOp> {
    alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))).parse_next(input)
}

fn multiplicative_op(input: &mut &str) -> ModalResult<BinaryOp> {
    alt((
        '*'.value(BinaryOp::Mul),
        '/'.value(BinaryOp::Div),
        '%'.value(BinaryOp::Rem),
    ))
    .parse_next(input)
}

/// Parse a unary expression: `!` or `-` prefixes, then postfix access.
fn unary(input: &mut &str) -> ModalResult<Expr> {
    let op: Option<char> = opt(terminated(one_of(['!', '-']), ws)).parse_next(input)?;
    match op {
        Some(ch) => {
            let operand = unary(input)?;
            let op = if ch == '!' { UnaryOp::Not } else { UnaryOp::Neg };
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            })
        }
        None => postfix(input),
    }
}

/// Parse postfix access: `.field` and `[index]` chains after a primary.
fn postfix(input: &mut &str) -> ModalResult<Expr> {
    let mut expr = primary(input)?;
    loop {
        let field: Option<&str> = opt(preceded((ws, '.', ws), path_ident)).parse_next(input)?;
        if let Some(field) = field {
            expr = Expr::Member {
                object: Box::new(expr),
                field: field.to_string(),
            };
            continue;
        }
        let index: Option<Expr> =
            opt(delimited((ws, '[', ws), expression, (ws, ']'))).parse_next(input)?;
        match index {
            Some(index) => {
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            }
            None => return Ok(expr),
        }
    }
}

fn primary(input: &mut &str) -> ModalResult<Expr> {
    alt((
        marker,
        group,
        string_literal,
        number,
        list_literal,
        map_literal,
        pronoun,
        name_expr,
    ))
    .parse_next(input)
}

fn group(input: &mut &str) -> ModalResult<Expr> {
    delimited(('(', ws), expression, (ws, ')')).parse_next(input)
}

/// Parse a quoted string literal, with escapes and embedded `${...}`
/// markers. Both quote styles are accepted.
fn string_literal(input: &mut &str) -> ModalResult<Expr> {
    let quote: char = one_of(['"', '\'']).parse_next(input)?;
    let mut parts = Vec::new();
    let mut text = String::new();
    loop {
        if input.starts_with("${") {
            if !text.is_empty() {
                parts.push(StrPart::Text(std::mem::take(&mut text)));
            }
            let expr = marker(input)?;
            parts.push(StrPart::Interpolation(expr));
            continue;
        }
        // Past the opening quote the literal must terminate, so running out
        // of input is a hard error.
        let Some(ch) = input.chars().next() else {
            return Err(ErrMode::Cut(ContextError::new()));
        };
        *input = &input[ch.len_utf8()..];
        if ch == quote {
            break;
        }
        if ch == '\\' {
            let Some(escaped) = input.chars().next() else {
                return Err(ErrMode::Cut(ContextError::new()));
            };
            *input = &input[escaped.len_utf8()..];
            text.push(unescape(escaped));
        } else {
            text.push(ch);
        }
    }
    if !text.is_empty() || parts.is_empty() {
        parts.push(StrPart::Text(text));
    }
    Ok(Expr::Str(parts))
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

fn number(input: &mut &str) -> ModalResult<Expr> {
    let int_part: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let frac_part: Option<&str> =
        opt(preceded('.', take_while(1.., |c: char| c.is_ascii_digit()))).parse_next(input)?;
    let exp_part: Option<(char, Option<char>, &str)> = opt((
        one_of(['e', 'E']),
        opt(one_of(['+', '-'])),
        take_while(1.., |c: char| c.is_ascii_digit()),
    ))
    .parse_next(input)?;

    if frac_part.is_none() && exp_part.is_none() {
        // Integer literals beyond i64 range fall through to float.
        if let Ok(n) = int_part.parse::<i64>() {
            return Ok(Expr::Int(n));
        }
    }
    let mut text = int_part.to_string();
    if let Some(frac) = frac_part {
        text.push('.');
        text.push_str(frac);
    }
    if let Some((e, sign, digits)) = exp_part {
        text.push(e);
        if let Some(sign) = sign {
            text.push(sign);
        }
        text.push_str(digits);
    }
    text.parse::<f64>()
        .map(Expr::Float)
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

fn list_literal(input: &mut &str) -> ModalResult<Expr> {
    let items: Vec<Expr> = delimited(
        ('[', ws),
        separated(0.., expression, (ws, ',', ws)),
        (ws, opt((',', ws)), ']'),
    )
    .parse_next(input)?;
    Ok(Expr::List(items))
}

fn map_literal(input: &mut &str) -> ModalResult<Expr> {
    let entries: Vec<(String, Expr)> = delimited(
        ('{', ws),
        separated(0.., map_entry, (ws, ',', ws)),
        (ws, opt((',', ws)), '}'),
    )
    .parse_next(input)?;
    Ok(Expr::Map(entries))
}

fn map_entry(input: &mut &str) -> ModalResult<(String, Expr)> {
    let key = alt((identifier.map(str::to_string), quoted_key)).parse_next(input)?;
    let value = preceded((ws, ':', ws), expression).parse_next(input)?;
    Ok((key, value))
}

/// Parse a quoted map key. Keys do not interpolate.
fn quoted_key(input: &mut &str) -> ModalResult<String> {
    let quote: char = one_of(['"', '\'']).parse_next(input)?;
    let mut key = String::new();
    loop {
        let ch: char = any.parse_next(input)?;
        if ch == quote {
            return Ok(key);
        }
        if ch == '\\' {
            let escaped: char = any.parse_next(input)?;
            key.push(unescape(escaped));
        } else {
            key.push(ch);
        }
    }
}

fn pronoun(input: &mut &str) -> ModalResult<Expr> {
    preceded(':', identifier)
        .map(|name| Expr::Pronoun(name.to_string()))
        .parse_next(input)
}

/// Parse a reference, call, or keyword literal. All four begin with dots or
/// an identifier, so they share one entry point.
fn name_expr(input: &mut &str) -> ModalResult<Expr> {
    let dots: &str = take_while(0.., |c: char| c == '.').parse_next(input)?;
    let dots = dots.len();

    if dots == 0 {
        let name: &str = identifier.parse_next(input)?;
        match name {
            "null" => return Ok(Expr::Null),
            "true" => return Ok(Expr::Bool(true)),
            "false" => return Ok(Expr::Bool(false)),
            _ => {}
        }
        let name = name.to_string();
        let args: Option<Vec<Expr>> = opt(preceded(ws, call_args)).parse_next(input)?;
        if let Some(args) = args {
            return Ok(Expr::Call { name, args });
        }
        let mut segments = vec![name];
        collect_path_tail(input, &mut segments)?;
        return Ok(Expr::Reference(Reference { dots: 0, segments }));
    }

    // Dotted references allow digit segments throughout, for list indices.
    let first: &str = path_ident.parse_next(input)?;
    let mut segments = vec![first.to_string()];
    collect_path_tail(input, &mut segments)?;
    Ok(Expr::Reference(Reference { dots, segments }))
}

/// Collect the tight `.segment` continuation of a reference chain.
fn collect_path_tail(input: &mut &str, segments: &mut Vec<String>) -> ModalResult<()> {
    let tail: Vec<&str> = repeat(0.., preceded('.', path_ident)).parse_next(input)?;
    segments.extend(tail.into_iter().map(str::to_string));
    Ok(())
}

fn call_args(input: &mut &str) -> ModalResult<Vec<Expr>> {
    delimited(
        ('(', ws),
        separated(0.., expression, (ws, ',', ws)),
        (ws, ')'),
    )
    .parse_next(input)
}

/// Parse an identifier: a letter or underscore, then letters, digits, and
/// underscores.
fn identifier<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_cont),
    )
        .take()
        .parse_next(input)
}

/// Parse a path segment: like an identifier, but pure digits are also
/// allowed so references can address list elements.
fn path_ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., is_ident_cont).parse_next(input)
}

fn is_ident_cont(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
