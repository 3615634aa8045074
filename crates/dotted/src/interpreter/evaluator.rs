//! Expression evaluation.
//!
//! Evaluates parsed sources against the document through the engine:
//! references resolve through materializing lookups, calls dispatch to
//! registered resolvers (then builtins), and operators follow the
//! loose-typed semantics of the expression grammar.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::interpreter::engine::Dotted;
use crate::interpreter::error::{EvalError, compute_suggestions};
use crate::interpreter::pronouns::{PronounForm, resolve_pronoun};
use crate::parser::ast::{BinaryOp, Expr, Reference, Segment, StrPart, Template, UnaryOp};
use crate::parser::{Parsed, parse_source};
use crate::types::{Dimension, KeyPath, Value};

/// Builtins callable when no user resolver claims the name.
pub(crate) const BUILTIN_NAMES: &[&str] = &["int", "float", "bool", "json", "fresh"];

/// State threaded through one expression evaluation.
pub(crate) struct EvalCall {
    /// Path of the expression key being evaluated.
    pub expr_path: KeyPath,
    /// Forced re-evaluation: lookups made by this evaluation bypass
    /// materialized values.
    pub fresh: bool,
    /// Set by the fresh() builtin: the result must not be cached or
    /// materialized, so later reads recompute.
    pub no_cache: bool,
}

/// Classify, parse, and evaluate an expression source.
pub(crate) fn eval_source(
    engine: &Dotted,
    call: &mut EvalCall,
    source: &str,
) -> Result<Value, EvalError> {
    let parsed = parse_source(source).map_err(|e| EvalError::Expression {
        path: call.expr_path.to_string(),
        message: e.to_string(),
    })?;
    match parsed {
        Parsed::Literal(text) => Ok(Value::String(text)),
        Parsed::Expression(expr) => eval_expr(engine, call, &expr),
        Parsed::Template(template) => eval_template(engine, call, &template),
    }
}

/// Evaluate a non-computed template: segments concatenate into a string.
fn eval_template(
    engine: &Dotted,
    call: &mut EvalCall,
    template: &Template,
) -> Result<Value, EvalError> {
    let mut out = String::new();
    for segment in &template.segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Interpolation(expr) => out.push_str(&eval_to_display(engine, call, expr)?),
        }
    }
    Ok(Value::String(out))
}

/// Evaluate an expression for string concatenation. Unresolved bare
/// references render as the literal token `undefined` rather than `null`.
fn eval_to_display(engine: &Dotted, call: &mut EvalCall, expr: &Expr) -> Result<String, EvalError> {
    if let Expr::Reference(reference) = expr
        && reference.dots <= 1
    {
        return Ok(match resolve_reference(engine, call, reference)? {
            Some(value) => value.to_string(),
            None => "undefined".to_string(),
        });
    }
    Ok(eval_expr(engine, call, expr)?.to_string())
}

pub(crate) fn eval_expr(
    engine: &Dotted,
    call: &mut EvalCall,
    expr: &Expr,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(x) => Ok(Value::Float(*x)),
        Expr::Str(parts) => eval_string_parts(engine, call, parts),
        Expr::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(eval_expr(engine, call, item)?);
            }
            Ok(Value::List(values))
        }
        Expr::Map(entries) => {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                map.insert(key.clone(), eval_expr(engine, call, value)?);
            }
            Ok(Value::Map(map))
        }
        Expr::Reference(reference) => {
            Ok(resolve_reference(engine, call, reference)?.unwrap_or(Value::Null))
        }
        Expr::Pronoun(name) => eval_pronoun(engine, call, name),
        Expr::Call { name, args } => eval_call(engine, call, name, args),
        Expr::Unary { op, operand } => {
            let value = eval_expr(engine, call, operand)?;
            apply_unary(call, *op, value)
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(engine, call, *op, lhs, rhs),
        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            if eval_expr(engine, call, condition)?.is_truthy() {
                eval_expr(engine, call, then_branch)
            } else {
                eval_expr(engine, call, else_branch)
            }
        }
        Expr::Member { object, field } => {
            let value = eval_expr(engine, call, object)?;
            Ok(member(&value, field))
        }
        Expr::Index { object, index } => {
            let value = eval_expr(engine, call, object)?;
            let key = eval_expr(engine, call, index)?;
            Ok(index_value(&value, &key))
        }
    }
}

/// Evaluate a quoted string literal with embedded markers.
fn eval_string_parts(
    engine: &Dotted,
    call: &mut EvalCall,
    parts: &[StrPart],
) -> Result<Value, EvalError> {
    let mut out = String::new();
    for part in parts {
        match part {
            StrPart::Text(text) => out.push_str(text),
            StrPart::Interpolation(expr) => out.push_str(&eval_to_display(engine, call, expr)?),
        }
    }
    Ok(Value::String(out))
}

/// Resolve a reference token relative to the evaluating expression's node.
///
/// Zero dots: the node itself, then the document root. One dot: walk from
/// the node toward the root, nearest match wins. Two or more dots: climb
/// `dots - 1` ancestors, after which the path must resolve.
pub(crate) fn resolve_reference(
    engine: &Dotted,
    call: &mut EvalCall,
    reference: &Reference,
) -> Result<Option<Value>, EvalError> {
    let fresh = call.fresh;
    resolve_reference_with(engine, call, reference, fresh)
}

pub(crate) fn resolve_reference_with(
    engine: &Dotted,
    call: &mut EvalCall,
    reference: &Reference,
    fresh: bool,
) -> Result<Option<Value>, EvalError> {
    let node = call.expr_path.parent().to_vec();
    match reference.dots {
        0 => {
            if let Some(found) = engine.lookup_at(&node, &reference.segments, fresh)? {
                Ok(Some(found))
            } else if node.is_empty() {
                Ok(None)
            } else {
                engine.lookup_at(&[], &reference.segments, fresh)
            }
        }
        1 => {
            for depth in (0..=node.len()).rev() {
                if let Some(found) = engine.lookup_at(&node[..depth], &reference.segments, fresh)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        }
        dots => {
            let ups = dots - 1;
            if ups > node.len() {
                return Err(EvalError::ParentOutOfBounds {
                    token: reference.token(),
                    path: call.expr_path.to_string(),
                });
            }
            let base = &node[..node.len() - ups];
            match engine.lookup_at(base, &reference.segments, fresh)? {
                Some(found) => Ok(Some(found)),
                None => Err(EvalError::UnresolvedReference {
                    token: reference.token(),
                    path: call.expr_path.to_string(),
                }),
            }
        }
    }
}

/// Resolve a `:form` placeholder against the ambient gender and language.
fn eval_pronoun(engine: &Dotted, call: &mut EvalCall, name: &str) -> Result<Value, EvalError> {
    let Some(form) = PronounForm::parse(name) else {
        return Err(expression_error(
            call,
            format!("unknown pronoun form ':{name}'"),
        ));
    };
    let node = call.expr_path.parent();
    let gender = engine
        .dimension(node, &Dimension::Gender)
        .unwrap_or_else(|| "x".to_string());
    let lang = engine
        .dimension(node, &Dimension::Lang)
        .unwrap_or_else(|| "en".to_string());
    Ok(Value::String(
        resolve_pronoun(form, &gender, &lang).to_string(),
    ))
}

/// Dispatch a call: user resolvers first, then builtins, else an unknown
/// resolver error with spelling suggestions.
fn eval_call(
    engine: &Dotted,
    call: &mut EvalCall,
    name: &str,
    args: &[Expr],
) -> Result<Value, EvalError> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval_expr(engine, call, arg)?);
    }
    if let Some(output) = engine.call_resolver(name, &values)? {
        return Ok(output);
    }
    match name {
        "int" => builtin_int(call, &values),
        "float" => builtin_float(call, &values),
        "bool" => builtin_bool(call, &values),
        "json" => builtin_json(call, &values),
        "fresh" => builtin_fresh(engine, call, &values),
        _ => {
            let mut available = engine.resolver_names();
            available.extend(BUILTIN_NAMES.iter().copied().map(str::to_string));
            Err(EvalError::UnknownResolver {
                name: name.to_string(),
                suggestions: compute_suggestions(name, available),
            })
        }
    }
}

fn expression_error(call: &EvalCall, message: impl Into<String>) -> EvalError {
    EvalError::Expression {
        path: call.expr_path.to_string(),
        message: message.into(),
    }
}

fn single_arg<'a>(call: &EvalCall, name: &str, args: &'a [Value]) -> Result<&'a Value, EvalError> {
    match args {
        [value] => Ok(value),
        _ => Err(expression_error(
            call,
            format!("{name}() expects exactly one argument, got {}", args.len()),
        )),
    }
}

fn builtin_int(call: &EvalCall, args: &[Value]) -> Result<Value, EvalError> {
    let value = single_arg(call, "int", args)?;
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(x) => Ok(Value::Int(*x as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                Ok(Value::Int(n))
            } else if let Ok(x) = trimmed.parse::<f64>() {
                Ok(Value::Int(x as i64))
            } else {
                Err(expression_error(call, format!("int() cannot convert '{s}'")))
            }
        }
        other => Err(expression_error(
            call,
            format!("int() cannot convert {}", other.type_name()),
        )),
    }
}

fn builtin_float(call: &EvalCall, args: &[Value]) -> Result<Value, EvalError> {
    let value = single_arg(call, "float", args)?;
    match value {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            expression_error(call, format!("float() cannot convert '{s}'"))
        }),
        other => Err(expression_error(
            call,
            format!("float() cannot convert {}", other.type_name()),
        )),
    }
}

fn builtin_bool(call: &EvalCall, args: &[Value]) -> Result<Value, EvalError> {
    let value = single_arg(call, "bool", args)?;
    Ok(Value::Bool(value.is_truthy()))
}

fn builtin_json(call: &EvalCall, args: &[Value]) -> Result<Value, EvalError> {
    let value = single_arg(call, "json", args)?;
    let Some(source) = value.as_str() else {
        return Err(expression_error(
            call,
            format!("json() expects a string, got {}", value.type_name()),
        ));
    };
    serde_json::from_str::<serde_json::Value>(source)
        .map(Value::from)
        .map_err(|e| expression_error(call, format!("json() parse failed: {e}")))
}

/// fresh(path) re-reads a reference, bypassing materialized values, and
/// marks this evaluation uncacheable so every read recomputes.
fn builtin_fresh(engine: &Dotted, call: &mut EvalCall, args: &[Value]) -> Result<Value, EvalError> {
    let token = {
        let value = single_arg(call, "fresh", args)?;
        let Some(token) = value.as_str() else {
            return Err(expression_error(
                call,
                format!("fresh() expects a path string, got {}", value.type_name()),
            ));
        };
        token.to_string()
    };
    call.no_cache = true;
    let reference = parse_reference_token(&token);
    Ok(resolve_reference_with(engine, call, &reference, true)?.unwrap_or(Value::Null))
}

fn parse_reference_token(token: &str) -> Reference {
    let dots = token.chars().take_while(|ch| *ch == '.').count();
    let segments = token[dots..]
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Reference { dots, segments }
}

fn apply_unary(call: &EvalCall, op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| expression_error(call, "integer overflow in negation")),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(expression_error(
                call,
                format!("cannot negate {}", other.type_name()),
            )),
        },
    }
}

fn eval_binary(
    engine: &Dotted,
    call: &mut EvalCall,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<Value, EvalError> {
    match op {
        // && and || return one of their operands, not a coerced boolean.
        BinaryOp::And => {
            let left = eval_expr(engine, call, lhs)?;
            if left.is_truthy() {
                eval_expr(engine, call, rhs)
            } else {
                Ok(left)
            }
        }
        BinaryOp::Or => {
            let left = eval_expr(engine, call, lhs)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                eval_expr(engine, call, rhs)
            }
        }
        BinaryOp::Eq => {
            let (left, right) = eval_pair(engine, call, lhs, rhs)?;
            Ok(Value::Bool(left.loose_eq(&right)))
        }
        BinaryOp::Ne => {
            let (left, right) = eval_pair(engine, call, lhs, rhs)?;
            Ok(Value::Bool(!left.loose_eq(&right)))
        }
        BinaryOp::Lt => compare(engine, call, lhs, rhs, Ordering::is_lt, "<"),
        BinaryOp::Le => compare(engine, call, lhs, rhs, Ordering::is_le, "<="),
        BinaryOp::Gt => compare(engine, call, lhs, rhs, Ordering::is_gt, ">"),
        BinaryOp::Ge => compare(engine, call, lhs, rhs, Ordering::is_ge, ">="),
        BinaryOp::Add => {
            let (left, right) = eval_pair(engine, call, lhs, rhs)?;
            add(call, left, right)
        }
        BinaryOp::Sub => {
            let (left, right) = eval_pair(engine, call, lhs, rhs)?;
            numeric_op(call, "-", left, right, i64::checked_sub, |a, b| a - b)
        }
        BinaryOp::Mul => {
            let (left, right) = eval_pair(engine, call, lhs, rhs)?;
            numeric_op(call, "*", left, right, i64::checked_mul, |a, b| a * b)
        }
        BinaryOp::Div => {
            let (left, right) = eval_pair(engine, call, lhs, rhs)?;
            divide(call, &left, &right)
        }
        BinaryOp::Rem => {
            let (left, right) = eval_pair(engine, call, lhs, rhs)?;
            numeric_op(call, "%", left, right, i64::checked_rem, |a, b| a % b)
        }
    }
}

fn eval_pair(
    engine: &Dotted,
    call: &mut EvalCall,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<(Value, Value), EvalError> {
    let left = eval_expr(engine, call, lhs)?;
    let right = eval_expr(engine, call, rhs)?;
    Ok((left, right))
}

/// `+` concatenates when either operand is a string, joins lists, and adds
/// numbers with checked integer arithmetic.
fn add(call: &EvalCall, left: Value, right: Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| expression_error(call, "integer overflow in '+'")),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (Value::String(a), b) => Ok(Value::String(format!("{a}{b}"))),
        (a, Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (a, b) => Err(expression_error(
            call,
            format!("cannot apply '+' to {} and {}", a.type_name(), b.type_name()),
        )),
    }
}

fn numeric_op(
    call: &EvalCall,
    symbol: &str,
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b).map(Value::Int).ok_or_else(|| {
            if symbol == "%" && *b == 0 {
                expression_error(call, "modulo by zero")
            } else {
                expression_error(call, format!("integer overflow in '{symbol}'"))
            }
        }),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(expression_error(
                call,
                format!(
                    "cannot apply '{symbol}' to {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
            )),
        },
    }
}

/// `/` always produces a float, so integer division never truncates.
fn divide(call: &EvalCall, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => {
            if b == 0.0 {
                Err(expression_error(call, "division by zero"))
            } else {
                Ok(Value::Float(a / b))
            }
        }
        _ => Err(expression_error(
            call,
            format!(
                "cannot apply '/' to {} and {}",
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

fn compare(
    engine: &Dotted,
    call: &mut EvalCall,
    lhs: &Expr,
    rhs: &Expr,
    test: fn(Ordering) -> bool,
    symbol: &str,
) -> Result<Value, EvalError> {
    let left = eval_expr(engine, call, lhs)?;
    let right = eval_expr(engine, call, rhs)?;
    let ordering = match (&left, &right) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => {
            let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
                return Err(expression_error(
                    call,
                    format!(
                        "cannot apply '{symbol}' to {} and {}",
                        left.type_name(),
                        right.type_name()
                    ),
                ));
            };
            a.partial_cmp(&b)
                .ok_or_else(|| expression_error(call, "cannot compare NaN"))?
        }
    };
    Ok(Value::Bool(test(ordering)))
}

/// Field access on an evaluated value. Missing fields and access on null
/// produce null rather than an error. Lists and strings expose `length`.
fn member(value: &Value, field: &str) -> Value {
    match value {
        Value::Map(entries) => entries.get(field).cloned().unwrap_or(Value::Null),
        Value::List(items) if field == "length" => Value::Int(items.len() as i64),
        Value::String(s) if field == "length" => Value::Int(s.chars().count() as i64),
        _ => Value::Null,
    }
}

fn index_value(value: &Value, index: &Value) -> Value {
    match (value, index) {
        (Value::List(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null),
        (Value::Map(entries), Value::String(key)) => {
            entries.get(key).cloned().unwrap_or(Value::Null)
        }
        (Value::String(s), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|ch| Value::String(ch.to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
