//! Validation hooks for values crossing the engine boundary.

use crate::interpreter::error::EvalError;
use crate::types::Value;

/// Validates values as they cross the engine boundary.
///
/// [`validate`](Validator::validate) runs on every successful read and may
/// normalize the value or reject it with [`EvalError::Validation`].
/// [`validate_resolver`](Validator::validate_resolver) runs on resolver
/// outputs before the value flows back into the expression.
pub trait Validator {
    /// Check, and possibly rewrite, a value produced for `path`.
    fn validate(&self, path: &str, value: &Value) -> Result<Value, EvalError>;

    /// Check a resolver's output. The default accepts it unchanged.
    fn validate_resolver(
        &self,
        name: &str,
        args: &[Value],
        output: &Value,
    ) -> Result<Value, EvalError> {
        let _ = (name, args);
        Ok(output.clone())
    }
}
