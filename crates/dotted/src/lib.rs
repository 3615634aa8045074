pub mod interpreter;
pub mod loader;
pub mod parser;
pub mod types;
pub mod validate;

pub use interpreter::{
    AmbientContext, Dotted, ErrorDirective, ErrorHandler, EvalError, Fallback, GetOptions,
    HasOptions, PronounForm, RESERVED_NAMES, ResolverFn, Resolvers, Scoped, SetOptions,
    compute_suggestions, resolve_pronoun,
};
pub use loader::{BoxError, DocumentInfo, Loader, SaveOptions, Subscription};
pub use parser::ParseError;
pub use types::{Dimension, KeyPath, Value, VariantKey};
pub use validate::Validator;

// json!-compatible construction, re-exported for the doc! macro.
#[doc(hidden)]
pub use serde_json as __serde_json;

/// Creates a [`Value`] from JSON syntax.
///
/// Accepts exactly what `serde_json::json!` accepts, including expression
/// interpolation, and converts the result into a [`Value`] tree.
///
/// # Example
///
/// ```
/// use dotted::{Value, doc};
///
/// let d = doc!({ "name": "Alice", "count": 3 });
/// assert_eq!(d.get("count"), Some(&Value::Int(3)));
/// assert_eq!(d.get("name").and_then(Value::as_str), Some("Alice"));
/// ```
#[macro_export]
macro_rules! doc {
    ($($tt:tt)*) => {
        $crate::Value::from($crate::__serde_json::json!($($tt)*))
    };
}
