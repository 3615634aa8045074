//! Core data types: document values, paths, and variant-suffixed keys.

mod path;
mod value;
mod variant;

pub use path::{KeyPath, is_expression_key, leading_dots, materialized_key};
pub use value::Value;
pub use variant::{Dimension, FORMALITY_LEVELS, GENDER_TOKENS, VariantKey};
