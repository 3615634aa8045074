//! Error types for document evaluation.

use thiserror::Error;

/// An error that occurred while resolving or evaluating document keys.
#[derive(Debug, Error)]
pub enum EvalError {
    /// An expression chain referenced itself.
    #[error("circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// Nested evaluation exceeded the configured depth limit.
    #[error("maximum evaluation depth {max} exceeded")]
    DepthExceeded { max: usize },

    /// A multi-dot reference climbed past the document root.
    #[error("reference '{token}' at '{path}' goes beyond the document root")]
    ParentOutOfBounds { token: String, path: String },

    /// A multi-dot reference addressed a path that does not exist.
    #[error("unresolved reference '{token}' at '{path}'")]
    UnresolvedReference { token: String, path: String },

    /// An expression failed to parse or evaluate.
    #[error("expression at '{path}' failed: {message}")]
    Expression { path: String, message: String },

    /// A call named a resolver that is not registered.
    #[error("unknown resolver '{name}'{}", format_suggestions(.suggestions))]
    UnknownResolver {
        name: String,
        suggestions: Vec<String>,
    },

    /// An attempt to set a key whose name is reserved for engine
    /// operations.
    #[error("cannot set reserved key '{key}'")]
    ReservedKey { key: String },

    /// A validation hook rejected a value.
    #[error("validation failed at '{path}': {message}")]
    Validation { path: String, message: String },
}

/// Suggest close matches for a misspelled name, nearest first, up to three.
pub fn compute_suggestions<I>(name: &str, available: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let max_distance = if name.len() <= 3 { 1 } else { 2 };
    let mut scored: Vec<(usize, String)> = available
        .into_iter()
        .map(|candidate| (strsim::levenshtein(name, &candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(3)
        .map(|(_, candidate)| candidate)
        .collect()
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(", did you mean: {}?", suggestions.join(", "))
    }
}
