//! Evaluation: the engine, expression evaluator, and their support
//! machinery (ambient context, variant scoring, resolvers, pronouns).

pub mod context;
pub mod engine;
pub mod error;
mod evaluator;
pub mod pronouns;
pub mod registry;
pub mod scoped;
pub mod variants;

pub use context::AmbientContext;
pub use engine::{
    Dotted, ErrorDirective, ErrorHandler, Fallback, GetOptions, HasOptions, RESERVED_NAMES,
    SetOptions,
};
pub use error::{EvalError, compute_suggestions};
pub use pronouns::{PronounForm, resolve_pronoun};
pub use registry::{ResolverFn, Resolvers};
pub use scoped::Scoped;
