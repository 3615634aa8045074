//! Scoped views: the engine's surface re-rooted at a prefix.

use std::fmt;

use crate::interpreter::engine::{Dotted, GetOptions, HasOptions, SetOptions};
use crate::interpreter::error::EvalError;
use crate::types::{KeyPath, Value};

/// A view of the document rooted at a prefix.
///
/// Every operation addresses the shared engine through the prefix, so
/// relative references and ambient context behave exactly as they do for
/// the full path. Views borrow the engine and are cheap to create.
#[derive(Clone)]
pub struct Scoped<'a> {
    engine: &'a Dotted,
    prefix: KeyPath,
}

impl<'a> Scoped<'a> {
    pub(crate) fn new(engine: &'a Dotted, prefix: KeyPath) -> Self {
        Scoped { engine, prefix }
    }

    /// The absolute path this view is rooted at.
    pub fn root(&self) -> String {
        self.prefix.to_string()
    }

    /// Read a value relative to the prefix. The empty path reads the
    /// prefix node itself.
    pub fn get(&self, path: &str) -> Result<Value, EvalError> {
        self.get_with(path, GetOptions::default())
    }

    pub fn get_with(&self, path: &str, options: GetOptions) -> Result<Value, EvalError> {
        self.engine.get_at(&self.absolute(path), &options)
    }

    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<(), EvalError> {
        self.set_with(path, value, SetOptions::default())
    }

    pub fn set_with(
        &self,
        path: &str,
        value: impl Into<Value>,
        _options: SetOptions,
    ) -> Result<(), EvalError> {
        self.engine.set_at(&self.absolute(path), value.into())
    }

    pub fn has(&self, path: &str) -> bool {
        self.has_with(path, HasOptions::default())
    }

    pub fn has_with(&self, path: &str, options: HasOptions) -> bool {
        self.engine.has_at(&self.absolute(path), options)
    }

    pub fn delete(&self, path: &str) -> Result<(), EvalError> {
        self.engine.delete_at(&self.absolute(path))
    }

    /// Keys of the map at a relative path; the prefix node for "".
    pub fn keys(&self, path: &str) -> Vec<String> {
        self.engine.keys_at(&self.absolute(path))
    }

    /// A view nested further under this one.
    pub fn scope(&self, path: &str) -> Scoped<'a> {
        Scoped::new(self.engine, self.absolute(path))
    }

    fn absolute(&self, path: &str) -> KeyPath {
        let relative = KeyPath::parse(path);
        if relative.is_empty() {
            self.prefix.clone()
        } else {
            self.prefix.join(&relative)
        }
    }
}

impl fmt::Debug for Scoped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
