//! Storage bridges: loading and saving whole documents outside the
//! engine.
//!
//! The engine itself never touches storage. A [`Loader`] implementation
//! bridges it to files, databases, or services; callers load a document,
//! build a [`Dotted`](crate::Dotted) engine over it, and save the result
//! of [`document()`](crate::Dotted::document) back.

use std::error::Error;

use crate::interpreter::context::AmbientContext;
use crate::types::Value;

/// Errors surfaced by storage backends.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Metadata describing a stored document.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Stored name without any variant suffix.
    pub base_name: String,
    /// Dimension values parsed from the stored name's suffix.
    pub context: AmbientContext,
}

impl DocumentInfo {
    /// Parse a stored name of the form `base:token:token`, classifying
    /// the suffix tokens the same way key variants are classified.
    pub fn from_name(name: &str) -> Self {
        let mut parts = name.split(':');
        let base_name = parts.next().unwrap_or_default().to_string();
        DocumentInfo {
            base_name,
            context: AmbientContext::from_tokens(parts),
        }
    }
}

/// Options for [`Loader::save`].
#[derive(Debug, Clone, Copy, Default, bon::Builder)]
pub struct SaveOptions {
    /// Replace an existing document of the same name.
    #[builder(default)]
    pub overwrite: bool,
}

/// An active change subscription. Dropping the box without calling
/// [`unsubscribe`](Subscription::unsubscribe) leaves the watch running.
pub trait Subscription {
    fn unsubscribe(self: Box<Self>);
}

/// A storage backend for whole documents.
pub trait Loader {
    /// Load a document by name.
    fn load(&self, name: &str) -> Result<Value, BoxError>;

    /// Store a document under a name.
    fn save(&self, name: &str, document: &Value, options: SaveOptions) -> Result<(), BoxError>;

    /// Names and contexts of the stored documents.
    fn list(&self) -> Result<Vec<DocumentInfo>, BoxError>;

    /// Remove a stored document. A missing document is not an error.
    fn delete(&self, name: &str) -> Result<(), BoxError>;

    /// Watch a document for external changes. Backends without a change
    /// feed return `None`.
    fn subscribe(
        &self,
        name: &str,
        callback: Box<dyn Fn(&Value) + Send>,
    ) -> Option<Box<dyn Subscription>> {
        let _ = (name, callback);
        None
    }

    /// Release backend resources.
    fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
