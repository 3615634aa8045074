//! Document tree navigation and ambient dimension context.
//!
//! Ambient context comes from the document itself: properties named
//! `lang`, `gender`, and `form` (and self-naming custom flags) on a node or
//! any of its ancestors. The nearest definition wins.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Dimension, Value};

/// Walk to a node by path segments, without evaluating anything.
pub(crate) fn node_at<'v>(root: &'v Value, segments: &[String]) -> Option<&'v Value> {
    let mut node = root;
    for segment in segments {
        node = entry(node, segment)?;
    }
    Some(node)
}

/// Walk to a node by path segments, mutably.
pub(crate) fn node_at_mut<'v>(root: &'v mut Value, segments: &[String]) -> Option<&'v mut Value> {
    let mut node = root;
    for segment in segments {
        node = entry_mut(node, segment)?;
    }
    Some(node)
}

/// Look up one step: a map key, or a list index for numeric segments.
pub(crate) fn entry<'v>(node: &'v Value, segment: &str) -> Option<&'v Value> {
    match node {
        Value::Map(entries) => entries.get(segment),
        Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

pub(crate) fn entry_mut<'v>(node: &'v mut Value, segment: &str) -> Option<&'v mut Value> {
    match node {
        Value::Map(entries) => entries.get_mut(segment),
        Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    }
}

/// Dimension values visible at a point in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmbientContext {
    values: BTreeMap<Dimension, String>,
}

impl AmbientContext {
    pub fn new() -> Self {
        AmbientContext::default()
    }

    /// Build a context from explicit dimension tokens, classifying each.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut values = BTreeMap::new();
        for token in tokens {
            values.insert(Dimension::classify(token), token.to_string());
        }
        AmbientContext { values }
    }

    /// Discover the context visible at a node: for each wanted dimension,
    /// the nearest enclosing definition (the node itself first) wins.
    pub(crate) fn discover(root: &Value, node: &[String], wanted: &BTreeSet<Dimension>) -> Self {
        let mut values = BTreeMap::new();
        for dimension in wanted {
            if let Some(found) = dimension_value(root, node, dimension) {
                values.insert(dimension.clone(), found);
            }
        }
        AmbientContext { values }
    }

    pub fn value(&self, dimension: &Dimension) -> Option<&str> {
        self.values.get(dimension).map(String::as_str)
    }

    pub fn insert(&mut self, dimension: Dimension, value: String) {
        self.values.insert(dimension, value);
    }

    /// Layer explicit tokens over this context. Used when a requested key
    /// carries its own variant suffix, which outranks discovered values.
    pub(crate) fn with_overrides(mut self, overrides: &BTreeMap<Dimension, String>) -> Self {
        for (dimension, value) in overrides {
            self.values.insert(dimension.clone(), value.clone());
        }
        self
    }

    pub fn dimensions(&self) -> &BTreeMap<Dimension, String> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Find one dimension's value at a node by walking toward the root. Reads
/// raw properties only; expression keys are not evaluated during the walk.
pub(crate) fn dimension_value(
    root: &Value,
    node: &[String],
    dimension: &Dimension,
) -> Option<String> {
    let property = dimension.property_name();
    for depth in (0..=node.len()).rev() {
        let Some(scope) = node_at(root, &node[..depth]) else {
            continue;
        };
        let Some(found) = scope.get(property) else {
            continue;
        };
        match (dimension, found) {
            // Well-known dimensions read their property's string value.
            (Dimension::Lang | Dimension::Gender | Dimension::Form, Value::String(s)) => {
                return Some(s.clone());
            }
            // Custom dimensions are self-naming: the property holds `true`
            // or repeats its own name.
            (Dimension::Custom(name), Value::Bool(true)) => return Some(name.clone()),
            (Dimension::Custom(name), Value::String(s)) if s == name => {
                return Some(name.clone());
            }
            _ => {}
        }
    }
    None
}
