//! Resolver registration and the flattened call namespace.

use std::collections::BTreeMap;

use log::warn;

use crate::interpreter::error::EvalError;
use crate::types::Value;

/// A resolver: a named function callable from expressions.
pub type ResolverFn = Box<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// A tree of resolvers supplied at engine construction.
///
/// Groups may nest; at construction the tree flattens into a single
/// namespace with underscore-joined names, so a resolver `fetchUser` in a
/// group `api` is called as `api_fetchUser(...)`.
#[derive(Default)]
pub struct Resolvers {
    entries: BTreeMap<String, ResolverEntry>,
}

enum ResolverEntry {
    Func(ResolverFn),
    Group(Resolvers),
}

impl Resolvers {
    pub fn new() -> Self {
        Resolvers::default()
    }

    /// Register a resolver function under a name.
    pub fn insert<F>(&mut self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.entries
            .insert(name.into(), ResolverEntry::Func(Box::new(resolver)));
    }

    /// Register a nested group.
    pub fn group(&mut self, name: impl Into<String>, group: Resolvers) {
        self.entries
            .insert(name.into(), ResolverEntry::Group(group));
    }

    /// Builder-style [`insert`](Self::insert), for construction chains.
    pub fn with<F>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.insert(name, resolver);
        self
    }

    /// Builder-style [`group`](Self::group).
    pub fn with_group(mut self, name: impl Into<String>, group: Resolvers) -> Self {
        self.group(name, group);
        self
    }
}

/// The flattened resolver namespace used during evaluation.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: BTreeMap<String, ResolverFn>,
}

impl ResolverRegistry {
    /// Flatten a resolver tree into underscore-joined names.
    pub(crate) fn from_tree(tree: Resolvers) -> Self {
        let mut resolvers = BTreeMap::new();
        flatten_into(&mut resolvers, String::new(), tree);
        ResolverRegistry { resolvers }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ResolverFn> {
        self.resolvers.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.resolvers.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

fn flatten_into(target: &mut BTreeMap<String, ResolverFn>, prefix: String, tree: Resolvers) {
    for (name, entry) in tree.entries {
        let full = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}_{name}")
        };
        match entry {
            ResolverEntry::Func(resolver) => {
                if target.contains_key(&full) {
                    warn!("resolver '{full}' registered twice, keeping the later one");
                }
                target.insert(full, resolver);
            }
            ResolverEntry::Group(group) => flatten_into(target, full, group),
        }
    }
}
