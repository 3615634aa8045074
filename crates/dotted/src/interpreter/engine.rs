//! The document engine: storage, lazy materialization, and the public
//! get/set/has surface.
//!
//! Reads resolve variant-suffixed keys against ambient context, evaluate
//! expression keys on demand, and store results at the dot-free twin key.
//! Writes invalidate the whole evaluation cache and every materialized
//! twin, so later reads observe the new document state.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bon::bon;
use log::{debug, trace};

use crate::interpreter::context::{self, AmbientContext, entry, node_at, node_at_mut};
use crate::interpreter::error::EvalError;
use crate::interpreter::evaluator::{self, EvalCall};
use crate::interpreter::registry::{ResolverRegistry, Resolvers};
use crate::interpreter::scoped::Scoped;
use crate::interpreter::variants;
use crate::types::{Dimension, KeyPath, Value, VariantKey, is_expression_key, materialized_key};
use crate::validate::Validator;

/// Key names reserved for engine operations. `set` rejects them, with or
/// without a dot prefix or variant suffix.
pub const RESERVED_NAMES: &[&str] = &["get", "set", "has", "delete", "clear", "keys"];

/// A fallback produced when a lookup finds nothing.
pub enum Fallback {
    /// A fixed value.
    Value(Value),
    /// Computed on demand, once per use.
    Lazy(Box<dyn Fn() -> Value>),
}

impl Fallback {
    pub fn value(value: impl Into<Value>) -> Self {
        Fallback::Value(value.into())
    }

    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        Fallback::Lazy(Box::new(f))
    }

    fn resolve(&self) -> Value {
        match self {
            Fallback::Value(value) => value.clone(),
            Fallback::Lazy(f) => f(),
        }
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Fallback::Lazy(_) => f.debug_tuple("Lazy").finish(),
        }
    }
}

/// What to do with an evaluation error caught at the read boundary.
#[derive(Debug)]
pub enum ErrorDirective {
    /// Propagate the error to the caller.
    Rethrow,
    /// Use the configured fallback; rethrows if none is configured.
    UseFallback,
    /// Return this value instead.
    Substitute(Value),
}

/// An error handler, called with the error and the requested path.
pub type ErrorHandler = Box<dyn Fn(&EvalError, &str) -> ErrorDirective>;

/// Options for [`Dotted::get_with`].
#[derive(Debug, Default, bon::Builder)]
pub struct GetOptions {
    /// Bypass materialized values and the cache for this read.
    #[builder(default)]
    pub fresh: bool,
    /// Call-level fallback, consulted before the engine-level one.
    pub fallback: Option<Fallback>,
}

/// Options for [`Dotted::has_with`].
#[derive(Debug, Clone, Copy, Default, bon::Builder)]
pub struct HasOptions {
    /// Re-evaluate instead of trusting materialized values.
    #[builder(default)]
    pub fresh: bool,
}

/// Options for [`Dotted::set_with`].
#[derive(Debug, Clone, Copy, Default, bon::Builder)]
pub struct SetOptions {
    /// Re-evaluate dependents eagerly after the write. Evaluation is lazy,
    /// so this is accepted and ignored.
    #[builder(default)]
    pub trigger_dependents: bool,
}

/// The document engine.
///
/// Interior mutability lets reads materialize values through `&self`, so
/// scoped views can share one engine.
pub struct Dotted {
    document: RefCell<Value>,
    cache: RefCell<HashMap<String, Value>>,
    stack: RefCell<Vec<String>>,
    depth: Cell<usize>,
    max_depth: usize,
    registry: ResolverRegistry,
    fallback: Option<Fallback>,
    on_error: Option<ErrorHandler>,
    validator: Option<Box<dyn Validator>>,
    available: RefCell<Option<Vec<KeyPath>>>,
}

#[bon]
impl Dotted {
    /// Build an engine over a document.
    #[builder]
    pub fn new(
        /// The document tree. Expression keys evaluate on first read.
        #[builder(into)]
        schema: Value,
        /// Values shallow-merged over the schema, one top-level key at a
        /// time.
        #[builder(into)]
        initial: Option<Value>,
        /// Resolver functions callable from expressions. Nested groups
        /// flatten into underscore-joined names.
        resolvers: Option<Resolvers>,
        /// Engine-level fallback for absent values and handled errors.
        fallback: Option<Fallback>,
        /// Called when a read fails; decides whether to rethrow, fall
        /// back, or substitute.
        on_error: Option<ErrorHandler>,
        /// Hook validating read values and resolver outputs.
        validation: Option<Box<dyn Validator>>,
        /// Maximum depth of nested expression evaluations.
        #[builder(default = 100)]
        max_evaluation_depth: usize,
    ) -> Self {
        let mut document = schema;
        if let Some(initial) = initial {
            merge_top_level(&mut document, initial);
        }
        let registry = ResolverRegistry::from_tree(resolvers.unwrap_or_default());
        Dotted {
            document: RefCell::new(document),
            cache: RefCell::new(HashMap::new()),
            stack: RefCell::new(Vec::new()),
            depth: Cell::new(0),
            max_depth: max_evaluation_depth,
            registry,
            fallback,
            on_error,
            validator: validation,
            available: RefCell::new(None),
        }
    }
}

impl Dotted {
    /// Read a value, evaluating expression keys as needed. Absent paths
    /// produce the configured fallback, or null.
    pub fn get(&self, path: &str) -> Result<Value, EvalError> {
        self.get_with(path, GetOptions::default())
    }

    pub fn get_with(&self, path: &str, options: GetOptions) -> Result<Value, EvalError> {
        self.get_at(&KeyPath::parse(path), &options)
    }

    pub(crate) fn get_at(&self, path: &KeyPath, options: &GetOptions) -> Result<Value, EvalError> {
        if path.is_empty() {
            return Ok(self.document.borrow().clone());
        }
        match self.try_get(path, options.fresh) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(self.fallback_for(options).unwrap_or(Value::Null)),
            Err(error) => self.route_error(error, path, options),
        }
    }

    /// Whether a path resolves to a present value. Never fails: evaluation
    /// errors read as absence. A key that evaluates to null is present.
    pub fn has(&self, path: &str) -> bool {
        self.has_with(path, HasOptions::default())
    }

    pub fn has_with(&self, path: &str, options: HasOptions) -> bool {
        self.has_at(&KeyPath::parse(path), options)
    }

    pub(crate) fn has_at(&self, path: &KeyPath, options: HasOptions) -> bool {
        if path.is_empty() {
            return true;
        }
        matches!(self.lookup(path, options.fresh), Ok(Some(_)))
    }

    /// Write a value, creating intermediate maps as needed. Writing an
    /// expression key drops its materialized twin; every write invalidates
    /// the evaluation cache and all other materialized values.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<(), EvalError> {
        self.set_with(path, value, SetOptions::default())
    }

    pub fn set_with(
        &self,
        path: &str,
        value: impl Into<Value>,
        _options: SetOptions,
    ) -> Result<(), EvalError> {
        self.set_at(&KeyPath::parse(path), value.into())
    }

    pub(crate) fn set_at(&self, path: &KeyPath, value: Value) -> Result<(), EvalError> {
        let Some(leaf) = path.leaf() else {
            return Err(EvalError::Expression {
                path: String::new(),
                message: "cannot set the document root".to_string(),
            });
        };
        let base = VariantKey::parse(materialized_key(leaf)).base().to_string();
        if RESERVED_NAMES.contains(&base.as_str()) {
            return Err(EvalError::ReservedKey {
                key: leaf.to_string(),
            });
        }
        {
            let mut document = self.document.borrow_mut();
            write_at(&mut document, path.parent(), leaf, value)?;
            // A rewritten expression key must not keep its stale twin.
            if is_expression_key(leaf)
                && let Some(Value::Map(entries)) = node_at_mut(&mut document, path.parent())
            {
                entries.remove(materialized_key(leaf));
            }
        }
        self.invalidate(Some(path));
        debug!("set '{path}', invalidated caches");
        Ok(())
    }

    /// Remove a key. Removing an expression key also removes its
    /// materialized twin. Missing targets are a no-op.
    pub fn delete(&self, path: &str) -> Result<(), EvalError> {
        self.delete_at(&KeyPath::parse(path))
    }

    pub(crate) fn delete_at(&self, path: &KeyPath) -> Result<(), EvalError> {
        let Some(leaf) = path.leaf() else {
            return Err(EvalError::Expression {
                path: String::new(),
                message: "cannot delete the document root".to_string(),
            });
        };
        {
            let mut document = self.document.borrow_mut();
            let Some(parent) = node_at_mut(&mut document, path.parent()) else {
                return Ok(());
            };
            match parent {
                Value::Map(entries) => {
                    entries.remove(leaf);
                    if is_expression_key(leaf) {
                        entries.remove(materialized_key(leaf));
                    }
                }
                Value::List(items) => {
                    if let Ok(index) = leaf.parse::<usize>()
                        && index < items.len()
                    {
                        items.remove(index);
                    }
                }
                _ => {}
            }
        }
        self.invalidate(None);
        debug!("deleted '{path}'");
        Ok(())
    }

    /// Reset the document to an empty map and drop all cached state.
    pub fn clear(&self) {
        *self.document.borrow_mut() = Value::Map(BTreeMap::new());
        self.cache.borrow_mut().clear();
        self.stack.borrow_mut().clear();
        self.depth.set(0);
        *self.available.borrow_mut() = None;
        debug!("cleared document");
    }

    /// Keys of the map at a path, sorted; the root for an empty path.
    /// Missing or non-map targets produce an empty list.
    pub fn keys(&self, path: &str) -> Vec<String> {
        self.keys_at(&KeyPath::parse(path))
    }

    pub(crate) fn keys_at(&self, path: &KeyPath) -> Vec<String> {
        let value = if path.is_empty() {
            Some(self.document.borrow().clone())
        } else {
            self.lookup(path, false).unwrap_or_default()
        };
        match value {
            Some(Value::Map(entries)) => entries.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// A view rooted at a path. The view shares this engine, so ambient
    /// context above its root still applies.
    pub fn scope(&self, path: &str) -> Scoped<'_> {
        Scoped::new(self, KeyPath::parse(path))
    }

    /// A snapshot of the raw document tree, unexpanded.
    pub fn document(&self) -> Value {
        self.document.borrow().clone()
    }

    /// Every addressable path, sorted. Computed lazily and cached until
    /// the next mutation.
    pub fn available_paths(&self) -> Vec<String> {
        self.with_available(|paths| paths.iter().map(ToString::to_string).collect())
    }

    // ---- internals ----

    fn try_get(&self, path: &KeyPath, fresh: bool) -> Result<Option<Value>, EvalError> {
        let Some(value) = self.lookup(path, fresh)? else {
            return Ok(None);
        };
        match &self.validator {
            Some(validator) => validator.validate(&path.to_string(), &value).map(Some),
            None => Ok(Some(value)),
        }
    }

    fn fallback_for(&self, options: &GetOptions) -> Option<Value> {
        options
            .fallback
            .as_ref()
            .or(self.fallback.as_ref())
            .map(Fallback::resolve)
    }

    /// Route an evaluation error through the configured handler.
    fn route_error(
        &self,
        error: EvalError,
        path: &KeyPath,
        options: &GetOptions,
    ) -> Result<Value, EvalError> {
        debug!("get '{path}' failed: {error}");
        match &self.on_error {
            Some(handler) => match handler(&error, &path.to_string()) {
                ErrorDirective::Rethrow => Err(error),
                ErrorDirective::UseFallback => self.fallback_for(options).ok_or(error),
                ErrorDirective::Substitute(value) => Ok(value),
            },
            None => match self.fallback_for(options) {
                Some(value) => Ok(value),
                None => Err(error),
            },
        }
    }

    /// Resolve a full path from the root, materializing expression keys
    /// along the way. `Ok(None)` means absent.
    pub(crate) fn lookup(&self, path: &KeyPath, fresh: bool) -> Result<Option<Value>, EvalError> {
        let segments = path.segments();
        let mut effective: Vec<String> = Vec::with_capacity(segments.len());
        for (depth, segment) in segments.iter().enumerate() {
            if depth + 1 == segments.len() {
                return self.resolve_leaf(&effective, segment, fresh);
            }
            match self.resolve_step(&effective, segment, fresh)? {
                Some(key) => effective.push(key),
                None => return Ok(None),
            }
        }
        Ok(Some(self.document.borrow().clone()))
    }

    /// Resolve base + relative segments as one path. Used by reference
    /// resolution during evaluation.
    pub(crate) fn lookup_at(
        &self,
        base: &[String],
        rel: &[String],
        fresh: bool,
    ) -> Result<Option<Value>, EvalError> {
        let mut segments = base.to_vec();
        segments.extend(rel.iter().cloned());
        self.lookup(&KeyPath::from_segments(segments), fresh)
    }

    /// One ambient dimension value at a node, for pronoun resolution.
    pub(crate) fn dimension(&self, node: &[String], dimension: &Dimension) -> Option<String> {
        let document = self.document.borrow();
        context::dimension_value(&document, node, dimension)
    }

    /// Run a user resolver if one is registered under the name.
    pub(crate) fn call_resolver(
        &self,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>, EvalError> {
        let Some(resolver) = self.registry.get(name) else {
            return Ok(None);
        };
        trace!("calling resolver '{name}'");
        let output = resolver(args)?;
        match &self.validator {
            Some(validator) => validator.validate_resolver(name, args, &output).map(Some),
            None => Ok(Some(output)),
        }
    }

    pub(crate) fn resolver_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Make an intermediate path segment readable: present directly, or
    /// materialized from its expression twin. Returns the effective
    /// storage key, or `None` when absent.
    fn resolve_step(
        &self,
        parent: &[String],
        segment: &str,
        fresh: bool,
    ) -> Result<Option<String>, EvalError> {
        let stored = materialized_key(segment).to_string();
        let dotted = format!(".{stored}");
        let (has_plain, has_expr) = {
            let document = self.document.borrow();
            let Some(node) = node_at(&document, parent) else {
                return Ok(None);
            };
            (entry(node, &stored).is_some(), entry(node, &dotted).is_some())
        };
        if is_expression_key(segment) && !has_expr {
            return Ok(None);
        }
        if has_expr && (!has_plain || fresh) {
            self.materialize(parent, &dotted, fresh)?;
        }
        let present = self.key_present(parent, &stored);
        Ok(present.then_some(stored))
    }

    /// Resolve the final path segment: variant selection, expression
    /// materialization, then the read.
    fn resolve_leaf(
        &self,
        parent: &[String],
        leaf: &str,
        fresh: bool,
    ) -> Result<Option<Value>, EvalError> {
        {
            let document = self.document.borrow();
            let Some(node) = node_at(&document, parent) else {
                return Ok(None);
            };
            // List elements bypass the variant machinery. Lists and
            // strings also answer `length`, matching member access.
            if let Value::List(items) = node {
                if leaf == "length" {
                    return Ok(Some(Value::Int(items.len() as i64)));
                }
                return Ok(entry(node, leaf).cloned());
            }
            if let Value::String(s) = node {
                if leaf == "length" {
                    return Ok(Some(Value::Int(s.chars().count() as i64)));
                }
                return Ok(None);
            }
            if !matches!(node, Value::Map(_)) {
                return Ok(None);
            }
        }

        let explicit = is_expression_key(leaf);
        let requested = VariantKey::parse(materialized_key(leaf));
        let base = requested.base().to_string();
        let dotted_base = format!(".{base}");

        let siblings = self.sibling_keys(parent);
        let expr_candidates: Vec<String> = siblings
            .iter()
            .filter(|key| is_expression_key(key) && VariantKey::parse(key).base() == dotted_base)
            .cloned()
            .collect();
        let plain_candidates: Vec<String> = siblings
            .iter()
            .filter(|key| !is_expression_key(key) && VariantKey::parse(key).base() == base)
            .cloned()
            .collect();

        // Discovered context first, then the requested suffix on top.
        let mut wanted = variants::wanted_dimensions(&expr_candidates);
        wanted.extend(variants::wanted_dimensions(&plain_candidates));
        let context = {
            let document = self.document.borrow();
            AmbientContext::discover(&document, parent, &wanted)
        }
        .with_overrides(requested.dimensions());

        if explicit {
            // Dotted requests resolve among expression keys only.
            if expr_candidates.is_empty() {
                return Ok(None);
            }
            let chosen = variants::resolve_variant_key(&dotted_base, &expr_candidates, &context);
            if !self.key_present(parent, &chosen) {
                return Ok(None);
            }
            return self.read_expression_value(parent, &chosen, fresh).map(Some);
        }

        if !expr_candidates.is_empty() {
            let chosen = variants::resolve_variant_key(&dotted_base, &expr_candidates, &context);
            if self.key_present(parent, &chosen) {
                let twin = materialized_key(&chosen).to_string();
                if !self.key_present(parent, &twin) || fresh {
                    let value = self.materialize(parent, &chosen, fresh)?;
                    // Uncacheable values never reach the document; serve
                    // the live result.
                    if !self.key_present(parent, &twin) {
                        return Ok(Some(value));
                    }
                }
            }
        }

        // Re-list: materialization may have added a twin candidate.
        let plain_candidates: Vec<String> = if expr_candidates.is_empty() {
            plain_candidates
        } else {
            self.sibling_keys(parent)
                .into_iter()
                .filter(|key| !is_expression_key(key) && VariantKey::parse(key).base() == base)
                .collect()
        };
        if plain_candidates.is_empty() {
            return Ok(None);
        }
        let chosen = variants::resolve_variant_key(&base, &plain_candidates, &context);
        let document = self.document.borrow();
        Ok(node_at(&document, parent)
            .and_then(|node| entry(node, &chosen))
            .cloned())
    }

    /// Read an expression key's value: the materialized twin if present,
    /// otherwise evaluate (and usually store) it.
    fn read_expression_value(
        &self,
        parent: &[String],
        expr_key: &str,
        fresh: bool,
    ) -> Result<Value, EvalError> {
        let twin = materialized_key(expr_key).to_string();
        if !fresh {
            let existing = {
                let document = self.document.borrow();
                node_at(&document, parent)
                    .and_then(|node| entry(node, &twin))
                    .cloned()
            };
            if let Some(value) = existing {
                return Ok(value);
            }
        }
        self.materialize(parent, expr_key, fresh)
    }

    /// Evaluate an expression key and write its value at the twin slot.
    /// Uncacheable results (via fresh()) are returned without being
    /// stored, so every read recomputes them.
    fn materialize(&self, parent: &[String], expr_key: &str, fresh: bool) -> Result<Value, EvalError> {
        let source = {
            let document = self.document.borrow();
            node_at(&document, parent)
                .and_then(|node| entry(node, expr_key))
                .cloned()
        };
        let Some(source) = source else {
            return Ok(Value::Null);
        };
        let mut expr_segments = parent.to_vec();
        expr_segments.push(expr_key.to_string());
        let expr_path = KeyPath::from_segments(expr_segments);

        let value = match source {
            Value::String(src) => {
                let (value, cacheable) = self.evaluate_expression(&expr_path, &src, fresh)?;
                if !cacheable {
                    return Ok(value);
                }
                value
            }
            // Non-string expression values materialize verbatim.
            other => other,
        };

        {
            let mut document = self.document.borrow_mut();
            if let Some(Value::Map(entries)) = node_at_mut(&mut document, parent) {
                entries.insert(materialized_key(expr_key).to_string(), value.clone());
            }
        }
        let mut twin_segments = parent.to_vec();
        twin_segments.push(materialized_key(expr_key).to_string());
        self.note_materialized(&KeyPath::from_segments(twin_segments));
        trace!("materialized '{expr_path}'");
        Ok(value)
    }

    /// Evaluate an expression source under the cycle and depth guards.
    /// Returns the value and whether it may be cached and materialized.
    fn evaluate_expression(
        &self,
        expr_path: &KeyPath,
        source: &str,
        fresh: bool,
    ) -> Result<(Value, bool), EvalError> {
        let key = expr_path.to_string();
        if !fresh && let Some(cached) = self.cache.borrow().get(&key) {
            trace!("cache hit for '{key}'");
            return Ok((cached.clone(), true));
        }
        {
            let stack = self.stack.borrow();
            if stack.contains(&key) {
                let mut chain = stack.clone();
                chain.push(key);
                return Err(EvalError::CircularDependency { chain });
            }
        }
        if self.depth.get() >= self.max_depth {
            return Err(EvalError::DepthExceeded {
                max: self.max_depth,
            });
        }

        self.stack.borrow_mut().push(key.clone());
        self.depth.set(self.depth.get() + 1);
        let mut call = EvalCall {
            expr_path: expr_path.clone(),
            fresh,
            no_cache: false,
        };
        let result = evaluator::eval_source(self, &mut call, source);
        self.stack.borrow_mut().pop();
        self.depth.set(self.depth.get() - 1);

        let value = result?;
        let cacheable = !call.no_cache;
        if cacheable {
            self.cache.borrow_mut().insert(key, value.clone());
        }
        Ok((value, cacheable))
    }

    fn key_present(&self, parent: &[String], key: &str) -> bool {
        let document = self.document.borrow();
        node_at(&document, parent)
            .and_then(|node| entry(node, key))
            .is_some()
    }

    /// Leaf key names present under a parent node, from the path listing.
    fn sibling_keys(&self, parent: &[String]) -> Vec<String> {
        self.with_available(|paths| {
            paths
                .iter()
                .filter(|path| {
                    path.len() == parent.len() + 1 && &path.segments()[..parent.len()] == parent
                })
                .filter_map(|path| path.leaf().map(str::to_string))
                .collect()
        })
    }

    fn with_available<T>(&self, f: impl FnOnce(&[KeyPath]) -> T) -> T {
        {
            let available = self.available.borrow();
            if let Some(paths) = available.as_ref() {
                return f(paths);
            }
        }
        let computed = variants::available_paths(&self.document.borrow());
        let result = f(&computed);
        *self.available.borrow_mut() = Some(computed);
        result
    }

    /// Record a freshly materialized twin in the cached path listing.
    fn note_materialized(&self, path: &KeyPath) {
        let mut available = self.available.borrow_mut();
        if let Some(paths) = available.as_mut()
            && let Err(position) = paths.binary_search(path)
        {
            paths.insert(position, path.clone());
        }
    }

    /// Drop the evaluation cache and every materialized twin except the
    /// path just written.
    fn invalidate(&self, keep: Option<&KeyPath>) {
        self.cache.borrow_mut().clear();
        {
            let mut document = self.document.borrow_mut();
            clear_materialized(&mut document, &mut Vec::new(), keep);
        }
        *self.available.borrow_mut() = None;
    }
}

/// Shallow merge: each top-level key of `overlay` replaces the schema's.
fn merge_top_level(document: &mut Value, overlay: Value) {
    match (document, overlay) {
        (Value::Map(base), Value::Map(extra)) => {
            for (key, value) in extra {
                base.insert(key, value);
            }
        }
        (document, overlay) => *document = overlay,
    }
}

/// Write a value at a path, creating intermediate maps as needed. Scalar
/// intermediates are an error, not overwritten.
fn write_at(
    document: &mut Value,
    parents: &[String],
    leaf: &str,
    value: Value,
) -> Result<(), EvalError> {
    let mut node = document;
    for (index, segment) in parents.iter().enumerate() {
        node = match node {
            Value::Map(entries) => entries
                .entry(segment.clone())
                .or_insert_with(|| Value::Map(BTreeMap::new())),
            Value::List(items) => {
                let slot = segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get_mut(i));
                match slot {
                    Some(slot) => slot,
                    None => {
                        return Err(EvalError::Expression {
                            path: display_path(&parents[..=index]),
                            message: format!("list index '{segment}' out of range"),
                        });
                    }
                }
            }
            _ => {
                return Err(EvalError::Expression {
                    path: display_path(&parents[..=index]),
                    message: format!("'{segment}' is not reachable through a container"),
                });
            }
        };
    }
    match node {
        Value::Map(entries) => {
            entries.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::List(items) => {
            let Ok(index) = leaf.parse::<usize>() else {
                return Err(EvalError::Expression {
                    path: display_path(parents),
                    message: format!("cannot set key '{leaf}' on a list"),
                });
            };
            if index == items.len() {
                items.push(value);
                Ok(())
            } else if let Some(slot) = items.get_mut(index) {
                *slot = value;
                Ok(())
            } else {
                Err(EvalError::Expression {
                    path: display_path(parents),
                    message: format!("list index {index} out of range"),
                })
            }
        }
        _ => Err(EvalError::Expression {
            path: display_path(parents),
            message: "target is not a container".to_string(),
        }),
    }
}

fn display_path(segments: &[String]) -> String {
    KeyPath::from_segments(segments.to_vec()).to_string()
}

/// Remove every materialized twin in the tree, except `keep`.
fn clear_materialized(node: &mut Value, path: &mut Vec<String>, keep: Option<&KeyPath>) {
    match node {
        Value::Map(entries) => {
            let twins: Vec<String> = entries
                .keys()
                .filter(|key| is_expression_key(key))
                .map(|key| materialized_key(key).to_string())
                .collect();
            for twin in twins {
                path.push(twin.clone());
                let keep_this = keep.is_some_and(|k| k.segments() == path.as_slice());
                path.pop();
                if !keep_this {
                    entries.remove(&twin);
                }
            }
            for (key, child) in entries.iter_mut() {
                path.push(key.clone());
                clear_materialized(child, path, keep);
                path.pop();
            }
        }
        Value::List(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                path.push(index.to_string());
                clear_materialized(child, path, keep);
                path.pop();
            }
        }
        _ => {}
    }
}
