//! Variant-suffixed key scoring and selection.
//!
//! Keys sharing a base compete on how well their variant tokens match the
//! ambient context: language 1000, gender 100, formality 50, custom 10.
//! A candidate carrying any token the context lacks (or contradicts) is
//! disqualified outright, so a close-but-wrong variant never beats the
//! plain base key.

use std::collections::BTreeSet;

use log::trace;

use crate::interpreter::context::AmbientContext;
use crate::types::{Dimension, KeyPath, Value, VariantKey};

/// Score a candidate against a context. `None` disqualifies: every
/// dimension the candidate carries must appear in the context with the
/// same value. A variant-less candidate scores zero.
pub fn score_variant(candidate: &VariantKey, context: &AmbientContext) -> Option<u32> {
    let mut score = 0;
    for (dimension, value) in candidate.dimensions() {
        match context.value(dimension) {
            Some(ambient) if ambient == value => score += dimension.weight(),
            _ => return None,
        }
    }
    Some(score)
}

/// Pick the best-scoring candidate for a base name. Ties prefer fewer
/// dimensions, then the lexicographically smaller key. Falls back to the
/// base name itself when no candidate qualifies.
pub fn resolve_variant_key(base: &str, candidates: &[String], context: &AmbientContext) -> String {
    let mut best: Option<(u32, usize, &String)> = None;
    for candidate in candidates {
        let key = VariantKey::parse(candidate);
        if key.base() != base {
            continue;
        }
        let Some(score) = score_variant(&key, context) else {
            continue;
        };
        let dims = key.dimensions().len();
        let better = match &best {
            None => true,
            Some((best_score, best_dims, best_key)) => {
                score > *best_score
                    || (score == *best_score && dims < *best_dims)
                    || (score == *best_score
                        && dims == *best_dims
                        && candidate.as_str() < best_key.as_str())
            }
        };
        if better {
            best = Some((score, dims, candidate));
        }
    }
    match best {
        Some((score, _, key)) => {
            if key.as_str() != base {
                trace!("picked variant '{key}' for '{base}' (score {score})");
            }
            key.clone()
        }
        None => base.to_string(),
    }
}

/// Union of dimensions carried by any candidate, used to scope the
/// context walk.
pub(crate) fn wanted_dimensions(candidates: &[String]) -> BTreeSet<Dimension> {
    let mut wanted = BTreeSet::new();
    for candidate in candidates {
        for dimension in VariantKey::parse(candidate).dimensions().keys() {
            wanted.insert(dimension.clone());
        }
    }
    wanted
}

/// Every addressable path in the document, sorted. List elements appear
/// under their numeric index.
pub fn available_paths(document: &Value) -> Vec<KeyPath> {
    let mut paths = Vec::new();
    collect_paths(document, &KeyPath::root(), &mut paths);
    paths.sort();
    paths
}

fn collect_paths(node: &Value, prefix: &KeyPath, paths: &mut Vec<KeyPath>) {
    match node {
        Value::Map(entries) => {
            for (key, child) in entries {
                let path = prefix.child(key);
                paths.push(path.clone());
                collect_paths(child, &path, paths);
            }
        }
        Value::List(items) => {
            for (index, child) in items.iter().enumerate() {
                let path = prefix.child(&index.to_string());
                paths.push(path.clone());
                collect_paths(child, &path, paths);
            }
        }
        _ => {}
    }
}
