//! Dotted-path resolution against a JSON document.
//!
//! A rule path like `orders.items.sku` has no index syntax; arrays of
//! structures are expanded automatically, one resolved path per element. The
//! resolver only reads the document and returns JSON Pointers (RFC 6901),
//! each addressing exactly one scalar leaf, in document order. Resolving the
//! same path against an unmodified document twice yields identical results.

use fieldveil_types::FieldPath;
use serde_json::Value;

/// Resolves a dotted path to the scalar leaves it addresses.
///
/// Zero leaves is the normal result for a path this document does not have;
/// it is never an error.
pub fn resolve(doc: &Value, path: &FieldPath) -> Vec<String> {
    let segments: Vec<&str> = path.segments().collect();
    let mut leaves = Vec::new();
    let mut prefix = String::new();
    walk(doc, &segments, &mut prefix, &mut leaves);
    leaves
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

/// Escapes one pointer token per RFC 6901.
fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn walk(container: &Value, segments: &[&str], prefix: &mut String, leaves: &mut Vec<String>) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };

    // Only objects can carry a named segment; anything else is a dead end.
    let Value::Object(map) = container else {
        return;
    };
    let Some(child) = map.get(*segment) else {
        return;
    };

    let depth = prefix.len();
    prefix.push('/');
    prefix.push_str(&escape(segment));

    match child {
        Value::Array(items) if items.iter().any(|item| !is_scalar(item)) => {
            // Array of structures: expand the remaining segments under every
            // element. Expansion at the final segment addresses nothing.
            if !rest.is_empty() {
                for (index, item) in items.iter().enumerate() {
                    let item_depth = prefix.len();
                    prefix.push('/');
                    prefix.push_str(&index.to_string());
                    walk(item, rest, prefix, leaves);
                    prefix.truncate(item_depth);
                }
            }
        }
        Value::Array(items) => {
            // All-scalar array: a collection leaf at the final segment, a
            // dead end before it.
            if rest.is_empty() {
                for index in 0..items.len() {
                    leaves.push(format!("{prefix}/{index}"));
                }
            }
        }
        Value::Object(_) => {
            if rest.is_empty() {
                collect_scalars(child, prefix, leaves);
            } else {
                walk(child, rest, prefix, leaves);
            }
        }
        _scalar => {
            if rest.is_empty() {
                leaves.push(prefix.clone());
            }
        }
    }

    prefix.truncate(depth);
}

/// Deep transform: every descendant scalar of an object leaf, through any
/// mix of nested objects and arrays, is individually a leaf.
fn collect_scalars(value: &Value, prefix: &mut String, leaves: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let depth = prefix.len();
                prefix.push('/');
                prefix.push_str(&escape(key));
                collect_scalars(child, prefix, leaves);
                prefix.truncate(depth);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let depth = prefix.len();
                prefix.push('/');
                prefix.push_str(&index.to_string());
                collect_scalars(child, prefix, leaves);
                prefix.truncate(depth);
            }
        }
        _scalar => leaves.push(prefix.clone()),
    }
}
