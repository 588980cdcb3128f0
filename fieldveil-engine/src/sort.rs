//! Post-transform ordering of array outputs.

use fieldveil_types::SortDirection;
use serde_json::Value;
use tracing::debug;

/// Stably sorts a top-level array of objects by the textual value at the
/// dotted `field` path inside each element.
///
/// Returns false (and leaves the document alone) when the root is not an
/// array. Comparison is lexicographic on the key text, never numeric-aware;
/// an absent or unreadable key compares as the empty string. Runs after all
/// field rules, so a protected sort field orders by ciphertext.
pub fn sort_by_field(doc: &mut Value, field: &str, direction: SortDirection) -> bool {
    let Value::Array(items) = doc else {
        return false;
    };

    items.sort_by(|a, b| {
        let ordering = sort_key(a, field).cmp(&sort_key(b, field));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    debug!(field, %direction, len = items.len(), "array output sorted");
    true
}

/// The sort key of one element: a plain dotted walk, no index expansion.
fn sort_key(element: &Value, field: &str) -> String {
    let mut current = element;
    for segment in field.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(child) => current = child,
                None => return String::new(),
            },
            _ => return String::new(),
        }
    }
    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
