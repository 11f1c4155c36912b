//! Key lookup at any depth of a JSON value.

use serde_json::Value;

/// Collect every value stored under `key`, at any depth of `value`.
///
/// Objects and arrays are descended into. A matching key's value is collected
/// as-is and not searched further. Keys are visited in insertion order and
/// array elements in index order.
pub fn deep_search<'a>(key: &str, value: &'a Value) -> Vec<&'a Value> {
    let mut found = Vec::new();
    collect(key, value, &mut found);
    found
}

fn collect<'a>(key: &str, value: &'a Value, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    found.push(v);
                } else {
                    collect(key, v, found);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(key, item, found);
            }
        }
        _ => {}
    }
}
