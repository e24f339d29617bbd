//! Shared fixtures and constructors for the integration suite.

use serde_json::json;
use treepatch::tree::{Node, Value};

/// Builds a tree from a JSON literal.
///
/// # Panics
/// Panics if the literal is not a JSON object.
pub fn tree(value: serde_json::Value) -> Node {
    match Value::from_json(value) {
        Value::Map(node) => node,
        other => panic!("fixture is not an object: {other}"),
    }
}

/// Builds a value from a JSON literal.
pub fn val(value: serde_json::Value) -> Value {
    Value::from_json(value)
}

/// `{ "a": "b", "c": "d" }`
pub fn make_a() -> Node {
    tree(json!({ "a": "b", "c": "d" }))
}

/// `{ "c": "d", "e": "f" }` - shares the `c` key with [`make_a`].
pub fn make_b() -> Node {
    tree(json!({ "c": "d", "e": "f" }))
}

/// A deliberately messy nested fixture: scalars, lists, nested maps, and
/// falsy leaves at several depths.
pub fn make_nested() -> Node {
    tree(json!({
        "name": "original",
        "count": 3,
        "enabled": true,
        "tags": ["alpha", "beta"],
        "meta": {
            "owner": "ops",
            "limits": { "cpu": 2, "mem": 512 },
            "flags": { "debug": false }
        }
    }))
}

/// A reworked version of [`make_nested`] touching every shape of change:
/// scalar edits, list replacement, removed branches, and new keys.
pub fn make_nested_changed() -> Node {
    tree(json!({
        "name": "changed",
        "count": 0,
        "tags": ["alpha", "gamma"],
        "meta": {
            "owner": "ops",
            "limits": { "cpu": 4 }
        },
        "extra": { "note": "new" }
    }))
}
