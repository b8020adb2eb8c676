//! Deterministic identifiers.
//!
//! Derived entities (clarifications, plans, discussion entries,
//! approvals) are content-addressed: their id is the entity kind plus
//! the first 12 hex characters of the SHA-256 digest of a canonical
//! JSON rendering of their content. Canonicalization sorts object keys
//! lexicographically, keeps arrays in input order, and emits `null`
//! for nil values, so equivalent-up-to-key-order inputs hash the same.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Render a JSON value in canonical form.
///
/// Byte-for-byte identical output for any two inputs that are equal up
/// to object key order.
pub fn stable_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(&mut out, value);
    out
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        // Scalar Display is already compact JSON (incl. string escaping)
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let _ = write!(out, "{}", value);
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}", Value::String(key.clone()));
                out.push(':');
                write_canonical(out, &map[key]);
            }
            out.push('}');
        }
    }
}

/// Compute a deterministic id: `kind + '-' + first 12 hex chars of
/// SHA-256(stable_json(value))`.
pub fn deterministic_id(kind: &str, value: &Value) -> String {
    let digest = Sha256::digest(stable_json(value).as_bytes());
    let mut hex = String::with_capacity(12);
    for byte in digest.iter().take(6) {
        let _ = write!(hex, "{:02x}", byte);
    }
    format!("{}-{}", kind, hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stable_json_sorts_keys() {
        let v = json!({"b": 1, "a": {"d": null, "c": [2, 1]}});
        assert_eq!(stable_json(&v), r#"{"a":{"c":[2,1],"d":null},"b":1}"#);
    }

    #[test]
    fn stable_json_identical_up_to_key_order() {
        let left: Value = serde_json::from_str(r#"{"x": 1, "y": [true, {"b": 2, "a": 3}]}"#).unwrap();
        let right: Value = serde_json::from_str(r#"{"y": [true, {"a": 3, "b": 2}], "x": 1}"#).unwrap();
        assert_eq!(stable_json(&left), stable_json(&right));
    }

    #[test]
    fn stable_json_preserves_array_order() {
        assert_eq!(stable_json(&json!([3, 1, 2])), "[3,1,2]");
    }

    #[test]
    fn stable_json_escapes_strings() {
        let v = json!({"msg": "line\n\"quote\""});
        assert_eq!(stable_json(&v), r#"{"msg":"line\n\"quote\""}"#);
    }

    #[test]
    fn deterministic_id_is_stable() {
        let a = deterministic_id("plan", &json!({"title": "M1", "tasks": ["t"]}));
        let b = deterministic_id("plan", &json!({"tasks": ["t"], "title": "M1"}));
        assert_eq!(a, b);
        assert!(a.starts_with("plan-"));
        assert_eq!(a.len(), "plan-".len() + 12);
    }

    #[test]
    fn deterministic_id_differs_by_content() {
        let a = deterministic_id("clarification", &json!({"questions": ["who?"]}));
        let b = deterministic_id("clarification", &json!({"questions": ["what?"]}));
        assert_ne!(a, b);
    }
}
