//! Configuration merge logic
//!
//! Layers merge with:
//! - Tables: deep-merge by key
//! - Sequences: REPLACE (last wins)
//! - Scalars: override (last wins)
//! - Table/leaf clash: override (last wins), logged

use serde_json::{Map, Value};
use tracing::warn;

/// Deep merge two JSON values, returning the merged value.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive), keys only in `base` are kept
/// - Arrays: REPLACE (second wins entirely)
/// - Scalars: override (second wins)
/// - Object vs. non-object: overlay wins, with a warning
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    let mut merged = base;
    merge_at(&mut merged, overlay, "");
    merged
}

/// Merge `source` into `destination` in place.
pub fn merge_into(destination: &mut Value, source: Value) {
    merge_at(destination, source, "");
}

/// Merge multiple config layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

fn merge_at(destination: &mut Value, source: Value, path: &str) {
    match (destination, source) {
        (Value::Object(dst), Value::Object(src)) => merge_tables(dst, src, path),

        (dst, src) => {
            if is_ambiguous(dst, &src) {
                warn!(
                    key = if path.is_empty() { "<root>" } else { path },
                    "config section/value mismatch, later layer wins"
                );
            }
            *dst = src;
        }
    }
}

fn merge_tables(dst: &mut Map<String, Value>, src: Map<String, Value>, path: &str) {
    for (key, value) in src {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };
        match dst.get_mut(&key) {
            Some(existing) => merge_at(existing, value, &child_path),
            None => {
                dst.insert(key, value);
            }
        }
    }
}

/// A section on one side and a non-null leaf on the other.
fn is_ambiguous(dst: &Value, src: &Value) -> bool {
    match (dst, src) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Object(_), other) | (other, Value::Object(_)) => !other.is_object(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let base = json!({"scale": 1.0});
        let overlay = json!({"scale": 2.5});
        let result = deep_merge(base, overlay);
        assert_eq!(result["scale"], 2.5);
    }

    #[test]
    fn test_section_deep_merge() {
        let base = json!({
            "artist": {
                "vertical": 2,
                "extrude_default": "square"
            }
        });
        let overlay = json!({
            "artist": {
                "vertical": 3
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["artist"]["vertical"], 3);
        assert_eq!(result["artist"]["extrude_default"], "square");
    }

    #[test]
    fn test_array_replace() {
        let base = json!({"model": {"shift": [0.0, 0.0, 0.0]}});
        let overlay = json!({"model": {"shift": [1.0, 2.0]}});
        let result = deep_merge(base, overlay);

        let shift = result["model"]["shift"].as_array().unwrap();
        assert_eq!(shift.len(), 2);
        assert_eq!(shift[0], 1.0);
    }

    #[test]
    fn test_add_new_key() {
        let result = deep_merge(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 2);
    }

    #[test]
    fn test_leaf_replaces_section() {
        let base = json!({"canvas": {"type": "gltf"}});
        let overlay = json!({"canvas": "plotly"});
        let result = deep_merge(base, overlay);
        assert_eq!(result["canvas"], "plotly");
    }

    #[test]
    fn test_section_replaces_leaf() {
        let base = json!({"displ": 0.5});
        let overlay = json!({"displ": {"node": 3}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["displ"]["node"], 3);
    }

    #[test]
    fn test_null_override() {
        let result = deep_merge(json!({"mode": 3}), json!({"mode": null}));
        assert!(result["mode"].is_null());
    }

    #[test]
    fn test_merge_into_in_place() {
        let mut settings = json!({"artist": {"vertical": 2}, "scale": 1.0});
        merge_into(&mut settings, json!({"artist": {"scale": 1.5}}));

        assert_eq!(settings, json!({"artist": {"vertical": 2, "scale": 1.5}, "scale": 1.0}));
    }

    #[test]
    fn test_merge_idempotent() {
        let base = json!({"artist": {"vertical": 2, "sketches": {"reference": {"node": {}}}}});
        let source = json!({
            "artist": {"sketches": {"reference": {"node": {"show": true}}}},
            "scale": 4
        });

        let once = deep_merge(base, source.clone());
        let twice = deep_merge(once.clone(), source);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_layers() {
        let defaults = json!({
            "scale": 1,
            "canvas": {"type": "gltf"}
        });
        let embedded = json!({
            "scale": 10
        });
        let file = json!({
            "canvas": {"type": "plotly"}
        });
        let overrides = json!({
            "scale": 50
        });

        let result = merge_layers(vec![defaults, embedded, file, overrides]);

        assert_eq!(result["scale"], 50);
        assert_eq!(result["canvas"]["type"], "plotly");
    }

    #[test]
    fn test_nested_deep_merge() {
        let base = json!({
            "artist": {
                "sketches": {
                    "reference": {"node": {"size": 1}, "element": {}}
                }
            }
        });
        let overlay = json!({
            "artist": {
                "sketches": {
                    "reference": {"node": {"color": "red"}}
                }
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["artist"]["sketches"]["reference"]["node"]["size"], 1);
        assert_eq!(result["artist"]["sketches"]["reference"]["node"]["color"], "red");
        assert!(result["artist"]["sketches"]["reference"]["element"].is_object());
    }

    #[test]
    fn test_ambiguity_detection() {
        assert!(is_ambiguous(&json!({}), &json!(1)));
        assert!(is_ambiguous(&json!([1]), &json!({})));
        assert!(!is_ambiguous(&json!(null), &json!({})));
        assert!(!is_ambiguous(&json!(1), &json!("x")));
    }
}
