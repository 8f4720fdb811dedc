//! Built-in render defaults (lowest-precedence layer)
//!
//! Hardcoded defaults for every settings section.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use veux_sketch::{DISPLACED, REFERENCE};

/// Attributes every sketch declares, so exclusive directives have siblings
/// to narrow even before any flag is set.
pub const SKETCH_ATTRIBUTES: &[&str] = &["node", "element", "section", "fiber"];

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Vertical axis of the model coordinates (default: 2, y-up)
    pub vertical: u8,

    /// Canvas backend (default: "gltf")
    pub canvas_type: String,

    /// Displacement scale factor (default: 1.0)
    pub scale: f64,

    /// Exclusive hide policy (default: "retain")
    pub exclusive_hide: String,

    /// Node marker size (default: 1.0)
    pub node_size: f64,

    /// Element line color (default: "black")
    pub element_color: String,

    /// Displaced element line color (default: "red")
    pub displaced_color: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            vertical: 2,
            canvas_type: "gltf".to_string(),
            scale: 1.0,
            exclusive_hide: "retain".to_string(),
            node_size: 1.0,
            element_color: "black".to_string(),
            displaced_color: "red".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> Value {
        json!({
            "artist": {
                "vertical": self.vertical,
                "exclusive_hide": self.exclusive_hide,
                "sketches": {
                    REFERENCE: self.sketch(&self.element_color),
                    DISPLACED: self.sketch(&self.displaced_color),
                }
            },
            "canvas": {
                "type": self.canvas_type
            },
            "model": {},
            "state": {},
            "scale": self.scale,
            "mode": null,
            "displ": null
        })
    }

    /// Elements are the only attribute shown out of the box.
    fn sketch(&self, color: &str) -> Value {
        let mut table = serde_json::Map::new();
        for attribute in SKETCH_ATTRIBUTES {
            let entry = match *attribute {
                "node" => json!({"size": self.node_size}),
                "element" => json!({"show": true, "color": color}),
                _ => json!({}),
            };
            table.insert(attribute.to_string(), entry);
        }
        Value::Object(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.vertical, 2);
        assert_eq!(defaults.canvas_type, "gltf");
        assert_eq!(defaults.scale, 1.0);
        assert_eq!(defaults.exclusive_hide, "retain");
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["artist"]["vertical"], 2);
        assert_eq!(value["canvas"]["type"], "gltf");
        assert_eq!(value["scale"], 1.0);
        assert!(value["mode"].is_null());
        assert_eq!(value["artist"]["sketches"]["reference"]["element"]["show"], true);
        assert!(value["artist"]["sketches"]["reference"]["node"].get("show").is_none());
        assert_eq!(value["artist"]["sketches"]["displaced"]["element"]["color"], "red");
    }

    #[test]
    fn test_every_sketch_declares_attributes() {
        let value = BuiltinDefaults::default().to_value();
        for sketch in [REFERENCE, DISPLACED] {
            let attributes = veux_sketch::sketch_attributes(&value["artist"], sketch);
            assert_eq!(attributes.len(), SKETCH_ATTRIBUTES.len());
        }
    }
}
