//! Layered render settings with provenance
//!
//! Settings are built once per render from ordered layers
//! (builtin < model < file < overrides) and record where each layer
//! came from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::defaults::BuiltinDefaults;
use super::merge::merge_into;

pub const ARTIST: &str = "artist";
pub const CANVAS: &str = "canvas";
pub const MODEL: &str = "model";
pub const STATE: &str = "state";
pub const SCALE: &str = "scale";
pub const MODE: &str = "mode";
pub const DISPL: &str = "displ";

/// `model` key: coordinate offset
pub const SHIFT: &str = "shift";

/// `state` key: translational components per displacement vector
pub const TRANSLATIONS: &str = "translations";

/// Section keys every settings value carries.
pub const SECTIONS: &[&str] = &[ARTIST, CANVAS, MODEL, STATE];

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Model,
    File,
    Overrides,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/model/overrides)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// One partial settings source awaiting merge
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigSource,
    pub value: Value,
}

impl ConfigLayer {
    pub fn new(origin: ConfigOrigin, value: Value) -> Self {
        Self {
            source: ConfigSource {
                origin,
                path: None,
                digest: None,
            },
            value,
        }
    }

    /// Built-in defaults layer
    pub fn builtin() -> Self {
        Self::new(ConfigOrigin::Builtin, BuiltinDefaults::default().to_value())
    }

    /// Load a TOML config file as a layer
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let value: Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok(Self {
            source: ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            },
            value,
        })
    }
}

/// Merged render settings (the config store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    value: Value,
    sources: Vec<ConfigSource>,
}

impl Settings {
    /// Merge `layers` in order (first is lowest precedence) and validate.
    pub fn build(layers: Vec<ConfigLayer>) -> Result<Self, ConfigError> {
        let mut settings = Self {
            value: Value::Object(Map::new()),
            sources: Vec::new(),
        };
        for layer in layers {
            settings.merge(layer);
        }
        settings.ensure_sections()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge one more layer on top.
    pub fn merge(&mut self, layer: ConfigLayer) {
        debug!(origin = ?layer.source.origin, path = ?layer.source.path, "merging config layer");
        if !layer.value.is_null() {
            merge_into(&mut self.value, layer.value);
        }
        self.sources.push(layer.source);
    }

    /// Whole merged value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Contributing layers in precedence order
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    pub fn artist(&self) -> &Value {
        &self.value[ARTIST]
    }

    pub fn artist_mut(&mut self) -> &mut Value {
        &mut self.value[ARTIST]
    }

    pub fn canvas(&self) -> &Value {
        &self.value[CANVAS]
    }

    pub fn model(&self) -> &Value {
        &self.value[MODEL]
    }

    pub fn state(&self) -> &Value {
        &self.value[STATE]
    }

    /// Offset added to every node coordinate (`model.shift`)
    pub fn model_shift(&self) -> [f64; 3] {
        let mut shift = [0.0; 3];
        if let Some(values) = self.model().get(SHIFT).and_then(Value::as_array) {
            for (slot, value) in shift.iter_mut().zip(values) {
                *slot = value.as_f64().unwrap_or(0.0);
            }
        }
        shift
    }

    /// Leading displacement components that are translations
    /// (`state.translations`); `None` means one per model coordinate.
    pub fn state_translations(&self) -> Option<usize> {
        self.state()
            .get(TRANSLATIONS)
            .and_then(Value::as_u64)
            .map(|n| n as usize)
    }

    /// Displacement scale factor
    pub fn scale(&self) -> f64 {
        self.value[SCALE].as_f64().unwrap_or(1.0)
    }

    /// Selected mode/case (1-based), if any
    pub fn mode(&self) -> Option<u64> {
        self.value[MODE].as_u64()
    }

    /// Point displacement source, if configured
    pub fn displ(&self) -> Option<&Value> {
        self.value.get(DISPL).filter(|v| !v.is_null())
    }

    /// Canvas identifier requested by configuration
    pub fn canvas_type(&self) -> Option<&str> {
        self.get_str("canvas.type")
    }

    /// Vertical axis of model coordinates
    pub fn vertical(&self) -> u8 {
        self.get_u64("artist.vertical").map(|v| v as u8).unwrap_or(2)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.value;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(|v| v.as_f64())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn ensure_sections(&mut self) -> Result<(), ConfigError> {
        let Value::Object(root) = &mut self.value else {
            return Err(ConfigError::ValidationError(
                "settings root must be a table".to_string(),
            ));
        };
        for section in SECTIONS {
            let entry = root
                .entry(section.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            if !entry.is_object() {
                return Err(ConfigError::ValidationError(format!(
                    "'{}' must be a table, got {}",
                    section, entry
                )));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(scale) = self.value.get(SCALE).filter(|v| !v.is_null()) {
            match scale.as_f64() {
                Some(s) if s.is_finite() => {}
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "scale must be a finite number, got {}",
                        scale
                    )))
                }
            }
        }

        if let Some(vertical) = self.get("artist.vertical") {
            if !matches!(vertical.as_u64(), Some(2) | Some(3)) {
                return Err(ConfigError::ValidationError(format!(
                    "artist.vertical must be 2 or 3, got {}",
                    vertical
                )));
            }
        }

        if let Some(shift) = self.model().get(SHIFT).filter(|v| !v.is_null()) {
            let valid = shift
                .as_array()
                .map(|a| {
                    a.len() <= 3 && a.iter().all(|v| v.as_f64().is_some_and(f64::is_finite))
                })
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::ValidationError(format!(
                    "model.shift must be up to 3 finite numbers, got {}",
                    shift
                )));
            }
        }

        if let Some(translations) = self.state().get(TRANSLATIONS).filter(|v| !v.is_null()) {
            if !matches!(translations.as_u64(), Some(1..=3)) {
                return Err(ConfigError::ValidationError(format!(
                    "state.translations must be 1, 2 or 3, got {}",
                    translations
                )));
            }
        }

        if let Some(mode) = self.value.get(MODE).filter(|v| !v.is_null()) {
            if !matches!(mode.as_u64(), Some(m) if m > 0) {
                return Err(ConfigError::ValidationError(format!(
                    "mode must be a positive integer, got {}",
                    mode
                )));
            }
        }

        Ok(())
    }
}

/// Build an override object from `a.b.c=value`.
///
/// The value is parsed as JSON when possible, otherwise kept as a string.
pub fn parse_override(assignment: &str) -> Result<Value, ConfigError> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| {
            ConfigError::InvalidOverride(format!("expected key=value, got '{}'", assignment))
        })?;

    let path = path.trim();
    if path.is_empty() || path.split('.').any(|part| part.trim().is_empty()) {
        return Err(ConfigError::InvalidOverride(format!(
            "invalid key path in '{}'",
            assignment
        )));
    }

    let raw = raw.trim();
    let mut value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    for part in path.rsplit('.') {
        let mut table = Map::new();
        table.insert(part.trim().to_string(), value);
        value = Value::Object(table);
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid override: {0}")]
    InvalidOverride(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_model_and_state_sections() {
        let settings = Settings::build(vec![
            ConfigLayer::builtin(),
            ConfigLayer::new(
                ConfigOrigin::Overrides,
                json!({"model": {"shift": [1.0, -2.0]}, "state": {"translations": 2}}),
            ),
        ])
        .unwrap();

        assert_eq!(settings.model_shift(), [1.0, -2.0, 0.0]);
        assert_eq!(settings.state_translations(), Some(2));

        let defaults = Settings::build(vec![ConfigLayer::builtin()]).unwrap();
        assert_eq!(defaults.model_shift(), [0.0; 3]);
        assert_eq!(defaults.state_translations(), None);
    }

    #[test]
    fn test_invalid_model_and_state_sections() {
        for overlay in [
            json!({"model": {"shift": [0.0, 0.0, 0.0, 1.0]}}),
            json!({"model": {"shift": "up"}}),
            json!({"state": {"translations": 0}}),
            json!({"state": {"translations": 6}}),
        ] {
            let result = Settings::build(vec![
                ConfigLayer::builtin(),
                ConfigLayer::new(ConfigOrigin::Overrides, overlay.clone()),
            ]);
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "accepted {}",
                overlay
            );
        }
    }

    #[test]
    fn test_build_with_defaults_only() {
        let settings = Settings::build(vec![ConfigLayer::builtin()]).unwrap();

        assert_eq!(settings.vertical(), 2);
        assert_eq!(settings.canvas_type(), Some("gltf"));
        assert_eq!(settings.scale(), 1.0);
        assert_eq!(settings.mode(), None);
        assert!(settings.displ().is_none());
    }

    #[test]
    fn test_layer_precedence() {
        let settings = Settings::build(vec![
            ConfigLayer::builtin(),
            ConfigLayer::new(
                ConfigOrigin::Model,
                json!({"scale": 20, "canvas": {"type": "plotly"}}),
            ),
            ConfigLayer::new(ConfigOrigin::Overrides, json!({"scale": 5})),
        ])
        .unwrap();

        assert_eq!(settings.scale(), 5.0);
        assert_eq!(settings.canvas_type(), Some("plotly"));
        assert_eq!(settings.sources().len(), 3);
        assert_eq!(settings.sources()[1].origin, ConfigOrigin::Model);
    }

    #[test]
    fn test_artist_section_merge() {
        let settings = Settings::build(vec![
            ConfigLayer::new(ConfigOrigin::Builtin, json!({"artist": {"vertical": 2}})),
            ConfigLayer::new(ConfigOrigin::Model, json!({})),
            ConfigLayer::new(ConfigOrigin::Overrides, json!({"artist": {"scale": 1.5}})),
        ])
        .unwrap();

        assert_eq!(settings.artist(), &json!({"vertical": 2, "scale": 1.5}));
        assert_eq!(settings.canvas(), &json!({}));
    }

    #[test]
    fn test_missing_sections_filled() {
        let settings = Settings::build(vec![]).unwrap();
        for section in SECTIONS {
            assert!(settings.value()[*section].is_object());
        }
    }

    #[test]
    fn test_section_must_be_table() {
        let err = Settings::build(vec![ConfigLayer::new(
            ConfigOrigin::Overrides,
            json!({"canvas": "gltf"}),
        )])
        .unwrap_err();
        assert!(err.to_string().contains("'canvas' must be a table"));
    }

    #[test]
    fn test_validation_vertical() {
        let result = Settings::build(vec![
            ConfigLayer::builtin(),
            ConfigLayer::new(ConfigOrigin::Overrides, json!({"artist": {"vertical": 4}})),
        ]);
        assert!(result.unwrap_err().to_string().contains("artist.vertical"));
    }

    #[test]
    fn test_validation_scale_and_mode() {
        let scale = Settings::build(vec![ConfigLayer::new(
            ConfigOrigin::Overrides,
            json!({"scale": "big"}),
        )]);
        assert!(scale.unwrap_err().to_string().contains("scale"));

        let mode = Settings::build(vec![ConfigLayer::new(
            ConfigOrigin::Overrides,
            json!({"mode": 0}),
        )]);
        assert!(mode.unwrap_err().to_string().contains("mode"));
    }

    #[test]
    fn test_load_toml_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "scale = 25.0").unwrap();
        writeln!(temp, "[artist]").unwrap();
        writeln!(temp, "vertical = 3").unwrap();
        writeln!(temp, "[model]").unwrap();
        writeln!(temp, "shift = [1.0, 2]").unwrap();

        let layer = ConfigLayer::from_toml_file(temp.path()).unwrap();
        assert_eq!(layer.source.origin, ConfigOrigin::File);
        assert_eq!(layer.source.digest.as_ref().map(String::len), Some(64));

        let settings = Settings::build(vec![ConfigLayer::builtin(), layer]).unwrap();
        assert_eq!(settings.scale(), 25.0);
        assert_eq!(settings.vertical(), 3);
        assert_eq!(settings.get_str("canvas.type"), Some("gltf"));
        assert_eq!(settings.model_shift(), [1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_load_toml_file_errors() {
        let missing = ConfigLayer::from_toml_file(Path::new("/nonexistent/veux.toml"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));

        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "scale = = 1").unwrap();
        let bad = ConfigLayer::from_toml_file(temp.path());
        assert!(matches!(bad, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("artist.scale=1.5").unwrap(), json!({"artist": {"scale": 1.5}}));
        assert_eq!(
            parse_override("canvas.type=plotly").unwrap(),
            json!({"canvas": {"type": "plotly"}})
        );
        assert_eq!(parse_override("mode = 2").unwrap(), json!({"mode": 2}));
        assert_eq!(
            parse_override("model.shift=[1,0,0]").unwrap(),
            json!({"model": {"shift": [1, 0, 0]}})
        );
    }

    #[test]
    fn test_parse_override_errors() {
        assert!(parse_override("scale").is_err());
        assert!(parse_override("=3").is_err());
        assert!(parse_override("artist..scale=3").is_err());
    }

    #[test]
    fn test_artist_mut() {
        let mut settings = Settings::build(vec![ConfigLayer::builtin()]).unwrap();
        settings.artist_mut()["vertical"] = json!(3);
        assert_eq!(settings.vertical(), 3);
    }
}
