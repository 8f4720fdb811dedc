//! Visibility keys.
//!
//! A key names either a whole sketch (`reference`) or an attribute path
//! inside it (`reference:node`, `displaced:element.outline`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the sketch and the attribute path.
pub const SKETCH_SEPARATOR: char = ':';

/// Separator between nested attribute segments.
pub const PATH_SEPARATOR: char = '.';

/// Flag name stored in every sketch table; cannot be used as an attribute.
pub const SHOW_FLAG: &str = "show";

/// A key that could not be parsed into sketch and attribute path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed visibility key '{key}': {reason}")]
pub struct MalformedKey {
    pub key: String,
    pub reason: &'static str,
}

impl MalformedKey {
    fn new(key: &str, reason: &'static str) -> Self {
        Self {
            key: key.to_string(),
            reason,
        }
    }
}

/// Structured visibility key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisibilityKey {
    sketch: String,
    path: Vec<String>,
}

impl VisibilityKey {
    /// Parse `<sketch>` or `<sketch>:<attr>[.<attr>...]`.
    pub fn parse(raw: &str) -> Result<Self, MalformedKey> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MalformedKey::new(raw, "empty key"));
        }

        let (sketch, attribute) = match trimmed.split_once(SKETCH_SEPARATOR) {
            Some((sketch, attribute)) => (sketch.trim(), Some(attribute.trim())),
            None => (trimmed, None),
        };

        if sketch.is_empty() {
            return Err(MalformedKey::new(raw, "missing sketch name"));
        }
        if sketch.contains(PATH_SEPARATOR) {
            return Err(MalformedKey::new(raw, "sketch name cannot contain '.'"));
        }
        if sketch == SHOW_FLAG {
            return Err(MalformedKey::new(raw, "'show' is reserved"));
        }

        let path = match attribute {
            None => Vec::new(),
            Some(attribute) => {
                if attribute.contains(SKETCH_SEPARATOR) {
                    return Err(MalformedKey::new(raw, "more than one ':' separator"));
                }
                if attribute.is_empty() {
                    return Err(MalformedKey::new(raw, "empty attribute after ':'"));
                }
                let mut segments = Vec::new();
                for segment in attribute.split(PATH_SEPARATOR) {
                    let segment = segment.trim();
                    if segment.is_empty() {
                        return Err(MalformedKey::new(raw, "empty attribute segment"));
                    }
                    if segment == SHOW_FLAG {
                        return Err(MalformedKey::new(raw, "'show' is reserved"));
                    }
                    segments.push(segment.to_string());
                }
                segments
            }
        };

        Ok(Self {
            sketch: sketch.to_string(),
            path,
        })
    }

    /// Key for a whole sketch.
    pub fn sketch(name: &str) -> Result<Self, MalformedKey> {
        let key = Self::parse(name)?;
        if !key.path.is_empty() {
            return Err(MalformedKey::new(name, "expected a bare sketch name"));
        }
        Ok(key)
    }

    /// Key for an attribute of `sketch`. The attribute may be dotted.
    pub fn attribute(sketch: &str, attribute: &str) -> Result<Self, MalformedKey> {
        Self::parse(&format!("{}{}{}", sketch, SKETCH_SEPARATOR, attribute))
    }

    pub fn sketch_name(&self) -> &str {
        &self.sketch
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// True if the key addresses the whole sketch.
    pub fn is_sketch(&self) -> bool {
        self.path.is_empty()
    }

    /// Key naming a sibling at the same level, with `name` as last segment.
    pub fn sibling(&self, name: &str) -> Self {
        if self.path.is_empty() {
            return Self {
                sketch: name.to_string(),
                path: Vec::new(),
            };
        }
        let mut path = self.path.clone();
        if let Some(last) = path.last_mut() {
            *last = name.to_string();
        }
        Self {
            sketch: self.sketch.clone(),
            path,
        }
    }

    /// Last segment: the attribute name, or the sketch name for bare keys.
    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or(&self.sketch)
    }
}

impl fmt::Display for VisibilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sketch)?;
        if !self.path.is_empty() {
            write!(f, "{}{}", SKETCH_SEPARATOR, self.path.join("."))?;
        }
        Ok(())
    }
}

impl FromStr for VisibilityKey {
    type Err = MalformedKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VisibilityKey {
    type Error = MalformedKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VisibilityKey> for String {
    fn from(key: VisibilityKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_sketch() {
        let key = VisibilityKey::parse("reference").unwrap();
        assert_eq!(key.sketch_name(), "reference");
        assert!(key.is_sketch());
        assert_eq!(key.leaf(), "reference");
    }

    #[test]
    fn test_parse_attribute() {
        let key = VisibilityKey::parse("displaced:fiber").unwrap();
        assert_eq!(key.sketch_name(), "displaced");
        assert_eq!(key.path(), &["fiber".to_string()]);
        assert_eq!(key.to_string(), "displaced:fiber");
    }

    #[test]
    fn test_parse_nested_path() {
        let key = VisibilityKey::parse("reference:element.outline").unwrap();
        assert_eq!(key.path().len(), 2);
        assert_eq!(key.leaf(), "outline");
        assert_eq!(key.to_string(), "reference:element.outline");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let key = VisibilityKey::parse(" reference : node ").unwrap();
        assert_eq!(key.to_string(), "reference:node");
    }

    #[test]
    fn test_malformed_keys() {
        for raw in [
            "",
            "   ",
            ":node",
            "reference:",
            "a:b:c",
            "reference:node..x",
            "reference:show",
            "a.b",
        ] {
            let err = VisibilityKey::parse(raw).unwrap_err();
            assert_eq!(err.key, raw, "wrong key echoed for {:?}", raw);
        }
    }

    #[test]
    fn test_error_message_names_key() {
        let err = VisibilityKey::parse(":node").unwrap_err();
        assert!(err.to_string().contains("':node'"));
        assert!(err.to_string().contains("missing sketch"));
    }

    #[test]
    fn test_sibling() {
        let key = VisibilityKey::parse("reference:element.outline").unwrap();
        assert_eq!(key.sibling("surface").to_string(), "reference:element.surface");

        let bare = VisibilityKey::parse("reference").unwrap();
        assert_eq!(bare.sibling("displaced").to_string(), "displaced");
    }

    #[test]
    fn test_constructors() {
        assert!(VisibilityKey::sketch("reference:node").is_err());
        let key = VisibilityKey::attribute("reference", "node").unwrap();
        assert_eq!(key, "reference:node".parse().unwrap());
    }

    #[test]
    fn test_serde_as_string() {
        let key = VisibilityKey::parse("reference:node").unwrap();
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json, serde_json::json!("reference:node"));

        let back: VisibilityKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);

        let bad: Result<VisibilityKey, _> = serde_json::from_value(serde_json::json!(":x"));
        assert!(bad.is_err());
    }
}
