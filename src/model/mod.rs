//! Model ingest
//!
//! A model enters the system as a [`ModelSource`] and is resolved once into
//! a [`ModelData`] mapping. Only JSON is read here; other formats must be
//! converted by the caller (see [`AsMapping`]).

mod state;

pub use state::{Displacements, NodeDisplacements};

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Key of the embedded renderer configuration
pub const RENDERER_CONFIGURATION: &str = "RendererConfiguration";

/// Key of embedded displacements
pub const DISPLACEMENTS: &str = "Displacements";

/// Key of the analysis model body
pub const STRUCTURAL_ANALYSIS_MODEL: &str = "StructuralAnalysisModel";

/// An object that can convert itself into a model mapping.
pub trait AsMapping {
    fn as_mapping(&self) -> Result<Value, ModelError>;
}

/// Where model (or state) data comes from
pub enum ModelSource {
    /// JSON file on disk
    Path(PathBuf),
    /// Already-structured mapping
    Mapping(Value),
    /// Object providing a conversion to a mapping
    Object(Box<dyn AsMapping>),
    /// Readable JSON stream
    Reader(Box<dyn Read>),
}

impl ModelSource {
    /// Resolve the source into a JSON mapping.
    pub fn into_value(self) -> Result<Value, ModelError> {
        match self {
            ModelSource::Path(path) => read_json_file(&path),
            ModelSource::Mapping(value) => Ok(value),
            ModelSource::Object(object) => object.as_mapping(),
            ModelSource::Reader(reader) => Ok(serde_json::from_reader(reader)?),
        }
    }

    /// Resolve the source into model data.
    pub fn read(self) -> Result<ModelData, ModelError> {
        ModelData::from_value(self.into_value()?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelSource::Path(_) => "path",
            ModelSource::Mapping(_) => "mapping",
            ModelSource::Object(_) => "object",
            ModelSource::Reader(_) => "reader",
        }
    }
}

impl fmt::Debug for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ModelSource::Mapping(value) => f.debug_tuple("Mapping").field(value).finish(),
            ModelSource::Object(_) => f.write_str("Object(..)"),
            ModelSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<PathBuf> for ModelSource {
    fn from(path: PathBuf) -> Self {
        ModelSource::Path(path)
    }
}

impl From<&Path> for ModelSource {
    fn from(path: &Path) -> Self {
        ModelSource::Path(path.to_path_buf())
    }
}

impl From<Value> for ModelSource {
    fn from(value: Value) -> Self {
        ModelSource::Mapping(value)
    }
}

fn read_json_file(path: &Path) -> Result<Value, ModelError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if !is_json {
        return Err(ModelError::UnsupportedFormat(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// A model node
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    pub name: u64,
    pub crd: Vec<f64>,
}

/// A model element
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Element {
    pub name: u64,
    pub nodes: Vec<u64>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct Geometry {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    elements: Vec<Element>,
}

/// Resolved model mapping
#[derive(Debug, Clone)]
pub struct ModelData {
    raw: Value,
    nodes: Vec<Node>,
    elements: Vec<Element>,
    /// Node tag -> position in `nodes`
    node_index: BTreeMap<u64, usize>,
}

impl ModelData {
    pub fn from_value(raw: Value) -> Result<Self, ModelError> {
        if !raw.is_object() {
            return Err(ModelError::InvalidModel(
                "model must be a JSON object".to_string(),
            ));
        }

        let geometry = match raw
            .get(STRUCTURAL_ANALYSIS_MODEL)
            .and_then(|m| m.get("geometry"))
        {
            Some(geometry) => Geometry::deserialize(geometry)
                .map_err(|e| ModelError::InvalidModel(format!("geometry: {}", e)))?,
            None => Geometry::default(),
        };

        let mut node_index = BTreeMap::new();
        for (position, node) in geometry.nodes.iter().enumerate() {
            if node_index.insert(node.name, position).is_some() {
                return Err(ModelError::InvalidModel(format!(
                    "duplicate node {}",
                    node.name
                )));
            }
        }

        for element in &geometry.elements {
            if let Some(missing) = element
                .nodes
                .iter()
                .find(|tag| !node_index.contains_key(tag))
            {
                return Err(ModelError::InvalidModel(format!(
                    "element {} references unknown node {}",
                    element.name, missing
                )));
            }
        }

        Ok(Self {
            raw,
            nodes: geometry.nodes,
            elements: geometry.elements,
            node_index,
        })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn node(&self, tag: u64) -> Option<&Node> {
        self.node_index.get(&tag).map(|&position| &self.nodes[position])
    }

    /// Embedded renderer configuration, if any
    pub fn renderer_configuration(&self) -> Option<&Value> {
        self.raw.get(RENDERER_CONFIGURATION)
    }

    /// Embedded displacements, if any
    pub fn displacements(&self) -> Option<&Value> {
        self.raw.get(DISPLACEMENTS)
    }
}

/// Model errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported model format: {0} (expected .json)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("conversion failed: {0}")]
    Conversion(String),
}
