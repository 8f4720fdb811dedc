//! Drawing backends
//!
//! A canvas receives [`Layer`]s from the artist and exports them. What a
//! canvas can export is declared once through [`Canvas::capabilities`];
//! callers never probe for export methods.

mod display;
mod gltf;
mod html;
mod registry;

pub use display::DisplayCanvas;
pub use gltf::{encode_glb, GltfCanvas, GLB_CHUNK_JSON, GLB_HEADER_LEN, GLB_MAGIC, GLB_VERSION};
pub use html::HtmlCanvas;
pub use registry::{CanvasFactory, CanvasRegistry, DEFAULT_CANVAS};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::Write;

/// Export capability of a canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Binary 3D scene (GLB)
    Glb,
    /// Self-contained markup document
    Html,
    /// Interactive display
    Display,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Glb => "glb",
            ExportKind::Html => "html",
            ExportKind::Display => "display",
        }
    }

    /// Export matching a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "glb" => Some(ExportKind::Glb),
            "html" | "htm" => Some(ExportKind::Html),
            _ => None,
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One drawable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Primitive {
    Point { tag: u64, position: [f64; 3] },
    Polyline { tag: u64, points: Vec<[f64; 3]> },
}

/// Primitives drawn for one sketch attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub sketch: String,
    pub attribute: String,
    /// Attribute table from the artist settings, without its `show` flag
    pub style: Value,
    pub primitives: Vec<Primitive>,
}

impl Layer {
    /// `sketch:attribute`
    pub fn name(&self) -> String {
        format!("{}:{}", self.sketch, self.attribute)
    }
}

/// Drawing backend interface
pub trait Canvas {
    /// Registry identifier
    fn name(&self) -> &str;

    /// Exports this canvas supports, in preference order
    fn capabilities(&self) -> &'static [ExportKind];

    fn draw_layer(&mut self, layer: Layer);

    fn layers(&self) -> &[Layer];

    fn supports(&self, export: ExportKind) -> bool {
        self.capabilities().contains(&export)
    }

    fn to_glb(&self) -> Result<Vec<u8>, CanvasError> {
        Err(CanvasError::Unsupported {
            canvas: self.name().to_string(),
            export: ExportKind::Glb,
        })
    }

    fn to_html(&self) -> Result<String, CanvasError> {
        Err(CanvasError::Unsupported {
            canvas: self.name().to_string(),
            export: ExportKind::Html,
        })
    }

    fn display(&self, _out: &mut dyn Write) -> Result<(), CanvasError> {
        Err(CanvasError::Unsupported {
            canvas: self.name().to_string(),
            export: ExportKind::Display,
        })
    }
}

/// Scene document shared by the exporters
pub(crate) fn scene_json(layers: &[Layer]) -> Value {
    serde_json::json!({ "layers": layers })
}

/// Canvas errors
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("canvas '{canvas}' does not support {export} export")]
    Unsupported { canvas: String, export: ExportKind },

    #[error("no export for file extension of '{0}'")]
    UnknownExtension(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
