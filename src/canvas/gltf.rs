//! GLB scene export.
//!
//! Binary layout (little endian):
//!
//! ```text
//! magic "glTF" | version u32 | total length u32
//! chunk length u32 | chunk type "JSON" | JSON bytes padded with spaces to 4
//! ```

use serde_json::{json, Value};

use super::{scene_json, Canvas, CanvasError, ExportKind, Layer, Primitive};

pub const GLB_MAGIC: &[u8; 4] = b"glTF";
pub const GLB_VERSION: u32 = 2;
pub const GLB_HEADER_LEN: usize = 12;
/// Chunk type "JSON"
pub const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;

const CAPABILITIES: &[ExportKind] = &[ExportKind::Glb, ExportKind::Html];

/// Canvas exporting a binary glTF scene. Backs both `gltf` and `trimesh`.
#[derive(Debug)]
pub struct GltfCanvas {
    name: &'static str,
    generator: String,
    layers: Vec<Layer>,
}

impl GltfCanvas {
    pub fn new(name: &'static str, config: &Value) -> Self {
        let generator = config
            .get("generator")
            .and_then(Value::as_str)
            .unwrap_or("veux")
            .to_string();
        Self {
            name,
            generator,
            layers: Vec::new(),
        }
    }

    /// glTF JSON document: one parent node per layer, one child per primitive.
    pub fn document(&self) -> Value {
        let mut nodes: Vec<Value> = Vec::new();
        let mut roots = Vec::new();

        for layer in &self.layers {
            let first_child = nodes.len() + 1;
            let children: Vec<usize> =
                (first_child..first_child + layer.primitives.len()).collect();
            roots.push(nodes.len());
            nodes.push(json!({
                "name": layer.name(),
                "children": children,
                "extras": {"style": layer.style},
            }));
            for primitive in &layer.primitives {
                nodes.push(match primitive {
                    Primitive::Point { tag, position } => json!({
                        "name": format!("{} {}", layer.attribute, tag),
                        "translation": position,
                    }),
                    Primitive::Polyline { tag, points } => json!({
                        "name": format!("{} {}", layer.attribute, tag),
                        "extras": {"points": points},
                    }),
                });
            }
        }

        json!({
            "asset": {"version": "2.0", "generator": self.generator},
            "scene": 0,
            "scenes": [{"nodes": roots}],
            "nodes": nodes,
        })
    }
}

impl Canvas for GltfCanvas {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> &'static [ExportKind] {
        CAPABILITIES
    }

    fn draw_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    fn layers(&self) -> &[Layer] {
        &self.layers
    }

    fn to_glb(&self) -> Result<Vec<u8>, CanvasError> {
        encode_glb(&self.document())
    }

    fn to_html(&self) -> Result<String, CanvasError> {
        super::html::render_document(&self.generator, &scene_json(&self.layers))
    }
}

/// Pack a glTF JSON document into a GLB container.
pub fn encode_glb(document: &Value) -> Result<Vec<u8>, CanvasError> {
    let mut chunk = serde_json::to_vec(document)?;
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }

    let total = GLB_HEADER_LEN + 8 + chunk.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&chunk);
    Ok(out)
}
