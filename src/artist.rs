//! Frame artist
//!
//! Owns the model, the resolved settings and the canvas. Drawing walks the
//! `reference` sketch (and `displaced` when a state is present) and sends one
//! layer per visible attribute to the canvas.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use veux_sketch::{is_visible, sketch_attributes, VisibilityKey, DISPLACED, REFERENCE, SHOW_FLAG};

use crate::canvas::{Canvas, CanvasError, ExportKind, Layer, Primitive};
use crate::config::Settings;
use crate::error::RenderError;
use crate::model::{Displacements, ModelData, NodeDisplacements};

pub struct FrameArtist {
    model: ModelData,
    settings: Settings,
    canvas: Box<dyn Canvas>,
    state: Option<Displacements>,
    drawn: bool,
}

impl std::fmt::Debug for FrameArtist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameArtist")
            .field("model", &self.model)
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("drawn", &self.drawn)
            .finish_non_exhaustive()
    }
}

impl FrameArtist {
    pub fn new(model: ModelData, settings: Settings, canvas: Box<dyn Canvas>) -> Self {
        Self {
            model,
            settings,
            canvas,
            state: None,
            drawn: false,
        }
    }

    pub fn model(&self) -> &ModelData {
        &self.model
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn canvas(&self) -> &dyn Canvas {
        self.canvas.as_ref()
    }

    pub fn state(&self) -> Option<&Displacements> {
        self.state.as_ref()
    }

    /// Add displacement cases; later cases extend earlier ones.
    pub fn add_state(&mut self, state: Displacements) {
        debug!(cases = state.len(), "adding state");
        match &mut self.state {
            Some(existing) => existing.extend(state),
            None => self.state = Some(state),
        }
    }

    /// Draw every visible layer onto the canvas. Drawing twice is a no-op.
    pub fn draw(&mut self) -> Result<(), RenderError> {
        if self.drawn {
            return Ok(());
        }

        let displacement = match &self.state {
            Some(state) if !state.is_empty() => Some(state.case(self.settings.mode())?.clone()),
            _ => None,
        };

        let mut layers = self.sketch_layers(REFERENCE, None);
        if let Some(case) = &displacement {
            layers.extend(self.sketch_layers(DISPLACED, Some(case)));
        }

        info!(canvas = self.canvas.name(), layers = layers.len(), "drawing");
        for layer in layers {
            self.canvas.draw_layer(layer);
        }
        self.drawn = true;
        Ok(())
    }

    /// Write the canvas export matching the file extension of `path`.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let export = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ExportKind::from_extension)
            .ok_or_else(|| CanvasError::UnknownExtension(path.display().to_string()))?;

        match export {
            ExportKind::Glb => fs::write(path, self.canvas.to_glb()?)?,
            ExportKind::Html => fs::write(path, self.canvas.to_html()?)?,
            ExportKind::Display => {
                return Err(CanvasError::Unsupported {
                    canvas: self.canvas.name().to_string(),
                    export,
                }
                .into())
            }
        }
        info!(path = %path.display(), export = export.as_str(), "saved rendering");
        Ok(())
    }

    fn sketch_layers(&self, sketch: &str, displacement: Option<&NodeDisplacements>) -> Vec<Layer> {
        let artist = self.settings.artist();
        let mut layers = Vec::new();

        for attribute in sketch_attributes(artist, sketch) {
            let visible = VisibilityKey::attribute(sketch, &attribute)
                .map(|key| is_visible(artist, &key))
                .unwrap_or(false);
            if !visible {
                continue;
            }

            let primitives = match attribute.as_str() {
                "node" => self.node_primitives(displacement),
                "element" => self.element_primitives(displacement),
                other => {
                    debug!(sketch, attribute = other, "no geometry for attribute");
                    continue;
                }
            };

            layers.push(Layer {
                sketch: sketch.to_string(),
                attribute: attribute.clone(),
                style: style_of(&artist["sketches"][sketch][&attribute]),
                primitives,
            });
        }
        layers
    }

    fn node_primitives(&self, displacement: Option<&NodeDisplacements>) -> Vec<Primitive> {
        self.model
            .nodes()
            .iter()
            .map(|node| Primitive::Point {
                tag: node.name,
                position: self.position(node.name, &node.crd, displacement),
            })
            .collect()
    }

    fn element_primitives(&self, displacement: Option<&NodeDisplacements>) -> Vec<Primitive> {
        self.model
            .elements()
            .iter()
            .map(|element| Primitive::Polyline {
                tag: element.name,
                points: element
                    .nodes
                    .iter()
                    .filter_map(|tag| self.model.node(*tag))
                    .map(|node| self.position(node.name, &node.crd, displacement))
                    .collect(),
            })
            .collect()
    }

    /// Scene position of a node: padded to 3D, shifted, displaced by its
    /// translational components, then z-up mapped to y-up when `vertical`
    /// is 3.
    fn position(
        &self,
        tag: u64,
        crd: &[f64],
        displacement: Option<&NodeDisplacements>,
    ) -> [f64; 3] {
        let mut xyz = pad3(crd);
        for (axis, offset) in xyz.iter_mut().zip(self.settings.model_shift()) {
            *axis += offset;
        }
        if let Some(u) = displacement.and_then(|case| case.get(&tag)) {
            let translations = self
                .settings
                .state_translations()
                .unwrap_or(crd.len())
                .min(u.len());
            let scale = self.settings.scale();
            for (axis, delta) in xyz.iter_mut().zip(pad3(&u[..translations])) {
                *axis += scale * delta;
            }
        }
        match self.settings.vertical() {
            3 => [xyz[0], xyz[2], -xyz[1]],
            _ => xyz,
        }
    }
}

fn pad3(values: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
    out
}

fn style_of(table: &Value) -> Value {
    let mut style = table.clone();
    if let Value::Object(map) = &mut style {
        map.remove(SHOW_FLAG);
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CanvasRegistry;
    use crate::config::{ConfigLayer, ConfigOrigin};
    use serde_json::json;

    fn model() -> ModelData {
        ModelData::from_value(json!({
            "StructuralAnalysisModel": {"geometry": {
                "nodes": [
                    {"name": 1, "crd": [0.0, 0.0, 0.0]},
                    {"name": 2, "crd": [0.0, 3.0, 0.0]},
                    {"name": 3, "crd": [4.0, 3.0]}
                ],
                "elements": [
                    {"name": 1, "type": "Truss", "nodes": [1, 2]},
                    {"name": 2, "type": "Truss", "nodes": [2, 3]}
                ]
            }}
        }))
        .unwrap()
    }

    fn artist(overrides: Value) -> FrameArtist {
        let settings = Settings::build(vec![
            ConfigLayer::builtin(),
            ConfigLayer::new(ConfigOrigin::Overrides, overrides),
        ])
        .unwrap();
        let canvas = CanvasRegistry::builtin().create("gltf", settings.canvas()).unwrap();
        FrameArtist::new(model(), settings, canvas)
    }

    #[test]
    fn test_default_draw_shows_elements_only() {
        let mut artist = artist(json!({}));
        artist.draw().unwrap();

        let layers = artist.canvas().layers();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].name(), "reference:element");
        assert_eq!(layers[0].style, json!({"color": "black"}));
        assert_eq!(layers[0].primitives.len(), 2);
    }

    #[test]
    fn test_hidden_sketch_draws_nothing() {
        let mut artist = artist(json!({"artist": {"sketches": {"reference": {"show": false}}}}));
        artist.add_state(Displacements::from_value(&json!({"2": [0.1, 0.0, 0.0]})).unwrap());
        artist.draw().unwrap();

        let names: Vec<String> = artist.canvas().layers().iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["displaced:element"]);
    }

    #[test]
    fn test_draw_is_idempotent() {
        let mut artist = artist(json!({}));
        artist.draw().unwrap();
        artist.draw().unwrap();
        assert_eq!(artist.canvas().layers().len(), 1);
    }

    #[test]
    fn test_node_layer_pads_coordinates() {
        let mut artist = artist(json!({
            "artist": {"sketches": {"reference": {"node": {"show": true}}}}
        }));
        artist.draw().unwrap();

        let nodes = artist
            .canvas()
            .layers()
            .iter()
            .find(|l| l.attribute == "node")
            .unwrap();
        assert_eq!(
            nodes.primitives[2],
            Primitive::Point { tag: 3, position: [4.0, 3.0, 0.0] }
        );
    }

    #[test]
    fn test_displaced_sketch_needs_state() {
        let mut artist = artist(json!({"scale": 10.0}));
        artist.add_state(Displacements::from_value(&json!({"2": [0.1, 0.0, 0.0]})).unwrap());
        artist.draw().unwrap();

        let layers = artist.canvas().layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].name(), "displaced:element");
        let Primitive::Polyline { points, .. } = &layers[1].primitives[0] else {
            panic!("expected polyline");
        };
        assert_eq!(points[1], [1.0, 3.0, 0.0]);
    }

    #[test]
    fn test_model_shift_moves_reference() {
        let mut artist = artist(json!({"model": {"shift": [10.0, 0.0, 1.0]}}));
        artist.draw().unwrap();
        let Primitive::Polyline { points, .. } = &artist.canvas().layers()[0].primitives[1] else {
            panic!("expected polyline");
        };
        assert_eq!(points[1], [14.0, 3.0, 1.0]);
    }

    #[test]
    fn test_rotations_are_not_translated() {
        // node 3 is planar: [ux, uy, rz]
        let mut planar = artist(json!({}));
        planar.add_state(Displacements::from_value(&json!({"3": [0.5, 0.0, 0.2]})).unwrap());
        planar.draw().unwrap();
        let Primitive::Polyline { points, .. } = &planar.canvas().layers()[1].primitives[1] else {
            panic!("expected polyline");
        };
        assert_eq!(points[1], [4.5, 3.0, 0.0]);

        let mut axial = artist(json!({"state": {"translations": 1}}));
        axial.add_state(Displacements::from_value(&json!({"3": [0.5, 0.7, 0.2]})).unwrap());
        axial.draw().unwrap();
        let Primitive::Polyline { points, .. } = &axial.canvas().layers()[1].primitives[1] else {
            panic!("expected polyline");
        };
        assert_eq!(points[1], [4.5, 3.0, 0.0]);
    }

    #[test]
    fn test_vertical_z_up() {
        let mut artist = artist(json!({"artist": {"vertical": 3}}));
        artist.draw().unwrap();
        let Primitive::Polyline { points, .. } = &artist.canvas().layers()[0].primitives[0] else {
            panic!("expected polyline");
        };
        assert_eq!(points[1], [0.0, 0.0, -3.0]);
    }

    #[test]
    fn test_missing_mode_is_error() {
        let mut artist = artist(json!({"mode": 4}));
        artist.add_state(Displacements::from_value(&json!({"1": [0.0]})).unwrap());
        assert!(matches!(artist.draw(), Err(RenderError::Model(_))));
    }

    #[test]
    fn test_save_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut artist = artist(json!({}));
        artist.draw().unwrap();

        let glb = dir.path().join("model.glb");
        artist.save(&glb).unwrap();
        assert_eq!(&fs::read(&glb).unwrap()[0..4], b"glTF");

        let html = dir.path().join("model.html");
        artist.save(&html).unwrap();
        assert!(fs::read_to_string(&html).unwrap().contains("veux-scene"));

        let png = dir.path().join("model.png");
        assert!(matches!(
            artist.save(&png),
            Err(RenderError::Canvas(CanvasError::UnknownExtension(_)))
        ));
    }
}
