//! Interactive-display backend (`matplotlib`).
//!
//! Produces no file; displaying writes a per-layer summary to the viewer's
//! output.

use serde_json::Value;
use std::io::Write;

use super::{Canvas, CanvasError, ExportKind, Layer};

const CAPABILITIES: &[ExportKind] = &[ExportKind::Display];

#[derive(Debug)]
pub struct DisplayCanvas {
    layers: Vec<Layer>,
}

impl DisplayCanvas {
    pub fn new(_config: &Value) -> Self {
        Self { layers: Vec::new() }
    }
}

impl Canvas for DisplayCanvas {
    fn name(&self) -> &str {
        "matplotlib"
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

    fn display(&self, out: &mut dyn Write) -> Result<(), CanvasError> {
        for layer in &self.layers {
            writeln!(out, "{:<24} {} primitive(s)", layer.name(), layer.primitives.len())?;
        }
        Ok(())
    }
}
