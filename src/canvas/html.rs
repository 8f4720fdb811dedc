//! Markup document export (`plotly` backend).

use serde_json::Value;

use super::{scene_json, Canvas, CanvasError, ExportKind, Layer};

const CAPABILITIES: &[ExportKind] = &[ExportKind::Html];

/// Canvas producing a self-contained HTML document with the scene embedded
/// as JSON.
#[derive(Debug)]
pub struct HtmlCanvas {
    title: String,
    layers: Vec<Layer>,
}

impl HtmlCanvas {
    pub fn new(config: &Value) -> Self {
        let title = config
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("veux")
            .to_string();
        Self {
            title,
            layers: Vec::new(),
        }
    }
}

impl Canvas for HtmlCanvas {
    fn name(&self) -> &str {
        "plotly"
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

    fn to_html(&self) -> Result<String, CanvasError> {
        render_document(&self.title, &scene_json(&self.layers))
    }
}

pub(super) fn render_document(title: &str, scene: &Value) -> Result<String, CanvasError> {
    // "</" inside the JSON would end the script element early
    let payload = serde_json::to_string(scene)?.replace("</", "<\\/");
    Ok(format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
            "<title>{}</title>\n</head>\n<body>\n<div id=\"veux\"></div>\n",
            "<script type=\"application/json\" id=\"veux-scene\">{}</script>\n",
            "</body>\n</html>\n",
        ),
        escape(title),
        payload
    ))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
