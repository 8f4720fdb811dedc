//! Render orchestration
//!
//! One render:
//! - Read the model
//! - Layer settings: defaults < embedded `RendererConfiguration` < vertical
//!   < config files < overrides
//! - Resolve visibility directives into the artist section
//! - Construct the canvas and artist, add state, draw
//!
//! Every structural error is raised before the canvas is drawn.

use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::artist::FrameArtist;
use crate::canvas::{CanvasRegistry, DEFAULT_CANVAS};
use crate::config::{ConfigLayer, ConfigOrigin, Settings, MODE, SCALE};
use crate::error::RenderError;
use crate::model::{Displacements, ModelData, ModelSource};
use crate::visibility::{VisibilityPlan, VisibilityRequest};

/// Inputs of one render
#[derive(Debug, Default)]
pub struct RenderRequest {
    pub model: Option<ModelSource>,
    pub state: Option<ModelSource>,
    /// Canvas identifier; falls back to `canvas.type` from settings
    pub canvas: Option<String>,
    pub visibility: VisibilityRequest,
    /// Vertical axis, applied above the embedded configuration
    pub vertical: Option<u8>,
    /// TOML files merged in order above the embedded configuration
    pub config_files: Vec<PathBuf>,
    /// Caller options, merged last in order
    pub overrides: Vec<Value>,
}

impl RenderRequest {
    pub fn new(model: impl Into<ModelSource>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<ModelSource>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_canvas(mut self, canvas: &str) -> Self {
        self.canvas = Some(canvas.to_string());
        self
    }

    pub fn with_override(mut self, options: Value) -> Self {
        self.overrides.push(options);
        self
    }

    pub fn show(mut self, attributes: &[&str]) -> Self {
        self.visibility.show = Some(to_strings(attributes));
        self
    }

    pub fn reference(mut self, attributes: &[&str]) -> Self {
        self.visibility.reference = Some(to_strings(attributes));
        self
    }

    pub fn displaced(mut self, attributes: &[&str]) -> Self {
        self.visibility.displaced = Some(to_strings(attributes));
        self
    }

    pub fn hide(mut self, attributes: &[&str]) -> Self {
        self.visibility.hide = Some(to_strings(attributes));
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Build the settings for `model` without drawing anything.
pub fn build_settings(
    model: &ModelData,
    vertical: Option<u8>,
    config_files: &[PathBuf],
    overrides: &[Value],
) -> Result<Settings, RenderError> {
    let mut layers = vec![ConfigLayer::builtin()];

    if let Some(embedded) = model.renderer_configuration() {
        layers.push(ConfigLayer::new(ConfigOrigin::Model, embedded.clone()));
    }

    if let Some(vertical) = vertical {
        layers.push(ConfigLayer::new(
            ConfigOrigin::Overrides,
            json!({"artist": {"vertical": vertical}}),
        ));
    }

    for path in config_files {
        layers.push(ConfigLayer::from_toml_file(path)?);
    }

    for options in overrides {
        layers.push(ConfigLayer::new(ConfigOrigin::Overrides, options.clone()));
    }

    Ok(Settings::build(layers)?)
}

/// Render a model with the given canvas registry.
pub fn render(
    request: RenderRequest,
    registry: &CanvasRegistry,
) -> Result<FrameArtist, RenderError> {
    let RenderRequest {
        model,
        state,
        canvas,
        visibility,
        vertical,
        config_files,
        overrides,
    } = request;

    let source = model.ok_or(RenderError::MissingInput("model"))?;
    info!(source = source.kind(), "reading model");
    let model = source.read()?;

    let plan = VisibilityPlan::from_request(&visibility)?;

    let mut settings = build_settings(&model, vertical, &config_files, &overrides)?;
    plan.apply(settings.artist_mut());
    debug!(artist = %settings.artist(), "resolved artist settings");

    let mut states = Vec::new();
    if let Some(state) = state {
        states.push(Displacements::from_value(&state.into_value()?)?);
    } else if let Some(displ) = settings.displ() {
        states.push(Displacements::from_value(displ)?);
    }
    if let Some(embedded) = model.displacements() {
        states.push(Displacements::from_value(embedded)?);
    }

    let canvas_name = canvas
        .or_else(|| settings.canvas_type().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CANVAS.to_string());
    let canvas = registry
        .create(&canvas_name, settings.canvas())
        .ok_or(RenderError::UnknownBackend(canvas_name))?;

    let mut artist = FrameArtist::new(model, settings, canvas);
    for state in states {
        artist.add_state(state);
    }
    artist.draw()?;
    Ok(artist)
}

/// Render mode shape `mode` (1-based) of a multi-case state.
///
/// `mode` and `scale` sit just below the request's own overrides, so an
/// explicit `scale` override still wins.
pub fn render_mode(
    request: RenderRequest,
    mode: u64,
    scale: Option<f64>,
    registry: &CanvasRegistry,
) -> Result<FrameArtist, RenderError> {
    let mut request = request;
    let mut options = json!({ MODE: mode });
    if let Some(scale) = scale {
        options[SCALE] = json!(scale);
    }
    request.overrides.insert(0, options);
    render(request, registry)
}
