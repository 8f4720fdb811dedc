//! veux - structural model rendering
//!
//! This crate turns a structural analysis model (nodes, elements and an
//! optional displaced state) into a scene on a pluggable canvas backend.
//! Settings are layered from builtin defaults, the model's embedded
//! configuration, config files and caller overrides; visibility directives
//! are resolved into the artist section before anything is drawn.

pub mod artist;
pub mod canvas;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod serve;
pub mod visibility;

pub use artist::FrameArtist;
pub use canvas::{Canvas, CanvasRegistry, ExportKind};
pub use config::{deep_merge, parse_override, ConfigError, Settings};
pub use error::RenderError;
pub use model::{Displacements, ModelData, ModelError, ModelSource};
pub use render::{render, render_mode, RenderRequest};
pub use serve::{serve, ServeError, ServeOptions, StagingViewer, Viewer};
pub use visibility::{VisibilityPlan, VisibilityRequest};

pub use veux_sketch as sketch;
