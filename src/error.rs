//! Render errors
//!
//! Everything that can abort a render before a drawing handle exists.

use std::io;

use veux_sketch::MalformedKey;

use crate::canvas::CanvasError;
use crate::config::ConfigError;
use crate::model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("unknown canvas backend '{0}'")]
    UnknownBackend(String),

    #[error(transparent)]
    MalformedVisibilityKey(#[from] MalformedKey),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("canvas error: {0}")]
    Canvas(#[from] CanvasError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
