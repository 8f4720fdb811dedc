//! Serving rendered artifacts
//!
//! The serve target's preferred export is resolved once (binary scene, then
//! markup document, then interactive display) and handed to a [`Viewer`].
//! Network transport belongs to the viewer; [`StagingViewer`] only writes
//! the payload into a directory for an external static server.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::artist::FrameArtist;
use crate::canvas::{Canvas, CanvasError, ExportKind};

/// Default in-browser viewer for binary scenes
pub const DEFAULT_VIEWER: &str = "mv";

/// Something that can be served
pub enum ServeTarget<'a> {
    Artist(&'a FrameArtist),
    Canvas(&'a dyn Canvas),
}

impl<'a> ServeTarget<'a> {
    fn canvas(self) -> &'a dyn Canvas {
        match self {
            ServeTarget::Artist(artist) => artist.canvas(),
            ServeTarget::Canvas(canvas) => canvas,
        }
    }
}

impl<'a> From<&'a FrameArtist> for ServeTarget<'a> {
    fn from(artist: &'a FrameArtist) -> Self {
        ServeTarget::Artist(artist)
    }
}

impl<'a> From<&'a dyn Canvas> for ServeTarget<'a> {
    fn from(canvas: &'a dyn Canvas) -> Self {
        ServeTarget::Canvas(canvas)
    }
}

/// Resolved payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Servable {
    Glb(Vec<u8>),
    Html(String),
    Display,
}

impl Servable {
    /// Pick the best export `canvas` declares.
    pub fn resolve(canvas: &dyn Canvas) -> Result<Self, ServeError> {
        for preferred in [ExportKind::Glb, ExportKind::Html, ExportKind::Display] {
            if !canvas.supports(preferred) {
                continue;
            }
            return Ok(match preferred {
                ExportKind::Glb => Servable::Glb(canvas.to_glb()?),
                ExportKind::Html => Servable::Html(canvas.to_html()?),
                ExportKind::Display => Servable::Display,
            });
        }
        Err(ServeError::Unservable(canvas.name().to_string()))
    }

    pub fn kind(&self) -> ExportKind {
        match self {
            Servable::Glb(_) => ExportKind::Glb,
            Servable::Html(_) => ExportKind::Html,
            Servable::Display => ExportKind::Display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeOptions {
    /// Viewer used for binary scenes
    pub viewer: String,
    pub port: Option<u16>,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            viewer: DEFAULT_VIEWER.to_string(),
            port: None,
        }
    }
}

/// Presents a resolved payload
pub trait Viewer {
    fn serve_glb(&mut self, glb: &[u8], options: &ServeOptions) -> Result<(), ServeError>;

    fn serve_html(&mut self, html: &str, options: &ServeOptions) -> Result<(), ServeError>;

    fn display(&mut self, canvas: &dyn Canvas) -> Result<(), ServeError>;
}

/// Serve an artist or canvas through `viewer`.
pub fn serve<'a>(
    target: impl Into<ServeTarget<'a>>,
    viewer: &mut dyn Viewer,
    options: &ServeOptions,
) -> Result<(), ServeError> {
    let canvas = target.into().canvas();
    let servable = Servable::resolve(canvas)?;
    info!(canvas = canvas.name(), export = servable.kind().as_str(), "serving");

    match servable {
        Servable::Glb(glb) => viewer.serve_glb(&glb, options),
        Servable::Html(html) => viewer.serve_html(&html, options),
        Servable::Display => viewer.display(canvas),
    }
}

/// Writes served payloads into a directory
#[derive(Debug, Clone)]
pub struct StagingViewer {
    dir: PathBuf,
    staged: Vec<PathBuf>,
}

impl StagingViewer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far
    pub fn staged(&self) -> &[PathBuf] {
        &self.staged
    }

    fn write(&mut self, name: &str, contents: &[u8]) -> Result<(), ServeError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, contents)?;
        info!(path = %path.display(), "staged");
        self.staged.push(path);
        Ok(())
    }
}

impl Viewer for StagingViewer {
    fn serve_glb(&mut self, glb: &[u8], options: &ServeOptions) -> Result<(), ServeError> {
        let page = match options.viewer.as_str() {
            "mv" => Some(model_viewer_page("model.glb")),
            "none" => None,
            other => return Err(ServeError::UnknownViewer(other.to_string())),
        };
        self.write("model.glb", glb)?;
        if let Some(page) = page {
            self.write("index.html", page.as_bytes())?;
        }
        if let Some(port) = options.port {
            info!(port, dir = %self.dir.display(), "ready for a static server");
        }
        Ok(())
    }

    fn serve_html(&mut self, html: &str, options: &ServeOptions) -> Result<(), ServeError> {
        self.write("index.html", html.as_bytes())?;
        if let Some(port) = options.port {
            info!(port, dir = %self.dir.display(), "ready for a static server");
        }
        Ok(())
    }

    fn display(&mut self, canvas: &dyn Canvas) -> Result<(), ServeError> {
        let mut summary = Vec::new();
        canvas.display(&mut summary)?;
        self.write("display.txt", &summary)
    }
}

const MODEL_VIEWER_SCRIPT: &str =
    "https://ajax.googleapis.com/ajax/libs/model-viewer/3.5.0/model-viewer.min.js";

fn model_viewer_page(src: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
            "<title>veux</title>\n",
            "<script type=\"module\" src=\"{}\"></script>\n",
            "</head>\n<body style=\"margin:0\">\n",
            "<model-viewer src=\"{}\" camera-controls ",
            "style=\"width:100vw;height:100vh\"></model-viewer>\n",
            "</body>\n</html>\n",
        ),
        MODEL_VIEWER_SCRIPT, src
    )
}

/// Serve errors
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("cannot serve canvas '{0}': no binary scene, markup or display export")]
    Unservable(String),

    #[error("unknown viewer '{0}'")]
    UnknownViewer(String),

    #[error("export failed: {0}")]
    Canvas(#[from] CanvasError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
