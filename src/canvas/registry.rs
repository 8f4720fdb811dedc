//! Canvas backend registry.
//!
//! Maps backend identifiers to factories. Built once at startup and only
//! read afterwards.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::{Canvas, DisplayCanvas, GltfCanvas, HtmlCanvas};

/// Builds a canvas from the `canvas` settings section
pub type CanvasFactory = fn(&Value) -> Box<dyn Canvas>;

/// Backend used when neither the caller nor the settings name one
pub const DEFAULT_CANVAS: &str = "gltf";

#[derive(Clone, Default)]
pub struct CanvasRegistry {
    factories: BTreeMap<String, CanvasFactory>,
}

impl fmt::Debug for CanvasRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

fn gltf(config: &Value) -> Box<dyn Canvas> {
    Box::new(GltfCanvas::new("gltf", config))
}

fn trimesh(config: &Value) -> Box<dyn Canvas> {
    Box::new(GltfCanvas::new("trimesh", config))
}

fn plotly(config: &Value) -> Box<dyn Canvas> {
    Box::new(HtmlCanvas::new(config))
}

fn matplotlib(config: &Value) -> Box<dyn Canvas> {
    Box::new(DisplayCanvas::new(config))
}

impl CanvasRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `gltf`, `plotly`, `matplotlib` and `trimesh`
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("gltf", gltf);
        registry.register("trimesh", trimesh);
        registry.register("plotly", plotly);
        registry.register("matplotlib", matplotlib);
        registry
    }

    /// Add or replace a backend
    pub fn register(&mut self, name: &str, factory: CanvasFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered identifiers, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Construct backend `name`, or `None` if it is not registered
    pub fn create(&self, name: &str, config: &Value) -> Option<Box<dyn Canvas>> {
        self.factories.get(name).map(|factory| factory(config))
    }
}
