//! Render configuration
//!
//! Settings are layered, lowest precedence first:
//! 1. Built-in defaults
//! 2. `RendererConfiguration` embedded in the model
//! 3. Vertical axis given by the caller
//! 4. Config files (`--config`), in order
//! 5. Caller overrides (`--set`, library options)

mod defaults;
mod merge;
mod settings;

pub use defaults::{BuiltinDefaults, SKETCH_ATTRIBUTES};
pub use merge::{deep_merge, merge_into, merge_layers};
pub use settings::{
    parse_override, ConfigError, ConfigLayer, ConfigOrigin, ConfigSource, Settings, ARTIST, CANVAS,
    DISPL, MODE, MODEL, SCALE, SECTIONS, SHIFT, STATE, TRANSLATIONS,
};
