//! Sketch visibility for veux renderings.
//!
//! A sketch is a top-level visual mode (`reference` geometry, `displaced`
//! geometry). Callers issue ordered show/hide directives against
//! [`VisibilityKey`]s; [`resolve`] folds them into `show` flags stored in the
//! artist section of the settings.

mod key;
mod resolve;

pub use key::{MalformedKey, VisibilityKey, PATH_SEPARATOR, SHOW_FLAG, SKETCH_SEPARATOR};
pub use resolve::{
    flag, is_visible, resolve, sketch_attributes, Action, HidePolicy, PreserveSet, Visibility,
    EXCLUSIVE_HIDE_KEY, SKETCHES_KEY,
};

/// Undisplaced geometry.
pub const REFERENCE: &str = "reference";

/// Geometry under an applied state.
pub const DISPLACED: &str = "displaced";
