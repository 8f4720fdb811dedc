//! Show/hide directive resolution.
//!
//! Flags live in the artist section under `sketches`:
//!
//! ```text
//! sketches.<sketch>.show               sketch-level default
//! sketches.<sketch>.<attr>.show        attribute flag
//! sketches.<sketch>.<attr>.<sub>.show  nested attribute flag
//! ```
//!
//! An absent `show` is unset and inherits from the enclosing table. A table
//! explicitly hidden hides everything below it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::key::{VisibilityKey, SHOW_FLAG};

/// Artist-section key holding the per-sketch tables.
pub const SKETCHES_KEY: &str = "sketches";

/// Artist-section key selecting the exclusive hide policy.
pub const EXCLUSIVE_HIDE_KEY: &str = "exclusive_hide";

/// Requested visibility change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Show,
    Hide,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Show => "show",
            Action::Hide => "hide",
        }
    }

    fn shown(&self) -> bool {
        matches!(self, Action::Show)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "show" => Ok(Action::Show),
            "hide" => Ok(Action::Hide),
            other => Err(format!("unknown visibility action '{}'", other)),
        }
    }
}

/// What an exclusive `hide` does to unpreserved siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HidePolicy {
    /// Siblings keep their prior state.
    #[default]
    Retain,
    /// Siblings are set to shown.
    Invert,
}

impl HidePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HidePolicy::Retain => "retain",
            HidePolicy::Invert => "invert",
        }
    }

    /// Read the policy from an artist section, falling back to the default.
    pub fn from_artist(artist: &Value) -> Self {
        match artist.get(EXCLUSIVE_HIDE_KEY) {
            None | Some(Value::Null) => Self::default(),
            Some(Value::String(s)) if s == "retain" => HidePolicy::Retain,
            Some(Value::String(s)) if s == "invert" => HidePolicy::Invert,
            Some(other) => {
                warn!(value = %other, "unknown exclusive_hide policy, using retain");
                Self::default()
            }
        }
    }
}

/// Keys already decided by an exclusive directive in the current batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreserveSet {
    keys: BTreeSet<VisibilityKey>,
}

impl PreserveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &VisibilityKey) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: VisibilityKey) -> bool {
        self.keys.insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisibilityKey> {
        self.keys.iter()
    }
}

/// Tri-state flag as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shown,
    Hidden,
    Unset,
}

impl Visibility {
    fn of(table: &Value) -> Self {
        match table.get(SHOW_FLAG).and_then(Value::as_bool) {
            Some(true) => Visibility::Shown,
            Some(false) => Visibility::Hidden,
            None => Visibility::Unset,
        }
    }
}

/// Apply one directive to `artist`.
///
/// Sets the flag of `key` to `action`. When `exclusive`, every sibling at the
/// same level that is not in `preserve` gets the opposite flag (subject to
/// [`HidePolicy`] for hides) and `key` joins `preserve`. Non-exclusive calls
/// neither touch siblings nor `preserve`.
pub fn resolve(
    artist: &mut Value,
    key: &VisibilityKey,
    action: Action,
    exclusive: bool,
    preserve: &mut PreserveSet,
) {
    let hide_policy = HidePolicy::from_artist(artist);
    let Some(parent) = parent_table(artist, key) else {
        return;
    };

    let leaf = key.leaf();
    let Some(target) = child_table(parent, leaf) else {
        return;
    };
    target.insert(SHOW_FLAG.to_string(), Value::Bool(action.shown()));
    debug!(key = %key, action = action.as_str(), exclusive, "visibility directive");

    if !exclusive {
        return;
    }

    let sibling_flag = match (action, hide_policy) {
        (Action::Show, _) => Some(false),
        (Action::Hide, HidePolicy::Invert) => Some(true),
        (Action::Hide, HidePolicy::Retain) => None,
    };

    if let Some(flag) = sibling_flag {
        for (name, entry) in parent.iter_mut() {
            if name == leaf || name == SHOW_FLAG {
                continue;
            }
            let Value::Object(sibling_table) = entry else {
                continue;
            };
            let sibling = key.sibling(name);
            if preserve.contains(&sibling) {
                continue;
            }
            sibling_table.insert(SHOW_FLAG.to_string(), Value::Bool(flag));
            debug!(sibling = %sibling, shown = flag, "exclusive sibling update");
        }
    }

    preserve.insert(key.clone());
}

/// Stored flag for `key`, without inheritance.
pub fn flag(artist: &Value, key: &VisibilityKey) -> Visibility {
    match lookup(artist, key) {
        Some(table) => Visibility::of(table),
        None => Visibility::Unset,
    }
}

/// Effective visibility of `key`.
///
/// An explicit hide anywhere from the sketch down to the key hides it.
/// Otherwise any explicit show on that path shows it. Unset all the way
/// down means hidden.
pub fn is_visible(artist: &Value, key: &VisibilityKey) -> bool {
    let Some(mut table) = artist
        .get(SKETCHES_KEY)
        .and_then(|s| s.get(key.sketch_name()))
    else {
        return false;
    };

    let mut shown = false;
    let mut segments = key.path().iter();
    loop {
        match Visibility::of(table) {
            Visibility::Hidden => return false,
            Visibility::Shown => shown = true,
            Visibility::Unset => {}
        }
        match segments.next().and_then(|segment| table.get(segment)) {
            Some(next) if next.is_object() => table = next,
            _ => return shown,
        }
    }
}

/// Attribute names declared directly under `sketch`, in stored order.
pub fn sketch_attributes(artist: &Value, sketch: &str) -> Vec<String> {
    artist
        .get(SKETCHES_KEY)
        .and_then(|s| s.get(sketch))
        .and_then(Value::as_object)
        .map(|table| {
            table
                .iter()
                .filter(|(name, value)| name.as_str() != SHOW_FLAG && value.is_object())
                .map(|(name, _)| name.clone())
                .collect()
        })
        .unwrap_or_default()
}

fn lookup<'a>(artist: &'a Value, key: &VisibilityKey) -> Option<&'a Value> {
    let mut table = artist.get(SKETCHES_KEY)?.get(key.sketch_name())?;
    for segment in key.path() {
        table = table.get(segment)?;
    }
    Some(table)
}

/// Table that holds the key's own entry, created along the way.
fn parent_table<'a>(
    artist: &'a mut Value,
    key: &VisibilityKey,
) -> Option<&'a mut Map<String, Value>> {
    let sketches = child_table(table_of(artist, "artist")?, SKETCHES_KEY)?;
    if key.is_sketch() {
        return Some(sketches);
    }

    let mut parent = child_table(sketches, key.sketch_name())?;
    for segment in &key.path()[..key.path().len() - 1] {
        parent = child_table(parent, segment)?;
    }
    Some(parent)
}

fn table_of<'a>(value: &'a mut Value, name: &str) -> Option<&'a mut Map<String, Value>> {
    if !value.is_object() {
        warn!(entry = name, "replacing non-table value with an empty table");
        *value = Value::Object(Map::new());
    }
    value.as_object_mut()
}

fn child_table<'a>(
    table: &'a mut Map<String, Value>,
    name: &str,
) -> Option<&'a mut Map<String, Value>> {
    let entry = table
        .entry(name.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    table_of(entry, name)
}
