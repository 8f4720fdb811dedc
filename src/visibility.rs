//! Visibility directive batches.
//!
//! The caller's `reference`, `displaced` and `hide` lists are parsed into
//! typed keys up front, so a malformed entry rejects the whole plan before
//! any flag is written. Each batch gets its own [`PreserveSet`].

use serde_json::Value;
use tracing::debug;
use veux_sketch::{
    resolve, Action, MalformedKey, PreserveSet, VisibilityKey, DISPLACED, REFERENCE,
};

/// One resolver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub key: VisibilityKey,
    pub action: Action,
    pub exclusive: bool,
}

/// Directives sharing one preserve set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveBatch {
    pub directives: Vec<Directive>,
}

impl DirectiveBatch {
    /// Apply in order with a fresh preserve set; returns that set.
    pub fn apply(&self, artist: &mut Value) -> PreserveSet {
        let mut preserve = PreserveSet::new();
        for directive in &self.directives {
            resolve(
                artist,
                &directive.key,
                directive.action,
                directive.exclusive,
                &mut preserve,
            );
        }
        preserve
    }
}

/// Caller visibility intents for one render
#[derive(Debug, Clone, Default)]
pub struct VisibilityRequest {
    /// Alias for `reference` when neither `reference` nor `displaced` is set
    pub show: Option<Vec<String>>,
    pub reference: Option<Vec<String>>,
    pub displaced: Option<Vec<String>>,
    pub hide: Option<Vec<String>>,
}

/// Ordered batches derived from a [`VisibilityRequest`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityPlan {
    batches: Vec<DirectiveBatch>,
}

impl VisibilityPlan {
    pub fn from_request(request: &VisibilityRequest) -> Result<Self, MalformedKey> {
        let reference = match (&request.reference, &request.displaced, &request.show) {
            (None, None, Some(show)) => Some(show),
            (reference, _, _) => reference.as_ref(),
        };

        let mut batches = Vec::new();

        if let Some(attributes) = reference {
            let mut batch = DirectiveBatch::default();
            batch.directives.push(Directive {
                key: VisibilityKey::sketch(REFERENCE)?,
                action: Action::Show,
                exclusive: false,
            });
            batch
                .directives
                .extend(exclusive(REFERENCE, attributes, Action::Show)?);
            batches.push(batch);
        }

        if let Some(attributes) = &request.displaced {
            batches.push(DirectiveBatch {
                directives: exclusive(DISPLACED, attributes, Action::Show)?,
            });
        }

        if let Some(attributes) = &request.hide {
            batches.push(DirectiveBatch {
                directives: exclusive(REFERENCE, attributes, Action::Hide)?,
            });
        }

        Ok(Self { batches })
    }

    pub fn batches(&self) -> &[DirectiveBatch] {
        &self.batches
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Apply every batch to the artist section.
    pub fn apply(&self, artist: &mut Value) {
        for (index, batch) in self.batches.iter().enumerate() {
            let preserved = batch.apply(artist);
            debug!(batch = index, preserved = preserved.len(), "visibility batch applied");
        }
    }
}

fn exclusive(
    sketch: &str,
    attributes: &[String],
    action: Action,
) -> Result<Vec<Directive>, MalformedKey> {
    attributes
        .iter()
        .map(|attribute| {
            Ok(Directive {
                key: VisibilityKey::attribute(sketch, attribute)?,
                action,
                exclusive: true,
            })
        })
        .collect()
}
