//! Compact persisted form of a [`Selection`], and the per-component state
//! store it is written to.
//!
//! Only `true` flags and non-empty text are written; unselected groups are
//! omitted entirely.
//!
//! ```text
//! {
//!   "filterText": "wohl",
//!   "filterType": { "word": true },
//!   "syn":   { "cco": true },
//!   "sense": { "contingency": { "cause": { "reason": true } } }
//! }
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::selection::{FacetGroup, FacetNode, FilterModes, Selection};

/// Encoded state above this size is still written, but logged.
pub const STATE_SIZE_WARNING: usize = 4096;

const FILTER_TEXT: &str = "filterText";
const FILTER_TYPE: &str = "filterType";
const POS_KEY: &str = "syn";
const SENSE_KEY: &str = "sense";
const ALL: &str = "all";

fn compact_group(group: &FacetGroup) -> Map<String, Value> {
    let mut object = Map::new();
    for child in group.children() {
        match child {
            FacetNode::Leaf { name, on: true } => {
                object.insert(name.to_string(), Value::Bool(true));
            }
            FacetNode::Leaf { .. } => {}
            FacetNode::Group(inner) => {
                let compact = compact_group(inner);
                if !compact.is_empty() {
                    object.insert(inner.name().to_string(), Value::Object(compact));
                }
            }
        }
    }
    if group.all {
        object.insert(ALL.to_string(), Value::Bool(true));
    }
    object
}

fn compact_modes(modes: FilterModes) -> Map<String, Value> {
    [
        ("word", modes.word),
        ("synonym", modes.synonym),
        ("example", modes.example),
    ]
    .into_iter()
    .filter(|(_, on)| *on)
    .map(|(name, _)| (name.to_string(), Value::Bool(true)))
    .collect()
}

/// What goes into the persisted state besides text, modes and POS facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOptions {
    /// The sense tree is the bulk of the state; without it a restored
    /// selection has no sense restriction.
    pub store_senses: bool,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self { store_senses: true }
    }
}

/// The selection as a compact JSON value.
pub fn compact_state(selection: &Selection) -> Value {
    compact_state_with(selection, PersistOptions::default())
}

pub fn compact_state_with(selection: &Selection, options: PersistOptions) -> Value {
    let mut state = Map::new();
    if !selection.text.text.is_empty() {
        state.insert(FILTER_TEXT.into(), Value::String(selection.text.text.clone()));
    }
    let sense = if options.store_senses {
        compact_group(&selection.sense)
    } else {
        Map::new()
    };
    for (key, object) in [
        (FILTER_TYPE, compact_modes(selection.text.modes)),
        (POS_KEY, compact_group(&selection.pos)),
        (SENSE_KEY, sense),
    ] {
        if !object.is_empty() {
            state.insert(key.into(), Value::Object(object));
        }
    }
    Value::Object(state)
}

/// Apply stored flags to a cleared group. `all: true` on an interior group
/// selects its leaves; on the root it is left to re-synchronization.
fn apply_group(group: &mut FacetGroup, stored: &Map<String, Value>, root: bool) {
    for (key, value) in stored {
        match value {
            Value::Bool(on) if key == ALL => {
                if root {
                    group.all = *on;
                } else {
                    group.set_all_leaves(*on);
                }
            }
            Value::Bool(on) => {
                if !group.set_leaf(key, *on) {
                    debug!(facet = %key, "ignoring unknown stored facet");
                }
            }
            Value::Object(inner) => match group.group_mut(key) {
                Some(child) => apply_group(child, inner, false),
                None => debug!(facet = %key, "ignoring unknown stored facet group"),
            },
            _ => debug!(facet = %key, "ignoring stored facet with unexpected type"),
        }
    }
}

/// Rebuild a selection from [`compact_state`] output.
///
/// Everything starts cleared (no modes, no leaves, no `all` flags); stored
/// values are applied on top and the `all` flags are re-synchronized.
pub fn restore_state(stored: &Value) -> Selection {
    let Some(state) = stored.as_object() else {
        warn!("stored selection is not an object, using defaults");
        return Selection::default();
    };

    let mut selection = Selection::default();
    selection.text.modes = FilterModes::NONE;
    selection.pos.clear();
    selection.sense.clear();

    if let Some(text) = state.get(FILTER_TEXT).and_then(Value::as_str) {
        selection.text.text = text.to_string();
    }
    if let Some(modes) = state.get(FILTER_TYPE).and_then(Value::as_object) {
        let flag = |name: &str| modes.get(name).and_then(Value::as_bool).unwrap_or(false);
        selection.text.modes = FilterModes {
            word: flag("word"),
            synonym: flag("synonym"),
            example: flag("example"),
        };
    }
    if let Some(pos) = state.get(POS_KEY).and_then(Value::as_object) {
        apply_group(&mut selection.pos, pos, true);
    }
    if let Some(sense) = state.get(SENSE_KEY).and_then(Value::as_object) {
        apply_group(&mut selection.sense, sense, true);
    }
    selection.sync();
    selection
}

/// Last-written JSON value per component identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateStore {
    objects: BTreeMap<String, Value>,
}

impl StateStore {
    pub fn update(&mut self, component: impl Into<String>, value: Value) {
        self.objects.insert(component.into(), value);
    }

    pub fn get(&self, component: &str) -> Option<&Value> {
        self.objects.get(component)
    }

    pub fn remove(&mut self, component: &str) -> Option<Value> {
        self.objects.remove(component)
    }

    pub fn encode(&self) -> String {
        let encoded = Value::Object(
            self.objects
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
        .to_string();
        if encoded.len() > STATE_SIZE_WARNING {
            warn!(bytes = encoded.len(), "persisted UI state is unusually large");
        }
        encoded
    }

    /// Decode [`StateStore::encode`] output. Unreadable input yields an
    /// empty store.
    pub fn decode(encoded: &str) -> Self {
        if encoded.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<BTreeMap<String, Value>>(encoded) {
            Ok(objects) => Self { objects },
            Err(error) => {
                warn!(%error, "discarding unreadable persisted UI state");
                Self::default()
            }
        }
    }
}
