//! Case-insensitive tag remapping tables.
//!
//! A tag-map file (`syn-maps.json`, `sense-maps.json`) is keyed by native
//! tagset name; each table maps a native tag to one canonical tag or to a
//! list of them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Mapping target: one canonical tag or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagTarget {
    One(String),
    Many(Vec<String>),
}

impl TagTarget {
    pub fn as_slice(&self) -> &[String] {
        match self {
            TagTarget::One(tag) => std::slice::from_ref(tag),
            TagTarget::Many(tags) => tags,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.as_slice().first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TagTarget::One(tag) => tag.is_empty(),
            TagTarget::Many(tags) => tags.is_empty(),
        }
    }
}

/// One taxonomy's mapping table plus its lowercase index.
#[derive(Debug, Clone, Default)]
pub struct TagMap {
    table: BTreeMap<String, TagTarget>,
    index: HashMap<String, String>,
}

impl TagMap {
    /// Build the lowercase → key index once; lookups are O(1) afterwards.
    pub fn new(table: BTreeMap<String, TagTarget>) -> Self {
        let index = table
            .keys()
            .map(|key| (key.to_lowercase(), key.clone()))
            .collect();
        Self { table, index }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Case-insensitive lookup. Empty targets count as "not mapped".
    pub fn lookup(&self, tag: &str) -> Option<&TagTarget> {
        self.index
            .get(&tag.to_lowercase())
            .and_then(|key| self.table.get(key))
            .filter(|target| !target.is_empty())
    }

    /// Target tag(s) for `tag` and whether a mapping was found. Unmapped
    /// tags pass through unchanged.
    pub fn remap<'a>(&'a self, tag: &'a str) -> (Vec<&'a str>, bool) {
        match self.lookup(tag) {
            Some(target) => (target.as_slice().iter().map(String::as_str).collect(), true),
            None => (vec![tag], false),
        }
    }
}

/// All tables of one tag-map file, keyed by tagset name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "BTreeMap<String, BTreeMap<String, TagTarget>>")]
pub struct TagMapSet {
    maps: BTreeMap<String, TagMap>,
}

impl From<BTreeMap<String, BTreeMap<String, TagTarget>>> for TagMapSet {
    fn from(tables: BTreeMap<String, BTreeMap<String, TagTarget>>) -> Self {
        Self {
            maps: tables
                .into_iter()
                .map(|(tagset, table)| (tagset, TagMap::new(table)))
                .collect(),
        }
    }
}

impl TagMapSet {
    pub fn get(&self, tagset: &str) -> Option<&TagMap> {
        self.maps.get(tagset)
    }

    pub fn tagsets(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}
