//! Element tree → JSON-like value conversion with a configurable
//! array/scalar/text policy.

use crate::tree::RawXmlNode;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// Tags that the lexicon artifacts always store as arrays, even with a
/// single occurrence.
pub const LEXICON_ARRAY_TAGS: &[&str] = &[
    "orth",
    "part",
    "synonym",
    "example",
    "syn",
    "sem",
    "pdtb3_relation",
    "pdtb2_relation",
    "sdrt_relation",
    "case",
];

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Joins a namespace prefix to a local name (`xml:lang` → `xml{sep}lang`).
    pub namespace_separator: String,
    /// Prepended to attribute keys to keep them apart from child tags.
    pub attribute_prefix: String,
    /// Tags that become arrays even on their first occurrence.
    pub always_array: BTreeSet<String>,
    /// When false, every child tag becomes an array.
    pub auto_array: bool,
    /// Key holding trimmed text content.
    pub text_content: String,
    /// Collapse a leaf without attributes and children to its bare text.
    pub auto_text: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            namespace_separator: ":".to_string(),
            attribute_prefix: "@".to_string(),
            always_array: BTreeSet::new(),
            auto_array: true,
            text_content: "$".to_string(),
            auto_text: true,
        }
    }
}

impl ConvertOptions {
    /// The policy the lexicon artifacts are written with: bare attribute keys,
    /// text under `t`, no scalar collapsing, [`LEXICON_ARRAY_TAGS`] as arrays.
    pub fn lexicon() -> Self {
        Self {
            attribute_prefix: String::new(),
            text_content: "t".to_string(),
            auto_text: false,
            ..Self::default()
        }
        .with_always_array(LEXICON_ARRAY_TAGS.iter().copied())
    }

    pub fn with_always_array<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.always_array.extend(tags.into_iter().map(Into::into));
        self
    }

    fn qualify(&self, name: &str) -> String {
        match name.split_once(':') {
            Some((prefix, local)) => format!("{prefix}{}{local}", self.namespace_separator),
            None => name.to_string(),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// Result of a conversion: a scalar string, a sequence, or an ordered mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    Text(String),
    Array(Vec<XmlValue>),
    Object(XmlObject),
}

/// Insertion-ordered string-keyed mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlObject {
    entries: Vec<(String, XmlValue)>,
}

impl XmlObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut XmlValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite; an overwritten key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: XmlValue) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_entries(self) -> Vec<(String, XmlValue)> {
        self.entries
    }
}

impl XmlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[XmlValue]> {
        match self {
            XmlValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&XmlObject> {
        match self {
            XmlValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    pub fn to_json(&self) -> Value {
        match self {
            XmlValue::Text(t) => Value::String(t.clone()),
            XmlValue::Array(items) => Value::Array(items.iter().map(XmlValue::to_json).collect()),
            XmlValue::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for XmlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            XmlValue::Text(t) => serializer.serialize_str(t),
            XmlValue::Array(items) => serializer.collect_seq(items),
            XmlValue::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl Serialize for XmlObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert an element into its properties value.
///
/// Attributes come first (prefixed), then child tags in first-occurrence
/// order, then the text key. Repeated siblings accumulate positionally into
/// an array.
pub fn convert(node: &RawXmlNode, options: &ConvertOptions) -> XmlValue {
    let mut properties = XmlObject::new();
    for (name, value) in &node.attributes {
        let key = format!("{}{}", options.attribute_prefix, options.qualify(name));
        properties.insert(key, XmlValue::Text(value.clone()));
    }

    let mut tags = XmlObject::new();
    for child in &node.children {
        let tag = options.qualify(&child.name);
        accumulate(&mut tags, tag, convert(child, options), options);
    }

    let text = node
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if options.auto_text && properties.is_empty() && tags.is_empty() {
        if let Some(text) = text {
            return XmlValue::Text(text.to_string());
        }
    }

    for (key, value) in tags.into_entries() {
        properties.insert(key, value);
    }
    if let Some(text) = text {
        properties.insert(options.text_content.clone(), XmlValue::Text(text.to_string()));
    }
    XmlValue::Object(properties)
}

/// Convert an element into a single-entry mapping `{ name: properties }`.
pub fn convert_named(node: &RawXmlNode, options: &ConvertOptions) -> XmlObject {
    let mut wrapper = XmlObject::new();
    wrapper.insert(options.qualify(&node.name), convert(node, options));
    wrapper
}

fn accumulate(tags: &mut XmlObject, tag: String, value: XmlValue, options: &ConvertOptions) {
    if let Some(slot) = tags.get_mut(&tag) {
        match slot {
            XmlValue::Array(items) => items.push(value),
            _ => {
                let first = std::mem::replace(slot, XmlValue::Array(Vec::new()));
                *slot = XmlValue::Array(vec![first, value]);
            }
        }
        return;
    }

    let value = if options.always_array.contains(&tag) || !options.auto_array {
        XmlValue::Array(vec![value])
    } else {
        value
    };
    tags.insert(tag, value);
}
