//! Lexicon data model.
//!
//! The types mirror the JSON artifacts written by the converter: every
//! field the normalizer or the filter reads is typed, everything else is
//! kept verbatim in an `extra` map so a normalized entry still carries the
//! full annotation for display.
//!
//! Deserialization tolerates the irregular shapes found in hand-written
//! lexicons: list fields accept a single value, text items accept a bare
//! string, and missing containers default to empty.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Fields without a typed counterpart, preserved as-is.
pub type Extra = Map<String, Value>;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}

// ============================================================================
// Text items
// ============================================================================

/// A text-bearing element (`<example>`, `<synonym>`, `<part>`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "TextItemRepr")]
pub struct TextItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextItemRepr {
    Bare(String),
    Full {
        #[serde(default)]
        t: Option<String>,
        #[serde(flatten)]
        extra: Extra,
    },
}

impl From<TextItemRepr> for TextItem {
    fn from(repr: TextItemRepr) -> Self {
        match repr {
            TextItemRepr::Bare(t) => TextItem {
                t: Some(t),
                extra: Extra::new(),
            },
            TextItemRepr::Full { t, extra } => TextItem { t, extra },
        }
    }
}

impl TextItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            t: Some(text.into()),
            extra: Extra::new(),
        }
    }

    pub fn has_text(&self) -> bool {
        self.t.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }
}

fn retain_text(items: &mut Vec<TextItem>) {
    items.retain(TextItem::has_text);
}

/// `<synonyms>` container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Synonyms {
    #[serde(default, deserialize_with = "one_or_many")]
    pub synonym: Vec<TextItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Synonyms {
    pub fn is_empty(&self) -> bool {
        self.synonym.is_empty() && self.extra.is_empty()
    }

    pub fn has_any(&self) -> bool {
        !self.synonym.is_empty()
    }
}

/// `<stts>`: entry-level examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Examples {
    #[serde(default, deserialize_with = "one_or_many")]
    pub example: Vec<TextItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

// ============================================================================
// Orthography
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Orths {
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub orth: Vec<Orth>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Orths {
    pub fn is_empty(&self) -> bool {
        self.orth.is_empty() && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Orth {
    /// `cont` or `discont`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub part: Vec<TextItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Orth {
    pub fn is_discontinuous(&self) -> bool {
        self.kind.as_deref() == Some("discont")
    }
}

// ============================================================================
// Syn / Sem
// ============================================================================

/// POS category of a syn node; `orig` records the pre-remap tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CatRepr")]
pub struct Cat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatRepr {
    Bare(String),
    Full {
        #[serde(default)]
        t: Option<String>,
        #[serde(default)]
        orig: Option<String>,
        #[serde(flatten)]
        extra: Extra,
    },
}

impl From<CatRepr> for Cat {
    fn from(repr: CatRepr) -> Self {
        match repr {
            CatRepr::Bare(t) => Cat {
                t: Some(t),
                ..Cat::default()
            },
            CatRepr::Full { t, orig, extra } => Cat { t, orig, extra },
        }
    }
}

impl Cat {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            t: Some(tag.into()),
            ..Self::default()
        }
    }
}

/// One syntactic realization of an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Syn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<Cat>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub example: Vec<TextItem>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub sem: Vec<Sem>,
    #[serde(default, skip_serializing_if = "Synonyms::is_empty")]
    pub synonyms: Synonyms,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Syn {
    pub fn tag(&self) -> Option<&str> {
        self.cat.as_ref().and_then(|c| c.t.as_deref())
    }

    /// A fully owned copy carrying `tag` as its category, for one additional
    /// target of a one-to-many POS mapping.
    pub fn fan_out(&self, tag: &str) -> Syn {
        let mut copy = self.clone();
        copy.cat.get_or_insert_with(Cat::default).t = Some(tag.to_string());
        copy
    }
}

/// One sense-relation record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sense: Option<String>,
    /// Pre-mapping sense(s), comma-separated once merged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sense_orig: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Relation {
    pub fn new(sense: impl Into<String>) -> Self {
        Self {
            sense: Some(sense.into()),
            ..Self::default()
        }
    }
}

/// A discourse-sense annotation of a syn node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sem {
    #[serde(default, deserialize_with = "one_or_many")]
    pub example: Vec<TextItem>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub pdtb3_relation: Vec<Relation>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub pdtb2_relation: Vec<Relation>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub sdrt_relation: Vec<Relation>,
    #[serde(default, skip_serializing_if = "Synonyms::is_empty")]
    pub synonyms: Synonyms,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Sem {
    pub fn has_relation(&self) -> bool {
        !(self.pdtb3_relation.is_empty()
            && self.pdtb2_relation.is_empty()
            && self.sdrt_relation.is_empty())
    }

    /// Fold competing relation systems onto `pdtb3_relation`.
    ///
    /// An existing `pdtb3_relation` wins; otherwise `sdrt_relation`, then
    /// `pdtb2_relation`. The alternate fields are emptied either way.
    pub fn collapse_relations(&mut self) {
        if self.pdtb3_relation.is_empty() {
            self.pdtb3_relation = if self.sdrt_relation.is_empty() {
                std::mem::take(&mut self.pdtb2_relation)
            } else {
                std::mem::take(&mut self.sdrt_relation)
            };
        }
        self.sdrt_relation.clear();
        self.pdtb2_relation.clear();
    }

    /// The set of canonical senses, used to detect duplicate sem nodes.
    pub fn sense_set(&self) -> BTreeSet<&str> {
        self.pdtb3_relation
            .iter()
            .map(|r| r.sense.as_deref().unwrap_or_default())
            .collect()
    }

    /// Merge a sem node with the same sense set into this one.
    ///
    /// Examples are unioned (existing first); each relation's original
    /// senses are joined with the matching relation of `other`.
    pub fn absorb(&mut self, other: Sem) {
        for example in other.example {
            if !self.example.contains(&example) {
                self.example.push(example);
            }
        }
        for relation in &mut self.pdtb3_relation {
            let incoming = other
                .pdtb3_relation
                .iter()
                .find(|r| r.sense == relation.sense)
                .or_else(|| other.pdtb3_relation.first())
                .and_then(|r| r.sense_orig.as_deref());
            relation.sense_orig = join_unique(relation.sense_orig.as_deref(), incoming);
        }
    }
}

fn join_unique(left: Option<&str>, right: Option<&str>) -> Option<String> {
    let mut seen: Vec<&str> = Vec::new();
    for part in left
        .into_iter()
        .chain(right)
        .flat_map(|s| s.split(", "))
        .filter(|s| !s.is_empty())
    {
        if !seen.contains(&part) {
            seen.push(part);
        }
    }
    (!seen.is_empty()).then(|| seen.join(", "))
}

// ============================================================================
// Entry / Lexicon
// ============================================================================

/// One connective with all its annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub word: String,
    #[serde(default, skip_serializing_if = "Orths::is_empty")]
    pub orths: Orths,
    #[serde(default)]
    pub synonyms: Synonyms,
    #[serde(default)]
    pub stts: Examples,
    #[serde(default, deserialize_with = "one_or_many")]
    pub syn: Vec<Syn>,

    #[serde(rename = "lexId", default, skip_serializing_if = "String::is_empty")]
    pub lex_id: String,
    #[serde(rename = "lexName", default, skip_serializing_if = "String::is_empty")]
    pub lex_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(rename = "posTagset", default, skip_serializing_if = "Option::is_none")]
    pub pos_tagset: Option<String>,
    #[serde(rename = "senseTagset", default, skip_serializing_if = "Option::is_none")]
    pub sense_tagset: Option<String>,
    #[serde(rename = "hasSynonyms", default, skip_serializing_if = "is_false")]
    pub has_synonyms: bool,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Entry {
    /// Drop synonym and example items that carry no text, at every level.
    pub fn drop_empty_text_items(&mut self) {
        retain_text(&mut self.synonyms.synonym);
        retain_text(&mut self.stts.example);
        for syn in &mut self.syn {
            retain_text(&mut syn.example);
            retain_text(&mut syn.synonyms.synonym);
            for sem in &mut syn.sem {
                retain_text(&mut sem.example);
                retain_text(&mut sem.synonyms.synonym);
            }
        }
    }

    /// True if the entry or any syn/sem below it lists a synonym.
    pub fn any_synonyms(&self) -> bool {
        self.synonyms.has_any()
            || self.syn.iter().any(|syn| {
                syn.synonyms.has_any() || syn.sem.iter().any(|sem| sem.synonyms.has_any())
            })
    }

    /// Every example sentence reachable from this entry.
    pub fn examples(&self) -> impl Iterator<Item = &TextItem> {
        self.stts.example.iter().chain(self.syn.iter().flat_map(|syn| {
            syn.example
                .iter()
                .chain(syn.sem.iter().flat_map(|sem| sem.example.iter()))
        }))
    }

    /// Every synonym reachable from this entry.
    pub fn synonyms(&self) -> impl Iterator<Item = &TextItem> {
        self.synonyms.synonym.iter().chain(self.syn.iter().flat_map(|syn| {
            syn.synonyms
                .synonym
                .iter()
                .chain(syn.sem.iter().flat_map(|sem| sem.synonyms.synonym.iter()))
        }))
    }
}

/// A whole lexicon file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    #[serde(default, deserialize_with = "one_or_many")]
    pub entry: Vec<Entry>,
    /// Set once normalization ran; normalizing again is a no-op.
    #[serde(rename = "isProcessed", default, skip_serializing_if = "is_false")]
    pub is_processed: bool,
    #[serde(flatten)]
    pub extra: Extra,
}
