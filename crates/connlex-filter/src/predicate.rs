//! Entry predicates.
//!
//! [`matches`] is the conjunction of the text, POS and sense predicates,
//! evaluated in that order and short-circuiting. It is a pure function of
//! the entry and the selection, so it can be called in any order and in any
//! batch size.

use connlex_lexicon::{Entry, TextItem};
use tracing::warn;

use crate::selection::{FacetGroup, FacetNode, Selection, TextQuery};
use crate::taxonomy::{BELIEF, OTHER, SPEECH_ACT};

/// Filter text that matches every discontinuous orthography.
pub const DISCONTINUOUS_MARKER: &str = "...";

/// Shape problems found while testing an entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("syn without a category tag")]
    MissingCategory,

    #[error("{0} item without text")]
    MissingText(&'static str),

    #[error("relation without a sense")]
    MissingSense,
}

/// Whether `entry` satisfies `selection`. Malformed entries do not match.
pub fn matches(entry: &Entry, selection: &Selection) -> bool {
    evaluate(entry, selection).unwrap_or_else(|error| {
        warn!(
            lex_id = %entry.lex_id,
            word = %entry.word,
            %error,
            "entry excluded from results"
        );
        false
    })
}

/// Like [`matches`], but reports malformed entries instead of rejecting them.
pub fn evaluate(entry: &Entry, selection: &Selection) -> Result<bool, FilterError> {
    Ok(text_matches(entry, &selection.text)?
        && pos_matches(entry, &selection.pos)?
        && sense_matches(entry, &selection.sense)?)
}

fn text_of<'e>(item: &'e TextItem, kind: &'static str) -> Result<&'e str, FilterError> {
    item.t.as_deref().ok_or(FilterError::MissingText(kind))
}

fn any_contains<'e>(
    items: impl IntoIterator<Item = &'e TextItem>,
    kind: &'static str,
    needle: &str,
) -> Result<bool, FilterError> {
    for item in items {
        if text_of(item, kind)?.contains(needle) {
            return Ok(true);
        }
    }
    Ok(false)
}

// Plain case-sensitive substring containment.
fn text_matches(entry: &Entry, query: &TextQuery) -> Result<bool, FilterError> {
    let needle = query.text.as_str();
    if needle.is_empty() {
        return Ok(true);
    }
    let modes = query.modes;

    if modes.word {
        if entry.word.contains(needle) {
            return Ok(true);
        }
        let discontinuous = needle == DISCONTINUOUS_MARKER;
        for orth in &entry.orths.orth {
            if discontinuous && orth.is_discontinuous() {
                return Ok(true);
            }
            if any_contains(&orth.part, "orthography part", needle)? {
                return Ok(true);
            }
        }
    }

    if modes.example && any_contains(entry.examples(), "example", needle)? {
        return Ok(true);
    }

    if modes.synonym && any_contains(entry.synonyms(), "synonym", needle)? {
        return Ok(true);
    }

    Ok(false)
}

fn pos_matches(entry: &Entry, pos: &FacetGroup) -> Result<bool, FilterError> {
    if pos.all {
        return Ok(true);
    }
    let other = pos.leaf(OTHER).unwrap_or(false);
    for syn in &entry.syn {
        let tag = syn.tag().ok_or(FilterError::MissingCategory)?;
        if pos.leaf(tag).unwrap_or(other) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn sense_matches(entry: &Entry, sense: &FacetGroup) -> Result<bool, FilterError> {
    if sense.all {
        return Ok(true);
    }
    let relations = entry
        .syn
        .iter()
        .flat_map(|syn| &syn.sem)
        .flat_map(|sem| &sem.pdtb3_relation);
    for relation in relations {
        let full = relation.sense.as_deref().ok_or(FilterError::MissingSense)?;
        if sense_path_matches(full, sense) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Test one sense string (e.g. `Contingency:Cause:Reason+belief`) against
/// the sense tree.
pub fn sense_path_matches(sense: &str, root: &FacetGroup) -> bool {
    let lower = sense.to_lowercase();
    let marker_on =
        |facet: &str| root.leaf(facet).unwrap_or(false) && lower.contains(&format!("+{facet}"));
    if marker_on(BELIEF) || marker_on(SPEECH_ACT) {
        return true;
    }

    let other = root.leaf(OTHER).unwrap_or(false);
    let path = lower
        .replace("+belief", "")
        .replace("+speechact", "")
        .replace('-', "_");
    let segments: Vec<&str> = path.split(':').collect();

    let mut group = root;
    for (index, segment) in segments.iter().enumerate() {
        let last = index + 1 == segments.len();
        match group.child(segment) {
            None => return other,
            Some(FacetNode::Leaf { on, .. }) => {
                // A selected leaf matches at any depth; descending past an
                // unselected one leaves the taxonomy.
                return *on || (!last && other);
            }
            Some(FacetNode::Group(child)) => {
                if last && child.all {
                    return true;
                }
                group = child;
            }
        }
    }
    false
}
