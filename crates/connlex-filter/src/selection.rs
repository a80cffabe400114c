//! User-facing filter state.
//!
//! A [`Selection`] holds the free-text query plus one [`FacetGroup`] tree per
//! taxonomy. Every group carries an `all` flag that mirrors its leaves:
//!
//! - interior groups: `all` is true iff every leaf beneath is set;
//! - roots: `all` is true iff every leaf is set or none is (an empty
//!   selection means "no restriction").
//!
//! Mutation goes through [`Selection::toggle`], which re-synchronizes the
//! flags after every change.

use std::fmt;
use std::str::FromStr;

use crate::taxonomy::{Taxon, POS_FACETS, SENSE_FACETS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FacetError {
    #[error("unknown facet root `{0}` (expected `pos` or `sense`)")]
    UnknownRoot(String),

    #[error("unknown facet `{0}`")]
    UnknownFacet(String),

    #[error("unknown filter mode `{0}` (expected word, synonym or example)")]
    UnknownMode(String),
}

// ============================================================================
// Facet tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetNode {
    Leaf { name: &'static str, on: bool },
    Group(FacetGroup),
}

impl FacetNode {
    pub fn name(&self) -> &'static str {
        match self {
            FacetNode::Leaf { name, .. } => *name,
            FacetNode::Group(group) => group.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetGroup {
    name: &'static str,
    pub all: bool,
    children: Vec<FacetNode>,
}

/// Which kinds of leaves occur beneath a group.
#[derive(Debug, Default, Clone, Copy)]
struct LeafState {
    has_set: bool,
    has_unset: bool,
}

impl LeafState {
    fn merge(self, other: LeafState) -> LeafState {
        LeafState {
            has_set: self.has_set || other.has_set,
            has_unset: self.has_unset || other.has_unset,
        }
    }
}

impl FacetGroup {
    pub fn from_taxonomy(name: &'static str, taxa: &[Taxon]) -> Self {
        let children = taxa
            .iter()
            .map(|taxon| match taxon {
                Taxon::Leaf(leaf) => FacetNode::Leaf {
                    name: *leaf,
                    on: false,
                },
                Taxon::Group(group, members) => {
                    FacetNode::Group(FacetGroup::from_taxonomy(*group, members))
                }
            })
            .collect();
        Self {
            name,
            all: false,
            children,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn children(&self) -> &[FacetNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&FacetNode> {
        self.children.iter().find(|child| child.name() == name)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut FacetNode> {
        self.children.iter_mut().find(|child| child.name() == name)
    }

    pub fn group(&self, name: &str) -> Option<&FacetGroup> {
        match self.child(name)? {
            FacetNode::Group(group) => Some(group),
            FacetNode::Leaf { .. } => None,
        }
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut FacetGroup> {
        match self.child_mut(name)? {
            FacetNode::Group(group) => Some(group),
            FacetNode::Leaf { .. } => None,
        }
    }

    /// State of a direct leaf child, `None` if there is no such leaf.
    pub fn leaf(&self, name: &str) -> Option<bool> {
        match self.child(name)? {
            FacetNode::Leaf { on, .. } => Some(*on),
            FacetNode::Group(_) => None,
        }
    }

    /// Set a direct leaf child. Returns `false` if there is no such leaf.
    pub fn set_leaf(&mut self, name: &str, on: bool) -> bool {
        match self.child_mut(name) {
            Some(FacetNode::Leaf { on: flag, .. }) => {
                *flag = on;
                true
            }
            _ => false,
        }
    }

    /// Set or clear every leaf and every `all` flag beneath (and at) this group.
    pub fn set_all_leaves(&mut self, on: bool) {
        self.all = on;
        for child in &mut self.children {
            match child {
                FacetNode::Leaf { on: flag, .. } => *flag = on,
                FacetNode::Group(group) => group.set_all_leaves(on),
            }
        }
    }

    /// Clear every leaf and every `all` flag.
    pub fn clear(&mut self) {
        self.set_all_leaves(false);
    }

    fn leaf_state(&self) -> LeafState {
        self.children
            .iter()
            .map(|child| match child {
                FacetNode::Leaf { on, .. } => LeafState {
                    has_set: *on,
                    has_unset: !*on,
                },
                FacetNode::Group(group) => group.leaf_state(),
            })
            .fold(LeafState::default(), LeafState::merge)
    }

    /// True iff every leaf beneath is set.
    pub fn every_leaf_set(&self) -> bool {
        !self.leaf_state().has_unset
    }

    pub fn any_leaf_set(&self) -> bool {
        self.leaf_state().has_set
    }

    /// Recompute interior `all` flags bottom-up.
    fn sync_interior(&mut self) {
        for child in &mut self.children {
            if let FacetNode::Group(group) = child {
                group.sync_interior();
                group.all = group.every_leaf_set();
            }
        }
    }

    /// Recompute every flag beneath this root, then the root's own flag
    /// (all-or-none).
    pub fn sync_root(&mut self) {
        self.sync_interior();
        let state = self.leaf_state();
        self.all = !state.has_unset || !state.has_set;
    }

    /// Apply `on` at a path below this group. An empty path or a trailing
    /// `all` addresses this group itself; a group name addresses all of that
    /// group's leaves.
    fn set_path(&mut self, path: &[&str], on: bool) -> Result<(), ()> {
        match path {
            [] | ["all"] => {
                self.set_all_leaves(on);
                Ok(())
            }
            [head, rest @ ..] => match self.child_mut(head) {
                Some(FacetNode::Group(group)) => group.set_path(rest, on),
                Some(FacetNode::Leaf { on: flag, .. }) if rest.is_empty() => {
                    *flag = on;
                    Ok(())
                }
                _ => Err(()),
            },
        }
    }

    fn count_leaves(&self, on: bool) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                FacetNode::Leaf { on: flag, .. } => usize::from(*flag == on),
                FacetNode::Group(group) => group.count_leaves(on),
            })
            .sum()
    }

    /// Number of set leaves beneath this group.
    pub fn selected_count(&self) -> usize {
        self.count_leaves(true)
    }
}

// ============================================================================
// Text query
// ============================================================================

/// Which parts of an entry the filter text is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterModes {
    pub word: bool,
    pub synonym: bool,
    pub example: bool,
}

impl Default for FilterModes {
    fn default() -> Self {
        Self {
            word: true,
            synonym: false,
            example: false,
        }
    }
}

impl FilterModes {
    pub const NONE: FilterModes = FilterModes {
        word: false,
        synonym: false,
        example: false,
    };
}

/// Parses `word`, `synonym`, `example` or any `_`-joined combination.
impl FromStr for FilterModes {
    type Err = FacetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modes = FilterModes::NONE;
        for part in s.split('_').filter(|part| !part.is_empty()) {
            match part {
                "word" => modes.word = true,
                "synonym" => modes.synonym = true,
                "example" => modes.example = true,
                other => return Err(FacetError::UnknownMode(other.to_string())),
            }
        }
        Ok(modes)
    }
}

impl fmt::Display for FilterModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [
            (self.word, "word"),
            (self.synonym, "synonym"),
            (self.example, "example"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        f.write_str(&parts.join("_"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery {
    pub text: String,
    pub modes: FilterModes,
}

// ============================================================================
// Selection
// ============================================================================

/// Name of the POS root in toggle paths; `syn` is accepted as an alias.
pub const POS_ROOT: &str = "pos";
pub const SENSE_ROOT: &str = "sense";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub text: TextQuery,
    pub pos: FacetGroup,
    pub sense: FacetGroup,
}

impl Default for Selection {
    /// No text, word mode, every leaf unset, both roots `all`.
    fn default() -> Self {
        let mut pos = FacetGroup::from_taxonomy(POS_ROOT, POS_FACETS);
        let mut sense = FacetGroup::from_taxonomy(SENSE_ROOT, SENSE_FACETS);
        pos.all = true;
        sense.all = true;
        Self {
            text: TextQuery::default(),
            pos,
            sense,
        }
    }
}

impl Selection {
    pub fn with_text(mut self, text: impl Into<String>, modes: FilterModes) -> Self {
        self.text = TextQuery {
            text: text.into(),
            modes,
        };
        self
    }

    pub fn root_mut(&mut self, root: &str) -> Result<&mut FacetGroup, FacetError> {
        match root {
            POS_ROOT | "syn" => Ok(&mut self.pos),
            SENSE_ROOT => Ok(&mut self.sense),
            other => Err(FacetError::UnknownRoot(other.to_string())),
        }
    }

    /// Set or clear the facet at a dotted path such as `pos.cco`,
    /// `sense.contingency.cause.reason` or `sense.expansion.all`, then
    /// re-synchronize every `all` flag of that root.
    pub fn toggle(&mut self, path: &str, on: bool) -> Result<(), FacetError> {
        let mut segments = path.split('.');
        let root_name = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();

        let root = self.root_mut(root_name)?;
        root.set_path(&rest, on)
            .map_err(|()| FacetError::UnknownFacet(path.to_string()))?;
        root.sync_root();
        Ok(())
    }

    /// Re-synchronize both roots.
    pub fn sync(&mut self) {
        self.pos.sync_root();
        self.sense.sync_root();
    }
}
