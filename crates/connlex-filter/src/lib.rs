//! Faceted filtering of normalized lexicon entries.
//!
//! - [`taxonomy`]: the fixed canonical POS and sense taxonomies
//! - [`selection`]: the user's selection tree with synchronized `all` flags
//! - [`predicate`]: `matches(entry, selection)`, text ∧ POS ∧ sense
//! - [`scan`]: batched, cancellable evaluation over many lexicons
//! - [`persist`]: compact JSON form of a selection and a per-component store

pub mod persist;
pub mod predicate;
pub mod scan;
pub mod selection;
pub mod taxonomy;

pub use persist::{compact_state, compact_state_with, restore_state, PersistOptions, StateStore};
pub use predicate::{evaluate, matches, sense_path_matches, FilterError};
pub use scan::{CancelToken, FilterScan, QueryBoard, ScanResults, ScanStep, DEFAULT_BATCH};
pub use selection::{FacetError, FacetGroup, FacetNode, FilterModes, Selection, TextQuery};
pub use taxonomy::{Taxon, POS_FACETS, SENSE_FACETS};
