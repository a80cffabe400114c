//! Connective lexicon model and normalization.
//!
//! - [`model`]: typed view of converted lexicon JSON (entries, syns, sems)
//! - [`metadata`] / [`color`]: per-lexicon descriptive record and its color
//! - [`tagmap`]: case-insensitive native → canonical tag tables
//! - [`normalize`]: the one-shot normalization pass over a lexicon

pub mod color;
pub mod metadata;
pub mod model;
pub mod normalize;
pub mod tagmap;

pub use color::lexicon_color;
pub use metadata::{LexiconMetadata, ParseInfo};
pub use model::{Cat, Entry, Examples, Lexicon, Orth, Orths, Relation, Sem, Syn, Synonyms, TextItem};
pub use normalize::{canonical_sense_name, LexiconNormalizer};
pub use tagmap::{TagMap, TagMapSet, TagTarget};

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("invalid lexicon JSON for `{lex_id}`: {source}")]
    Lexicon {
        lex_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid metadata for `{lex_id}`: {source}")]
    Metadata {
        lex_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid tag map file: {0}")]
    TagMaps(#[source] serde_json::Error),
}

pub fn parse_lexicon(lex_id: &str, bytes: &[u8]) -> Result<Lexicon, LexiconError> {
    serde_json::from_slice(bytes).map_err(|source| LexiconError::Lexicon {
        lex_id: lex_id.to_string(),
        source,
    })
}

pub fn parse_metadata(lex_id: &str, bytes: &[u8]) -> Result<LexiconMetadata, LexiconError> {
    serde_json::from_slice(bytes).map_err(|source| LexiconError::Metadata {
        lex_id: lex_id.to_string(),
        source,
    })
}

pub fn parse_tag_maps(bytes: &[u8]) -> Result<TagMapSet, LexiconError> {
    serde_json::from_slice(bytes).map_err(LexiconError::TagMaps)
}
