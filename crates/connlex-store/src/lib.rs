//! Lexicon directory store.
//!
//! The store owns the on-disk side of the system: a directory of `*.xml`
//! lexicons, each with an optional `.json` artifact (the converted lexicon)
//! and `.meta` companion (descriptive metadata).
//!
//! - [`settings`]: deployment settings (`settings.json`)
//! - [`listing`]: directory enumeration and staleness
//! - [`convert`]: parallel, atomic XML → JSON conversion
//! - [`files`]: filename sanitizing and artifact serving
//! - [`catalog`]: loaded, normalized lexicons keyed by id

pub mod catalog;
pub mod convert;
pub mod files;
pub mod listing;
pub mod settings;

#[cfg(test)]
mod tests;

use connlex_lexicon::LexiconError;
use connlex_xml::{ConvertError, XmlDiagnostic};
use std::path::PathBuf;

pub use catalog::LexiconCatalog;
pub use convert::{
    convert_to_artifact, ArtifactLocks, BeforeConversion, ConversionFailure, ConversionOrchestrator,
    ConversionResult,
};
pub use files::{read_served_file, sanitize_filename};
pub use listing::{enumerate, lex_id_for, needs_conversion, LexiconFile};
pub use settings::Settings;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot read settings {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot list lexicon directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lexicon(#[from] LexiconError),

    #[error("invalid filename")]
    InvalidFilename,

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("unknown lexicon: {0}")]
    UnknownLexicon(String),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl StoreError {
    /// HTTP-style status code reported to clients.
    pub fn code(&self) -> u16 {
        match self {
            StoreError::NotFound(_) | StoreError::UnknownLexicon(_) => 404,
            StoreError::InvalidFilename => 400,
            StoreError::Convert(_) => 422,
            _ => 500,
        }
    }

    /// XML parser diagnostics, when the failure was malformed input.
    pub fn diagnostics(&self) -> &[XmlDiagnostic] {
        match self {
            StoreError::Convert(error) => error.diagnostics(),
            _ => &[],
        }
    }
}
