//! XML → JSON artifact conversion.
//!
//! The orchestrator decides which lexicons need (re)conversion, converts them
//! (independent files in parallel) and reports one [`ConversionResult`] per
//! lexicon. Writes to a given artifact are serialized through
//! [`ArtifactLocks`] and land atomically: the new JSON is written to a
//! temporary file in the same directory and renamed over the old one, so a
//! failed conversion leaves the previous artifact and its timestamp intact.

use chrono::{DateTime, Utc};
use connlex_xml::{convert_document_bytes, to_markup_safe_json, ConvertOptions, XmlDiagnostic};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::listing::{self, timestamp, LexiconFile};
use crate::settings::Settings;
use crate::StoreError;

// ============================================================================
// Result records
// ============================================================================

/// Artifact state before a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeConversion {
    pub has_json: bool,
    pub needs_conversion: bool,
    #[serde(with = "timestamp::option", default, skip_serializing_if = "Option::is_none")]
    pub json_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionFailure {
    pub message: String,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_errors: Option<Vec<XmlDiagnostic>>,
}

impl From<&StoreError> for ConversionFailure {
    fn from(error: &StoreError) -> Self {
        let diagnostics = error.diagnostics();
        Self {
            message: error.to_string(),
            code: error.code(),
            xml_errors: (!diagnostics.is_empty()).then(|| diagnostics.to_vec()),
        }
    }
}

/// The listing record of a lexicon, plus the outcome if a conversion was
/// attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    #[serde(flatten)]
    pub file: LexiconFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_conversion: Option<BeforeConversion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ConversionFailure>,
}

impl ConversionResult {
    /// A listing entry for which no conversion was attempted.
    pub fn listed(file: LexiconFile) -> Self {
        Self {
            file,
            success: None,
            before_conversion: None,
            error: None,
        }
    }

    pub fn attempted(&self) -> bool {
        self.success.is_some()
    }

    pub fn succeeded(&self) -> bool {
        self.success == Some(true)
    }
}

// ============================================================================
// Locks
// ============================================================================

/// One writer lock per artifact path.
#[derive(Debug, Default)]
pub struct ArtifactLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ArtifactLocks {
    pub fn for_path(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }
}

// ============================================================================
// Single-file conversion
// ============================================================================

/// Convert one XML lexicon into its markup-safe JSON artifact.
///
/// The source is decoded per its BOM or declared encoding. Nothing is
/// written unless the whole conversion succeeds.
pub fn convert_to_artifact(xml_path: &Path, json_path: &Path, pretty: bool) -> Result<(), StoreError> {
    let bytes = std::fs::read(xml_path).map_err(|source| StoreError::Io {
        path: xml_path.to_path_buf(),
        source,
    })?;
    let value = convert_document_bytes(&bytes, &ConvertOptions::lexicon())?;
    let json = to_markup_safe_json(&value, pretty)?;
    write_atomically(json_path, json.as_bytes())
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(directory).map_err(io_error)?;
    temp.write_all(bytes).map_err(io_error)?;
    temp.flush().map_err(io_error)?;
    temp.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct ConversionOrchestrator {
    settings: Settings,
    locks: ArtifactLocks,
}

impl ConversionOrchestrator {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            locks: ArtifactLocks::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn directory(&self) -> &Path {
        &self.settings.xml_directory
    }

    pub fn enumerate(&self) -> Result<Vec<LexiconFile>, StoreError> {
        listing::enumerate(self.directory())
    }

    /// `force` only counts where the deployment allows forced reconversion.
    pub fn force_effective(&self, force: bool) -> bool {
        force && self.settings.allow_force_reparse
    }

    /// Convert `file` if its artifact is stale, or unconditionally when
    /// `force` is effective.
    pub fn convert_if_needed(&self, file: LexiconFile, force: bool) -> ConversionResult {
        if file.needs_conversion || self.force_effective(force) {
            self.try_convert(file)
        } else {
            debug!(lex_id = %file.lex_id, "artifact up to date");
            ConversionResult::listed(file)
        }
    }

    /// Convert `file` and record the outcome; never fails as a whole.
    pub fn try_convert(&self, mut file: LexiconFile) -> ConversionResult {
        let before = BeforeConversion {
            has_json: file.has_json,
            needs_conversion: file.needs_conversion,
            json_modified: file.json_modified,
        };

        match self.convert(&file) {
            Ok(json_modified) => {
                info!(lex_id = %file.lex_id, "converted lexicon");
                file.has_json = true;
                file.json_modified = Some(json_modified);
                file.needs_conversion = false;
                ConversionResult {
                    file,
                    success: Some(true),
                    before_conversion: Some(before),
                    error: None,
                }
            }
            Err(error) => {
                warn!(
                    lex_id = %file.lex_id,
                    error = %error,
                    diagnostics = error.diagnostics().len(),
                    "lexicon conversion failed"
                );
                ConversionResult {
                    error: Some(ConversionFailure::from(&error)),
                    file,
                    success: Some(false),
                    before_conversion: None,
                }
            }
        }
    }

    /// Convert under the artifact's writer lock; the artifact's new mtime.
    fn convert(&self, file: &LexiconFile) -> Result<DateTime<Utc>, StoreError> {
        let directory = self.directory();
        let json_path = file.json_path(directory);
        let lock = self.locks.for_path(&json_path);
        let _guard = lock.lock();

        convert_to_artifact(
            &file.xml_path(directory),
            &json_path,
            self.settings.pretty_print_json,
        )?;
        listing::modified(&json_path)?.ok_or_else(|| StoreError::NotFound(file.json_file.clone()))
    }

    /// Enumerate and convert every lexicon that needs it, in parallel.
    pub fn try_convert_all(&self, force: bool) -> Result<Vec<ConversionResult>, StoreError> {
        let files = self.enumerate()?;
        Ok(files
            .into_par_iter()
            .map(|file| self.convert_if_needed(file, force))
            .collect())
    }

    /// The listing, converting first when the deployment auto-converts.
    pub fn list(&self, force: bool) -> Result<Vec<ConversionResult>, StoreError> {
        if self.settings.auto_convert {
            self.try_convert_all(force)
        } else {
            Ok(self
                .enumerate()?
                .into_iter()
                .map(ConversionResult::listed)
                .collect())
        }
    }
}
