//! Deployment settings (`settings.json`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directory holding `*.xml` lexicons and their `.json`/`.meta` companions.
    pub xml_directory: PathBuf,
    /// Whether `force` requests are honored at all.
    pub allow_force_reparse: bool,
    /// Whether listing also converts stale lexicons.
    pub auto_convert: bool,
    pub pretty_print_json: bool,
    /// POS tag-map file, relative to `xml_directory`.
    pub syn_maps_file: String,
    /// Sense tag-map file, relative to `xml_directory`.
    pub sense_maps_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            xml_directory: PathBuf::from("."),
            allow_force_reparse: false,
            auto_convert: true,
            pretty_print_json: false,
            syn_maps_file: "syn-maps.json".to_string(),
            sense_maps_file: "sense-maps.json".to_string(),
        }
    }
}

impl Settings {
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            xml_directory: directory.into(),
            ..Self::default()
        }
    }

    /// Load settings from a JSON file. A relative `xmlDirectory` is taken
    /// relative to the settings file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings =
            serde_json::from_str(&text).map_err(|source| StoreError::SettingsParse {
                path: path.to_path_buf(),
                source,
            })?;
        if settings.xml_directory.is_relative() {
            if let Some(base) = path.parent() {
                settings.xml_directory = base.join(&settings.xml_directory);
            }
        }
        Ok(settings)
    }

    pub fn syn_maps_path(&self) -> PathBuf {
        self.xml_directory.join(&self.syn_maps_file)
    }

    pub fn sense_maps_path(&self) -> PathBuf {
        self.xml_directory.join(&self.sense_maps_file)
    }
}
