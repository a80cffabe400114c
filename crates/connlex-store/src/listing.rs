//! Directory enumeration: one [`LexiconFile`] per `*.xml` lexicon.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::StoreError;

/// UTC timestamps at second precision, `YYYY-MM-DDTHH:MM:SSZ`.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }

    pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        NaiveDateTime::parse_from_str(text, FORMAT).map(|naive| naive.and_utc())
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.collect_str(&value.format(FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| parse(&text).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Listing record of one lexicon and its companion files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexiconFile {
    pub xml_file: String,
    pub lex_id: String,
    pub json_file: String,
    pub meta_file: String,
    pub has_json: bool,
    pub has_meta: bool,
    #[serde(with = "timestamp")]
    pub xml_modified: DateTime<Utc>,
    #[serde(with = "timestamp::option", default, skip_serializing_if = "Option::is_none")]
    pub json_modified: Option<DateTime<Utc>>,
    pub needs_conversion: bool,
    #[serde(with = "timestamp::option", default, skip_serializing_if = "Option::is_none")]
    pub meta_modified: Option<DateTime<Utc>>,
}

/// `dimlex.v2.xml` → `dimlexv2`.
pub fn lex_id_for(xml_file: &str) -> String {
    xml_file.replace(".xml", "").replace('.', "")
}

/// Second-precision mtime of a regular file, `None` if there is none.
pub(crate) fn modified(path: &Path) -> Result<Option<DateTime<Utc>>, StoreError> {
    if !path.is_file() {
        return Ok(None);
    }
    let mtime = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(DateTime::<Utc>::from(mtime).trunc_subsecs(0)))
}

/// A JSON artifact is stale unless it exists and is at least as new as the XML.
pub fn needs_conversion(xml_modified: DateTime<Utc>, json_modified: Option<DateTime<Utc>>) -> bool {
    json_modified.map_or(true, |json| json < xml_modified)
}

impl LexiconFile {
    /// Describe `xml_file` inside `directory` from the current file system state.
    pub fn describe(directory: &Path, xml_file: &str) -> Result<Self, StoreError> {
        let stem = xml_file.strip_suffix(".xml").unwrap_or(xml_file);
        let json_file = format!("{stem}.json");
        let meta_file = format!("{stem}.meta");

        let xml_path = directory.join(xml_file);
        let xml_modified = modified(&xml_path)?.ok_or_else(|| StoreError::NotFound(xml_file.to_string()))?;
        let json_modified = modified(&directory.join(&json_file))?;
        let meta_modified = modified(&directory.join(&meta_file))?;

        Ok(Self {
            xml_file: xml_file.to_string(),
            lex_id: lex_id_for(xml_file),
            json_file,
            meta_file,
            has_json: json_modified.is_some(),
            has_meta: meta_modified.is_some(),
            xml_modified,
            json_modified,
            needs_conversion: needs_conversion(xml_modified, json_modified),
            meta_modified,
        })
    }

    pub fn xml_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.xml_file)
    }

    pub fn json_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.json_file)
    }

    pub fn meta_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.meta_file)
    }
}

/// Every `*.xml` lexicon in `directory`, sorted by filename.
pub fn enumerate(directory: &Path) -> Result<Vec<LexiconFile>, StoreError> {
    let entries = std::fs::read_dir(directory).map_err(|source| StoreError::Directory {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::Directory {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_xml = path.extension().is_some_and(|ext| ext == "xml");
        match entry.file_name().into_string() {
            Ok(name) if is_xml && path.is_file() => names.push(name),
            Ok(name) => debug!(file = %name, "skipping non-lexicon file"),
            Err(name) => debug!(file = ?name, "skipping file with non-UTF-8 name"),
        }
    }
    names.sort();

    names
        .iter()
        .map(|name| LexiconFile::describe(directory, name))
        .collect()
}
