//! Loaded, normalized lexicons keyed by lexicon id.

use connlex_lexicon::{
    parse_lexicon, parse_metadata, parse_tag_maps, Lexicon, LexiconMetadata, LexiconNormalizer, TagMapSet,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::files::read_served_file;
use crate::listing::LexiconFile;
use crate::settings::Settings;
use crate::StoreError;

/// A missing map file means no remapping; an unreadable one is an error.
fn load_tag_maps(path: &Path) -> Result<TagMapSet, StoreError> {
    if !path.is_file() {
        warn!(path = %path.display(), "tag map file missing, tags pass through unchanged");
        return Ok(TagMapSet::default());
    }
    let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_tag_maps(&bytes)?)
}

fn load_metadata(directory: &Path, file: &LexiconFile) -> Option<LexiconMetadata> {
    if !file.has_meta {
        return None;
    }
    let path = file.meta_path(directory);
    let loaded = std::fs::read(&path)
        .map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
        .and_then(|bytes| Ok(parse_metadata(&file.lex_id, &bytes)?));
    match loaded {
        Ok(metadata) => Some(metadata),
        Err(error) => {
            warn!(lex_id = %file.lex_id, %error, "skipping unreadable metadata file");
            None
        }
    }
}

pub struct LexiconCatalog {
    directory: PathBuf,
    files: BTreeMap<String, LexiconFile>,
    syn_maps: TagMapSet,
    sense_maps: TagMapSet,
    metadata: BTreeMap<String, LexiconMetadata>,
    loaded: BTreeMap<String, Lexicon>,
}

impl LexiconCatalog {
    /// Read the tag maps and every readable `.meta` file for `files`.
    pub fn open(settings: &Settings, files: Vec<LexiconFile>) -> Result<Self, StoreError> {
        let directory = settings.xml_directory.clone();
        let syn_maps = load_tag_maps(&settings.syn_maps_path())?;
        let sense_maps = load_tag_maps(&settings.sense_maps_path())?;

        let metadata = files
            .iter()
            .filter_map(|file| Some((file.lex_id.clone(), load_metadata(&directory, file)?)))
            .collect();
        let files = files
            .into_iter()
            .map(|file| (file.lex_id.clone(), file))
            .collect();

        Ok(Self {
            directory,
            files,
            syn_maps,
            sense_maps,
            metadata,
            loaded: BTreeMap::new(),
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &LexiconFile> {
        self.files.values()
    }

    pub fn metadata(&self, lex_id: &str) -> Option<&LexiconMetadata> {
        self.metadata.get(lex_id)
    }

    /// Load and normalize a lexicon's JSON artifact; later calls reuse it.
    pub fn load(&mut self, lex_id: &str) -> Result<&Lexicon, StoreError> {
        if self.loaded.contains_key(lex_id) {
            debug!(lex_id, "lexicon already loaded");
        } else {
            let file = self
                .files
                .get(lex_id)
                .ok_or_else(|| StoreError::UnknownLexicon(lex_id.to_string()))?;
            let bytes = read_served_file(&self.directory, &file.json_file)?;
            let mut lexicon = parse_lexicon(lex_id, &bytes)?;

            let metadata = self
                .metadata
                .entry(lex_id.to_string())
                .or_insert_with(|| LexiconMetadata::fallback(lex_id));
            LexiconNormalizer::new(&self.syn_maps, &self.sense_maps).normalize(&mut lexicon, lex_id, metadata);
            info!(lex_id, entries = lexicon.entry.len(), "loaded lexicon");
            self.loaded.insert(lex_id.to_string(), lexicon);
        }
        self.loaded
            .get(lex_id)
            .ok_or_else(|| StoreError::UnknownLexicon(lex_id.to_string()))
    }

    pub fn unload(&mut self, lex_id: &str) -> Option<Lexicon> {
        self.loaded.remove(lex_id)
    }

    /// Every loaded lexicon, ordered by id.
    pub fn loaded(&self) -> Vec<&Lexicon> {
        self.loaded.values().collect()
    }
}
