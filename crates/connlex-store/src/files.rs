//! Serving raw artifacts out of the lexicon directory.

use std::path::Path;

use crate::StoreError;

/// Validate a requested filename and resolve it to an artifact name.
///
/// Names must be non-empty ASCII without path separators. Anything not
/// already naming a `.json` or `.meta` file gets `.json` appended, so
/// `dimlex` serves `dimlex.json`.
pub fn sanitize_filename(name: &str) -> Result<String, StoreError> {
    if name.is_empty() || !name.is_ascii() || name.contains(['/', '\\']) {
        return Err(StoreError::InvalidFilename);
    }
    if name.ends_with(".json") || name.ends_with(".meta") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.json"))
    }
}

/// Raw bytes of `name` inside `directory`.
pub fn read_served_file(directory: &Path, name: &str) -> Result<Vec<u8>, StoreError> {
    let file = sanitize_filename(name)?;
    let path = directory.join(&file);
    if !path.is_file() {
        return Err(StoreError::NotFound(file));
    }
    std::fs::read(&path).map_err(|source| StoreError::Io { path, source })
}
