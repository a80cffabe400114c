//! Directory-level tests for listing, conversion, serving and the catalog.

use super::*;
use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

const DIMLEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dimlex>
  <entry id="k1" word="obwohl">
    <orths><orth type="cont"><part type="single">obwohl</part></orth></orths>
    <syn>
      <cat>konnadv</cat>
      <sem>
        <pdtb3_relation sense="Comparison:Concession:Arg2-as-denier"/>
        <example>Obwohl es &lt;b&gt;regnet&lt;/b&gt;, gehen wir.</example>
      </sem>
    </syn>
  </entry>
</dimlex>"#;

const META: &str = r#"{
  "lexiconName": "DiMLex",
  "languageEnglish": "German",
  "parseInfo": { "posTagset": "dimlex", "senseTagset": "dimlex-senses" },
  "url": "https://example.org/dimlex"
}"#;

fn write_with_mtime(path: &Path, contents: impl AsRef<[u8]>, mtime: SystemTime) {
    std::fs::write(path, contents).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

/// Directory with `dimlex.xml` (one hour old) and `notes.txt`.
fn lexicon_dir() -> (tempfile::TempDir, Settings) {
    let dir = tempdir().unwrap();
    let hour_ago = SystemTime::now() - Duration::from_secs(3600);
    write_with_mtime(&dir.path().join("dimlex.xml"), DIMLEX, hour_ago);
    std::fs::write(dir.path().join("notes.txt"), "not a lexicon").unwrap();
    let settings = Settings::with_directory(dir.path());
    (dir, settings)
}

#[test]
fn test_listing_reports_companions_and_staleness() {
    let (dir, _) = lexicon_dir();
    let past = SystemTime::now() - Duration::from_secs(7200);
    write_with_mtime(&dir.path().join("lico.v2.xml"), "<lico/>", past);
    write_with_mtime(&dir.path().join("lico.v2.json"), "{}", past + Duration::from_secs(5));
    std::fs::write(dir.path().join("lico.v2.meta"), "{}").unwrap();

    let files = enumerate(dir.path()).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.xml_file.as_str()).collect();
    assert_eq!(names, ["dimlex.xml", "lico.v2.xml"]);

    let dimlex = &files[0];
    assert_eq!(dimlex.lex_id, "dimlex");
    assert!(!dimlex.has_json);
    assert!(dimlex.needs_conversion);

    let lico = &files[1];
    assert_eq!(lico.lex_id, "licov2");
    assert_eq!(lico.json_file, "lico.v2.json");
    assert_eq!(lico.meta_file, "lico.v2.meta");
    assert!(lico.has_json && lico.has_meta);
    assert!(!lico.needs_conversion);

    let value = serde_json::to_value(lico).unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert!(keys.contains(&"metaModified".to_string()));
    assert!(keys.contains(&"jsonModified".to_string()));
}

#[test]
fn test_missing_directory_is_reported() {
    let dir = tempdir().unwrap();
    let err = enumerate(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, StoreError::Directory { .. }));
    assert_eq!(err.code(), 500);
}

#[test]
fn test_conversion_writes_markup_safe_artifact() {
    let (dir, settings) = lexicon_dir();
    let orchestrator = ConversionOrchestrator::new(settings);

    let results = orchestrator.try_convert_all(false).unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.succeeded());
    assert!(result.file.has_json);
    assert!(!result.file.needs_conversion);
    let before = result.before_conversion.as_ref().unwrap();
    assert!(!before.has_json);
    assert!(before.needs_conversion);
    assert_eq!(before.json_modified, None);

    let json = std::fs::read_to_string(dir.path().join("dimlex.json")).unwrap();
    assert!(!json.contains('<') && !json.contains('>'));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["entry"].is_object() || value["entry"].is_array());

    // Up to date now: a second pass converts nothing.
    let again = orchestrator.try_convert_all(false).unwrap();
    assert!(!again[0].attempted());
}

#[test]
fn test_failed_conversion_keeps_previous_artifact() {
    let (dir, settings) = lexicon_dir();
    let json_path = dir.path().join("dimlex.json");
    let orchestrator = ConversionOrchestrator::new(settings);
    orchestrator.try_convert_all(false).unwrap();

    let previous = std::fs::read(&json_path).unwrap();
    let previous_mtime = listing::modified(&json_path).unwrap();

    let future = SystemTime::now() + Duration::from_secs(60);
    write_with_mtime(&dir.path().join("dimlex.xml"), "<dimlex><entry></dimlex><x>", future);

    let results = orchestrator.try_convert_all(false).unwrap();
    let result = &results[0];
    assert_eq!(result.success, Some(false));
    assert!(result.before_conversion.is_none());
    let error = result.error.as_ref().unwrap();
    assert_eq!(error.code, 422);
    assert!(!error.xml_errors.as_ref().unwrap().is_empty());
    assert!(result.file.needs_conversion);

    assert_eq!(std::fs::read(&json_path).unwrap(), previous);
    assert_eq!(listing::modified(&json_path).unwrap(), previous_mtime);

    let value = serde_json::to_value(result).unwrap();
    assert!(value["error"]["xmlErrors"][0]["line"].is_number());
}

#[test]
fn test_declared_encoding_is_honored() {
    let (dir, settings) = lexicon_dir();
    let hour_ago = SystemTime::now() - Duration::from_secs(3600);
    write_with_mtime(
        &dir.path().join("lico.xml"),
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<lico><entry word=\"poich\xE9\"/></lico>",
        hour_ago,
    );

    let results = ConversionOrchestrator::new(settings).try_convert_all(false).unwrap();
    let lico = results.iter().find(|r| r.file.lex_id == "lico").unwrap();
    assert!(lico.succeeded(), "{:?}", lico.error);

    let json = std::fs::read_to_string(dir.path().join("lico.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["entry"]["word"], "poich\u{e9}");
}

#[test]
fn test_invalid_utf8_is_a_positioned_xml_error() {
    let (dir, settings) = lexicon_dir();
    write_with_mtime(
        &dir.path().join("dimlex.xml"),
        b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<dimlex><entry word=\"poich\xE9\"/></dimlex>",
        SystemTime::now() - Duration::from_secs(3600),
    );

    let results = ConversionOrchestrator::new(settings).try_convert_all(false).unwrap();
    let error = results[0].error.as_ref().unwrap();
    assert_eq!(error.code, 422);
    let diagnostics = error.xml_errors.as_ref().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!((diagnostics[0].line, diagnostics[0].column), (2, 27));
    assert!(!dir.path().join("dimlex.json").exists());
}

#[test]
fn test_force_requires_deployment_switch() {
    let (_dir, settings) = lexicon_dir();
    let orchestrator = ConversionOrchestrator::new(settings.clone());
    orchestrator.try_convert_all(false).unwrap();

    assert!(!orchestrator.force_effective(true));
    assert!(!orchestrator.try_convert_all(true).unwrap()[0].attempted());

    let forcing = ConversionOrchestrator::new(Settings {
        allow_force_reparse: true,
        ..settings
    });
    assert!(forcing.force_effective(true));
    let forced = forcing.try_convert_all(true).unwrap();
    assert!(forced[0].succeeded());
    assert!(forced[0].before_conversion.as_ref().unwrap().has_json);
}

#[test]
fn test_list_converts_only_with_auto_convert() {
    let (dir, settings) = lexicon_dir();

    let passive = ConversionOrchestrator::new(Settings {
        auto_convert: false,
        ..settings.clone()
    });
    let listed = passive.list(false).unwrap();
    assert!(!listed[0].attempted());
    assert!(!dir.path().join("dimlex.json").exists());

    let active = ConversionOrchestrator::new(settings);
    let listed = active.list(false).unwrap();
    assert!(listed[0].succeeded());
    assert!(dir.path().join("dimlex.json").exists());
}

#[test]
fn test_served_files_and_not_found() {
    let (dir, settings) = lexicon_dir();
    ConversionOrchestrator::new(settings).try_convert_all(false).unwrap();
    std::fs::write(dir.path().join("dimlex.meta"), META).unwrap();

    let json = read_served_file(dir.path(), "dimlex").unwrap();
    assert_eq!(json, std::fs::read(dir.path().join("dimlex.json")).unwrap());
    let meta = read_served_file(dir.path(), "dimlex.meta").unwrap();
    assert_eq!(meta, META.as_bytes());

    let err = read_served_file(dir.path(), "lico").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref name) if name == "lico.json"));
    assert_eq!(err.code(), 404);
    assert!(matches!(
        read_served_file(dir.path(), "../dimlex.json"),
        Err(StoreError::InvalidFilename)
    ));
}

#[test]
fn test_catalog_loads_and_normalizes_once() {
    let (dir, settings) = lexicon_dir();
    std::fs::write(dir.path().join("dimlex.meta"), META).unwrap();
    std::fs::write(
        dir.path().join("syn-maps.json"),
        r#"{ "dimlex": { "konnadv": ["adv", "cco"] } }"#,
    )
    .unwrap();

    let orchestrator = ConversionOrchestrator::new(settings.clone());
    let files: Vec<_> = orchestrator
        .try_convert_all(false)
        .unwrap()
        .into_iter()
        .map(|result| result.file)
        .collect();

    let mut catalog = LexiconCatalog::open(&settings, files).unwrap();
    assert_eq!(catalog.metadata("dimlex").unwrap().lexicon_name, "DiMLex");

    let lexicon = catalog.load("dimlex").unwrap();
    assert!(lexicon.is_processed);
    let entry = &lexicon.entry[0];
    assert_eq!(entry.lex_id, "dimlex");
    assert_eq!(entry.lex_name, "DiMLex");
    assert_eq!(entry.language.as_deref(), Some("German"));
    assert_eq!(entry.syn.len(), 2, "konnadv fans out to adv and cco");

    let first_load = lexicon.clone();
    assert_eq!(catalog.load("dimlex").unwrap(), &first_load);
    assert_eq!(catalog.loaded().len(), 1);

    let err = catalog.load("lico").unwrap_err();
    assert!(matches!(err, StoreError::UnknownLexicon(_)));
    assert_eq!(err.code(), 404);

    assert!(catalog.unload("dimlex").is_some());
    assert!(catalog.loaded().is_empty());
}

#[test]
fn test_unreadable_metadata_falls_back_to_lex_id() {
    let (dir, settings) = lexicon_dir();
    std::fs::write(dir.path().join("dimlex.meta"), "{ not json").unwrap();
    let files: Vec<_> = ConversionOrchestrator::new(settings.clone())
        .try_convert_all(false)
        .unwrap()
        .into_iter()
        .map(|result| result.file)
        .collect();

    let mut catalog = LexiconCatalog::open(&settings, files).unwrap();
    assert!(catalog.metadata("dimlex").is_none());
    let lexicon = catalog.load("dimlex").unwrap();
    assert_eq!(lexicon.entry[0].lex_name, "dimlex");
    assert_eq!(lexicon.entry[0].syn.len(), 1, "no tagset, no remapping");
}

#[test]
fn test_settings_resolve_relative_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "xmlDirectory": "lexicons", "allowForceReparse": true }"#).unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.xml_directory, dir.path().join("lexicons"));
    assert!(settings.allow_force_reparse);
    assert!(settings.auto_convert);
    assert_eq!(settings.syn_maps_path(), dir.path().join("lexicons").join("syn-maps.json"));

    assert!(matches!(
        Settings::load(&dir.path().join("missing.json")),
        Err(StoreError::Settings { .. })
    ));
    std::fs::write(&path, "[").unwrap();
    assert!(matches!(Settings::load(&path), Err(StoreError::SettingsParse { .. })));
}
