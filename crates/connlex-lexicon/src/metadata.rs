//! Per-lexicon descriptive metadata (`<lexId>.meta`).

use serde::{Deserialize, Serialize};

use crate::color::lexicon_color;
use crate::model::Extra;

/// Native tagsets the lexicon is annotated with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_tagset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sense_tagset: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexiconMetadata {
    pub lexicon_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_english: Option<String>,
    #[serde(default)]
    pub parse_info: ParseInfo,
    /// Cached display color; derived from `lexicon_name` on first use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl LexiconMetadata {
    pub fn new(lexicon_name: impl Into<String>) -> Self {
        Self {
            lexicon_name: lexicon_name.into(),
            ..Self::default()
        }
    }

    /// Metadata for a lexicon without a `.meta` file: named after its id,
    /// no tagsets (remapping disabled on both axes).
    pub fn fallback(lex_id: &str) -> Self {
        Self::new(lex_id)
    }

    pub fn with_tagsets(mut self, pos: Option<&str>, sense: Option<&str>) -> Self {
        self.parse_info.pos_tagset = pos.map(str::to_string);
        self.parse_info.sense_tagset = sense.map(str::to_string);
        self
    }

    pub fn color(&mut self) -> &str {
        let name = &self.lexicon_name;
        self.color.get_or_insert_with(|| lexicon_color(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_meta_file_shape() {
        let meta: LexiconMetadata = serde_json::from_str(
            r#"{
                "lexiconName": "DiMLex",
                "languageEnglish": "German",
                "parseInfo": { "posTagset": "dimlex", "senseTagset": "pdtb3" },
                "version": "2.0"
            }"#,
        )
        .unwrap();
        assert_eq!(meta.lexicon_name, "DiMLex");
        assert_eq!(meta.language_english.as_deref(), Some("German"));
        assert_eq!(meta.parse_info.pos_tagset.as_deref(), Some("dimlex"));
        assert!(meta.extra.contains_key("version"));
        assert!(meta.color.is_none());
    }

    #[test]
    fn color_is_computed_once() {
        let mut meta = LexiconMetadata::new("hello");
        assert_eq!(meta.color(), "e918d2");
        meta.lexicon_name = "renamed".into();
        assert_eq!(meta.color(), "e918d2");
    }

    #[test]
    fn fallback_has_no_tagsets() {
        let meta = LexiconMetadata::fallback("lico");
        assert_eq!(meta.lexicon_name, "lico");
        assert_eq!(meta.parse_info, ParseInfo::default());
    }
}
