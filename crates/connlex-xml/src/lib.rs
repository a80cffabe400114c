//! XML → JSON conversion for connective lexicons.
//!
//! Two layers:
//!
//! - [`tree`] reads source text into a [`RawXmlNode`] tree, collecting every
//!   parser diagnostic instead of stopping at the first.
//! - [`convert`] turns an element tree into an [`XmlValue`] under a
//!   configurable array/scalar/text policy ([`ConvertOptions`]).
//!
//! [`convert_document`] is the entry point used for lexicon files: it
//! converts the document root inside its named wrapper, then keeps only the
//! wrapped value. [`to_markup_safe_json`] serializes that value with `<` and
//! `>` escaped so the JSON can be embedded in markup as-is.

pub mod convert;
pub mod tree;

pub use convert::{convert, convert_named, ConvertOptions, XmlObject, XmlValue, LEXICON_ARRAY_TAGS};
pub use tree::{decode_source, parse_document, parse_document_bytes, RawXmlNode, XmlDiagnostic};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("malformed XML: {} parser error(s), first: {}", .diagnostics.len(), first_message(.diagnostics))]
    Malformed { diagnostics: Vec<XmlDiagnostic> },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    /// Parser diagnostics carried by a malformed-XML failure.
    pub fn diagnostics(&self) -> &[XmlDiagnostic] {
        match self {
            ConvertError::Malformed { diagnostics } => diagnostics,
            ConvertError::Json(_) => &[],
        }
    }
}

fn first_message(diagnostics: &[XmlDiagnostic]) -> String {
    diagnostics
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Parse and convert a document, returning the root element's value.
pub fn convert_document(source: &str, options: &ConvertOptions) -> Result<XmlValue, ConvertError> {
    let root = parse_document(source).map_err(|diagnostics| ConvertError::Malformed { diagnostics })?;
    Ok(root_value(&root, options))
}

/// [`convert_document`] over raw file contents in their declared encoding.
pub fn convert_document_bytes(bytes: &[u8], options: &ConvertOptions) -> Result<XmlValue, ConvertError> {
    let root = parse_document_bytes(bytes).map_err(|diagnostics| ConvertError::Malformed { diagnostics })?;
    Ok(root_value(&root, options))
}

fn root_value(root: &RawXmlNode, options: &ConvertOptions) -> XmlValue {
    convert_named(root, options)
        .into_entries()
        .into_iter()
        .next()
        .map(|(_, value)| value)
        .unwrap_or(XmlValue::Object(XmlObject::new()))
}

/// Serialize with angle brackets escaped as `&lt;` / `&gt;`.
pub fn to_markup_safe_json(value: &XmlValue, pretty: bool) -> Result<String, ConvertError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(escape_angle_brackets(&json))
}

pub fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
