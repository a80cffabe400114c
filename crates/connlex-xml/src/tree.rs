//! Tolerant XML element-tree reader.
//!
//! Builds a [`RawXmlNode`] tree from source text on top of quick-xml's event
//! reader. Tag balancing is checked here instead of inside quick-xml, so one
//! pass reports every mismatched or unclosed element rather than stopping at
//! the first one. Syntax errors that quick-xml itself cannot get past end the
//! pass with a single diagnostic.
//!
//! [`parse_document_bytes`] first decodes raw file contents according to a
//! byte-order mark or the `encoding` of the XML declaration (UTF-8 when
//! neither is present); undecodable input is a diagnostic like any other.

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// ============================================================================
// Types
// ============================================================================

/// One parser complaint, positioned in the source text (1-based line/column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlDiagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for XmlDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// An element with its attributes (document order), child elements and the
/// trimmed concatenation of its direct text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawXmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RawXmlNode>,
    pub text: Option<String>,
}

impl RawXmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: RawXmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        self.text = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}

// ============================================================================
// Positions
// ============================================================================

/// Byte offsets of line starts, for turning reader offsets into line/column.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    fn locate(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }

    fn diagnostic(&self, offset: usize, message: impl Into<String>) -> XmlDiagnostic {
        let (line, column) = self.locate(offset);
        XmlDiagnostic {
            line,
            column,
            message: message.into(),
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

struct Frame {
    node: RawXmlNode,
    text: String,
    opened_at: usize,
}

struct TreeBuilder<'t> {
    lines: LineIndex,
    source: &'t str,
    stack: Vec<Frame>,
    root: Option<RawXmlNode>,
    diagnostics: Vec<XmlDiagnostic>,
}

impl<'t> TreeBuilder<'t> {
    fn new(source: &'t str) -> Self {
        Self {
            lines: LineIndex::new(source),
            source,
            stack: Vec::new(),
            root: None,
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, offset: usize, message: impl Into<String>) {
        let diagnostic = self.lines.diagnostic(offset.min(self.source.len()), message);
        self.diagnostics.push(diagnostic);
    }

    fn open(&mut self, start: &BytesStart<'_>, offset: usize) -> RawXmlNode {
        let mut node = RawXmlNode::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            match attr {
                Ok(attr) => {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = match attr.unescape_value() {
                        Ok(value) => value.into_owned(),
                        Err(err) => {
                            self.report(offset, format!("attribute `{key}`: {err}"));
                            String::from_utf8_lossy(&attr.value).into_owned()
                        }
                    };
                    node.attributes.push((key, value));
                }
                Err(err) => self.report(offset, format!("element <{}>: {err}", node.name)),
            }
        }
        node
    }

    fn push_text(&mut self, text: &str, offset: usize) {
        match self.stack.last_mut() {
            Some(frame) => frame.text.push_str(text),
            None if text.trim().is_empty() => {}
            None => self.report(offset, "text content outside of the root element"),
        }
    }

    fn attach(&mut self, node: RawXmlNode, offset: usize) {
        if let Some(parent) = self.stack.last_mut() {
            parent.node.children.push(node);
        } else if self.root.is_none() {
            self.root = Some(node);
        } else {
            self.report(offset, format!("extra content after the root element: <{}>", node.name));
        }
    }

    fn close_top(&mut self, offset: usize) {
        if let Some(frame) = self.stack.pop() {
            let node = frame.node.with_text(frame.text);
            self.attach(node, offset);
        }
    }

    fn end(&mut self, name: &str, offset: usize) {
        let Some(depth) = self.stack.iter().rposition(|f| f.node.name == name) else {
            self.report(offset, format!("unexpected end tag </{name}>"));
            return;
        };
        while self.stack.len() > depth + 1 {
            let unclosed = self
                .stack
                .last()
                .map(|f| f.node.name.clone())
                .unwrap_or_default();
            self.report(
                offset,
                format!("opening and ending tag mismatch: <{unclosed}> closed by </{name}>"),
            );
            self.close_top(offset);
        }
        self.close_top(offset);
    }

    fn finish(mut self, fatal: bool) -> Result<RawXmlNode, Vec<XmlDiagnostic>> {
        if !fatal {
            while let Some(frame) = self.stack.pop() {
                self.report(
                    frame.opened_at,
                    format!("premature end of data: <{}> is not closed", frame.node.name),
                );
                // Already reported; an unclosed element after the root is
                // not reported again as extra content.
                let node = frame.node.with_text(frame.text);
                match self.stack.last_mut() {
                    Some(parent) => parent.node.children.push(node),
                    None => {
                        self.root.get_or_insert(node);
                    }
                }
            }
            if self.root.is_none() && self.diagnostics.is_empty() {
                self.report(0, "document has no root element");
            }
        }
        match self.root {
            Some(root) if self.diagnostics.is_empty() => Ok(root),
            _ => Err(self.diagnostics),
        }
    }
}

/// Parse a whole XML document into its root element.
///
/// Every problem found is returned, in source order of detection.
pub fn parse_document(source: &str) -> Result<RawXmlNode, Vec<XmlDiagnostic>> {
    let mut reader = Reader::from_str(source);
    reader.check_end_names(false);

    let mut builder = TreeBuilder::new(source);
    let mut fatal = false;

    loop {
        let offset = reader.buffer_position();
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                builder.report(reader.buffer_position(), err.to_string());
                fatal = true;
                break;
            }
        };

        match event {
            Event::Start(start) => {
                let node = builder.open(&start, offset);
                builder.stack.push(Frame {
                    node,
                    text: String::new(),
                    opened_at: offset,
                });
            }
            Event::Empty(start) => {
                let node = builder.open(&start, offset);
                builder.attach(node, offset);
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                builder.end(&name, offset);
            }
            Event::Text(text) => match text.unescape() {
                Ok(text) => builder.push_text(&text, offset),
                Err(err) => {
                    builder.report(offset, err.to_string());
                    let raw = String::from_utf8_lossy(&text).into_owned();
                    builder.push_text(&raw, offset);
                }
            },
            Event::CData(data) => {
                let raw = String::from_utf8_lossy(&data.into_inner()).into_owned();
                builder.push_text(&raw, offset);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry nothing the converter keeps.
            _ => {}
        }
    }

    builder.finish(fatal)
}

// ============================================================================
// Source decoding
// ============================================================================

/// Label of `encoding="..."` in a leading XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<(&[u8], usize)> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let end = bytes.windows(2).position(|w| w == b"?>")?;
    let decl = &bytes[..end];
    let key = decl.windows(8).position(|w| w == b"encoding")?;
    let mut at = key + 8;
    while decl.get(at).is_some_and(|b| b.is_ascii_whitespace() || *b == b'=') {
        at += 1;
    }
    let quote = *decl.get(at).filter(|q| **q == b'"' || **q == b'\'')?;
    let start = at + 1;
    let len = decl[start..].iter().position(|b| *b == quote)?;
    Some((&decl[start..start + len], start))
}

fn utf8_diagnostic(bytes: &[u8], error: std::str::Utf8Error) -> XmlDiagnostic {
    let valid = &bytes[..error.valid_up_to()];
    let prefix = std::str::from_utf8(valid).unwrap_or_default();
    LineIndex::new(prefix).diagnostic(prefix.len(), "invalid UTF-8 byte sequence")
}

/// Decode raw document bytes to text.
///
/// A byte-order mark wins over the declaration; an unknown declared
/// encoding, or bytes invalid in the chosen one, is a diagnostic.
pub fn decode_source(bytes: &[u8]) -> Result<Cow<'_, str>, XmlDiagnostic> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom)) => (encoding, &bytes[bom..]),
        None => match declared_encoding(bytes) {
            Some((label, at)) => match Encoding::for_label(label) {
                Some(encoding) => (encoding, bytes),
                None => {
                    return Err(XmlDiagnostic {
                        line: 1,
                        column: at + 1,
                        message: format!(
                            "unsupported encoding `{}`",
                            String::from_utf8_lossy(label)
                        ),
                    })
                }
            },
            None => (UTF_8, bytes),
        },
    };

    if encoding == UTF_8 {
        return std::str::from_utf8(body)
            .map(Cow::Borrowed)
            .map_err(|error| utf8_diagnostic(body, error));
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| XmlDiagnostic {
            line: 1,
            column: 1,
            message: format!("input is not valid {}", encoding.name()),
        })
}

/// [`parse_document`] over raw bytes, decoded with [`decode_source`].
pub fn parse_document_bytes(bytes: &[u8]) -> Result<RawXmlNode, Vec<XmlDiagnostic>> {
    let source = decode_source(bytes).map_err(|diagnostic| vec![diagnostic])?;
    parse_document(&source)
}
