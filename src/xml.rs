use std::fmt;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub enum XmlError {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    Parse(String),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::Io(e) => write!(f, "I/O error: {e}"),
            XmlError::Xml(e) => write!(f, "XML error: {e}"),
            XmlError::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for XmlError {}

impl From<std::io::Error> for XmlError {
    fn from(e: std::io::Error) -> Self {
        XmlError::Io(e)
    }
}

impl From<quick_xml::Error> for XmlError {
    fn from(e: quick_xml::Error) -> Self {
        XmlError::Xml(e)
    }
}

// ── Generic element tree ────────────────────────────────────────────

/// A plain attribute-preserving view of one XML element subtree.
///
/// This is the passthrough representation used wherever the document has no
/// specialized schema (Configuration, FieldsConfiguration, unrecognized Case
/// and Casetable children). Attribute order follows the source document, which
/// is observable both in menu summaries and in re-serialized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct XmlNode {
    pub tag: String,
    #[ts(type = "Record<string, string>")]
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Parse a full document string into its root element.
    ///
    /// The XML declaration, comments, and processing instructions are
    /// dropped; element text is trimmed. Fails on malformed markup or when
    /// the document has no root element.
    pub fn parse(source: &str) -> Result<XmlNode, XmlError> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        // Sentinel holder for the root; children of the stack top accumulate
        // as elements close.
        let mut stack: Vec<XmlNode> = vec![XmlNode::new("")];

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from_start(e));
                }
                Ok(Event::Empty(ref e)) => {
                    let node = element_from_start(e);
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Ok(Event::End(_)) => {
                    let Some(node) = stack.pop() else {
                        break;
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => {
                            return Err(XmlError::Parse("unbalanced end tag".into()));
                        }
                    }
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().unwrap_or_default().trim().to_string();
                    if text.is_empty() {
                        continue;
                    }
                    if let Some(current) = stack.last_mut() {
                        if current.text.is_empty() {
                            current.text = text;
                        } else {
                            current.text.push(' ');
                            current.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).trim().to_string();
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {}
                Err(e) => return Err(XmlError::Xml(e)),
            }
        }

        let mut sentinel = stack
            .pop()
            .ok_or_else(|| XmlError::Parse("empty document".into()))?;
        if !stack.is_empty() {
            return Err(XmlError::Parse("unclosed element at end of input".into()));
        }
        match sentinel.children.len() {
            0 => Err(XmlError::Parse("no root element".into())),
            _ => Ok(sentinel.children.swap_remove(0)),
        }
    }

    /// First direct child with the given tag.
    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All direct children with the given tag, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Attribute value, if present.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Trimmed text of the first direct child with the given tag, or `""`.
    #[must_use]
    pub fn child_text(&self, tag: &str) -> String {
        self.find(tag).map(|c| c.text.clone()).unwrap_or_default()
    }

    /// Serialize this element (as document root) back to XML.
    ///
    /// Emits the standard declaration, attributes in map order, and
    /// self-closing tags for childless, textless elements. For any tree
    /// produced by [`XmlNode::parse`] this is its inverse.
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        // Writing into an in-memory Vec cannot fail.
        let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)));
        write_element(&mut writer, self);
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }
}

fn element_from_start(e: &BytesStart<'_>) -> XmlNode {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let val = attr
            .unescape_value()
            .map(std::borrow::Cow::into_owned)
            .unwrap_or_default();
        node.attributes.insert(key, val);
    }
    node
}

fn write_element(writer: &mut Writer<Vec<u8>>, node: &XmlNode) {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_empty() {
        let _ = writer.write_event(Event::Empty(start));
        return;
    }

    let _ = writer.write_event(Event::Start(start));
    if !node.text.is_empty() {
        let _ = writer.write_event(Event::Text(BytesText::new(&node.text)));
    }
    for child in &node.children {
        write_element(writer, child);
    }
    let _ = writer.write_event(Event::End(BytesEnd::new(node.tag.as_str())));
}
