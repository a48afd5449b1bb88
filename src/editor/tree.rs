//! Owned, loosely-typed XML tree for the metadata editor
//!
//! Unlike the parser, which only borrows a DOM long enough to build the
//! strict model, the editor needs a tree it can mutate and write back out.
//! The XML declaration and the DOCTYPE are kept as fields of the document
//! so they survive a read/write cycle.

use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

use crate::error::InvalidNzbError;

/// The `<?xml ...?>` declaration of a document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// XML version, usually `1.0`
    pub version: String,
    /// Encoding named by the source document
    ///
    /// Output is always written as UTF-8 and declared as such.
    pub encoding: Option<String>,
    /// Standalone flag, when present
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("utf-8".to_string()),
            standalone: None,
        }
    }
}

/// A node inside an element
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum XmlNode {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    /// Raw comment body
    Comment(String),
    /// Raw processing instruction body
    ProcessingInstruction(String),
}

/// An element with its attributes (in source order) and children
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Name without a namespace prefix
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text and CDATA content of the direct children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(t) | XmlNode::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_named(&self, local_name: &str) -> bool {
        self.local_name() == local_name
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = utf8(start.name().as_ref())?.to_string();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| e.to_string())?;
            let key = utf8(attribute.key.as_ref())?.to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| e.to_string())?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }
}

/// A whole document: declaration, DOCTYPE and root element
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct XmlDocument {
    pub declaration: Option<Declaration>,
    /// DOCTYPE body, without the surrounding `<!DOCTYPE` and `>`
    pub doctype: Option<String>,
    pub root: Element,
}

impl XmlDocument {
    /// Read a document
    ///
    /// Whitespace-only text is dropped; it is regenerated on output.
    /// Comments and processing instructions outside the root element are
    /// not kept.
    pub fn parse(text: &str) -> Result<Self, InvalidNzbError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut declaration = None;
        let mut doctype = None;
        let mut root: Option<Element> = None;
        let mut open: Vec<Element> = Vec::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(InvalidNzbError::malformed_at(
                        e.to_string(),
                        text,
                        reader.buffer_position(),
                    ));
                }
            };
            let malformed =
                |message: String| InvalidNzbError::malformed_at(message, text, reader.buffer_position());

            match event {
                Event::Decl(decl) => {
                    declaration = Some(read_declaration(&decl).map_err(malformed)?);
                }
                Event::DocType(body) => {
                    doctype = Some(utf8(&body).map_err(malformed)?.trim().to_string());
                }
                Event::Start(start) => {
                    open.push(Element::from_start(&start).map_err(malformed)?);
                }
                Event::Empty(start) => {
                    let element = Element::from_start(&start).map_err(malformed)?;
                    attach(&mut open, &mut root, element).map_err(malformed)?;
                }
                Event::End(end) => {
                    let element = open.pop().ok_or_else(|| {
                        malformed(format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(end.name().as_ref())
                        ))
                    })?;
                    attach(&mut open, &mut root, element).map_err(malformed)?;
                }
                Event::Text(content) => {
                    if let Some(parent) = open.last_mut() {
                        let content = content.unescape().map_err(|e| malformed(e.to_string()))?;
                        parent.children.push(XmlNode::Text(content.into_owned()));
                    }
                }
                Event::CData(content) => {
                    if let Some(parent) = open.last_mut() {
                        let content = utf8(&content).map_err(malformed)?.to_string();
                        parent.children.push(XmlNode::CData(content));
                    }
                }
                Event::Comment(content) => {
                    if let Some(parent) = open.last_mut() {
                        let content = utf8(&content).map_err(malformed)?.to_string();
                        parent.children.push(XmlNode::Comment(content));
                    }
                }
                Event::PI(content) => {
                    if let Some(parent) = open.last_mut() {
                        let content = utf8(&content).map_err(malformed)?.to_string();
                        parent
                            .children
                            .push(XmlNode::ProcessingInstruction(content));
                    }
                }
                Event::Eof => break,
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(InvalidNzbError::malformed_at(
                format!("unclosed element <{}>", unclosed.name),
                text,
                text.len(),
            ));
        }

        let root = root.ok_or_else(|| {
            InvalidNzbError::malformed_at("no root element", text, text.len())
        })?;

        Ok(Self {
            declaration,
            doctype,
            root,
        })
    }

    /// Write the document as UTF-8 XML, indenting nested elements by
    /// `indent` spaces
    ///
    /// The declaration always comes first and names UTF-8, followed by the
    /// DOCTYPE if the source had one. There is no trailing newline.
    pub fn to_xml(&self, indent: usize) -> quick_xml::Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);

        let declaration = self.declaration.clone().unwrap_or_default();
        writer.write_event(Event::Decl(BytesDecl::new(
            &declaration.version,
            Some("utf-8"),
            declaration.standalone.as_deref(),
        )))?;

        if let Some(doctype) = &self.doctype {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
        }

        write_element(&mut writer, &self.root)?;

        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

fn read_declaration(decl: &BytesDecl<'_>) -> Result<Declaration, String> {
    let version = decl.version().map_err(|e| e.to_string())?;
    Ok(Declaration {
        version: utf8(&version)?.to_string(),
        encoding: optional_value(decl.encoding())?,
        standalone: optional_value(decl.standalone())?,
    })
}

fn optional_value(value: Option<quick_xml::Result<Cow<'_, [u8]>>>) -> Result<Option<String>, String> {
    value
        .transpose()
        .map_err(|e| e.to_string())?
        .map(|bytes| utf8(&bytes).map(str::to_string))
        .transpose()
}

/// Hand a finished element to its parent, or make it the root
fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    if let Some(parent) = open.last_mut() {
        parent.children.push(XmlNode::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(format!(
            "unexpected element <{}> after the root element",
            element.name
        ));
    }
    *root = Some(element);
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
) -> quick_xml::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
            XmlNode::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
            }
            XmlNode::ProcessingInstruction(text) => {
                writer.write_event(Event::PI(BytesText::from_escaped(text.as_str())))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| e.to_string())
}
