//! Owned XML element tree
//!
//!     The bridge needs a document it can build, hand to an editor, read back and walk in
//!     order. [Element] is that document: a name, attributes in document order and mixed
//!     children. Reading and writing go through quick-xml's event API.

use crate::error::XmlError;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

/// Deepest element nesting [Element::parse] accepts. A configuration at the scanner's
/// default bracket limit needs about half of it.
pub const MAX_DEPTH: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn push_element(&mut self, element: Element) -> &mut Element {
        self.children.push(XmlNode::Element(element));
        match self.children.last_mut() {
            Some(XmlNode::Element(element)) => element,
            _ => unreachable!("an element was just pushed"),
        }
    }

    /// Append text, merging with a directly preceding text node
    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(XmlNode::Text(previous)) = self.children.last_mut() {
            previous.push_str(&text);
        } else {
            self.children.push(XmlNode::Text(text));
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Drop whitespace-only text between child elements. Text-only content is kept as is.
    fn strip_indentation(&mut self) {
        if self.elements().next().is_some() {
            self.children.retain(|child| match child {
                XmlNode::Text(text) => !text.trim().is_empty(),
                XmlNode::Element(_) => true,
            });
        }
    }

    /// Concatenated text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Element, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(XmlError::Malformed(format!(
                            "elements nested deeper than {MAX_DEPTH} levels"
                        )));
                    }
                    stack.push(element_from(&start)?)
                }
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unexpected end tag".into()))?;
                    element.strip_indentation();
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(XmlError::Malformed(
                                "text outside the root element".into(),
                            ))
                        }
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| XmlError::Malformed(e.to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(text),
                        None => {
                            return Err(XmlError::Malformed(
                                "CDATA outside the root element".into(),
                            ))
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if let Some(open) = stack.last() {
            return Err(XmlError::Malformed(format!("<{}> is not closed", open.name)));
        }
        root.ok_or_else(|| XmlError::Malformed("document has no root element".into()))
    }

    /// Serialize with an XML declaration, indenting nested elements by `indent` spaces.
    pub fn to_xml_string(&self, indent: usize) -> Result<String, XmlError> {
        let mut out = Vec::new();
        self.write_document(&mut out, indent)?;
        String::from_utf8(out).map_err(|e| XmlError::Malformed(e.to_string()))
    }

    pub fn write_document<W: Write>(&self, out: W, indent: usize) -> Result<(), XmlError> {
        let mut writer = if indent == 0 {
            Writer::new(out)
        } else {
            Writer::new_with_indent(out, b' ', indent)
        };
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_element(&mut writer)?;
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }

    fn write_element<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        let has_elements = self.elements().next().is_some();
        let children: Vec<&XmlNode> = self
            .children
            .iter()
            .filter(|child| match child {
                // indentation replaces the whitespace between elements
                XmlNode::Text(text) => !(has_elements && text.trim().is_empty()) && !text.is_empty(),
                XmlNode::Element(_) => true,
            })
            .collect();
        if children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        for child in children {
            match child {
                XmlNode::Element(element) => element.write_element(writer)?,
                XmlNode::Text(text) => {
                    let escaped = escape(text.as_str()).replace('\r', "&#13;");
                    writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| XmlError::Malformed(e.to_string()))?
        .to_string();
    let mut element = Element::new(name);
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .to_string();
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_element(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(XmlError::Malformed("more than one root element".into())),
    }
}
