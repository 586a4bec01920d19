//! Owned XML tree for the parts of a docx package.
//!
//! Parts are small (a template page is a few hundred kilobytes at most) so they are loaded whole,
//! edited in place and written back. Element names keep their namespace prefix (`w:tbl`), which
//! is how Word writes them.

use crate::{WordError, WordResult};
use quick_xml::{
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    declaration: Option<Declaration>,
    pub root: Element,
}

impl Element {
    #[must_use]
    pub fn new(name: &str) -> Element {
        Element {
            name: name.to_string(),
            ..Element::default()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Element {
        self.set_attr(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Element) -> Element {
        self.children.push(Node::Element(child));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: &str) -> Element {
        self.children.push(Node::Text(text.to_string()));
        self
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    /// Child elements, skipping text and comments
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Every element called `name` below this one, in document order
    #[must_use]
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    /// Call `f` on this element and then on every element below it, parents before children
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in self.elements_mut() {
            child.visit_mut(f);
        }
    }

    /// Text nodes directly inside this element
    #[must_use]
    pub fn own_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace the content with a single text node
    pub fn set_text(&mut self, text: &str) {
        self.children = vec![Node::Text(text.to_string())];
    }

    /// Element reached by following child positions (indices into `children`)
    #[must_use]
    pub fn at(&self, path: &[usize]) -> Option<&Element> {
        path.iter().try_fold(self, |e, i| match e.children.get(*i) {
            Some(Node::Element(child)) => Some(child),
            _ => None,
        })
    }

    pub fn at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        path.iter().try_fold(self, |e, i| match e.children.get_mut(*i) {
            Some(Node::Element(child)) => Some(child),
            _ => None,
        })
    }
}

impl XmlDocument {
    #[must_use]
    pub fn new(root: Element) -> XmlDocument {
        XmlDocument {
            declaration: Some(Declaration {
                version: "1.0".to_string(),
                encoding: Some("UTF-8".to_string()),
                standalone: Some("yes".to_string()),
            }),
            root,
        }
    }

    /// # Errors
    ///
    /// Fails on malformed XML or when the document has no root element
    pub fn parse(bytes: &[u8]) -> WordResult<XmlDocument> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        let mut declaration = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Decl(d) => {
                    let version = d.version().map_err(quick_xml::Error::from)?;
                    let encoding = d.encoding().transpose().map_err(quick_xml::Error::from)?;
                    let standalone = d.standalone().transpose().map_err(quick_xml::Error::from)?;

                    declaration = Some(Declaration {
                        version: lossy(&version),
                        encoding: encoding.map(|e| lossy(&e)),
                        standalone: standalone.map(|s| lossy(&s)),
                    });
                }
                Event::Start(e) => stack.push(element_from(&e)?),
                Event::Empty(e) => {
                    let element = element_from(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| WordError::MalformedXml("unexpected closing tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(t.unescape()?.into_owned()));
                    }
                }
                Event::CData(c) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::CData(lossy(&c.into_inner())));
                    }
                }
                Event::Comment(c) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Comment(lossy(&c)));
                    }
                }
                Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(WordError::MalformedXml(format!(
                "`{}` is never closed",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }

        let root = root.ok_or_else(|| WordError::MalformedXml("no root element".into()))?;
        Ok(XmlDocument { declaration, root })
    }

    /// # Errors
    ///
    /// Fails if the writer fails, which only happens on allocation problems
    pub fn to_bytes(&self) -> WordResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        if let Some(d) = &self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new(
                &d.version,
                d.encoding.as_deref(),
                d.standalone.as_deref(),
            )))?;
            writer.write_event(Event::Text(BytesText::from_escaped("\r\n")))?;
        }

        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn element_from(start: &BytesStart<'_>) -> WordResult<Element> {
    let mut element = Element::new(&lossy(start.name().as_ref()));

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        element
            .attributes
            .push((lossy(attr.key.as_ref()), attr.unescape_value()?.into_owned()));
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> WordResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(WordError::MalformedXml("more than one root element".into())),
    }

    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> WordResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (k, v) in &element.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
            Node::CData(c) => writer.write_event(Event::CData(BytesCData::new(c.as_str())))?,
            Node::Comment(c) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;

    Ok(())
}
