//! Positioned XML element tree.
//!
//! The ReqIF reader, the schema compiler and the rich text scanner all work on
//! this tree. Every element remembers where it sits in the source text, so
//! markup that must be preserved verbatim (XHTML values, tool extensions) is
//! sliced straight out of the input instead of being re-serialized.

use crate::common::xml::escape::unescape_xml;
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::ops::Range;

/// Namespace bound to the reserved `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A single attribute with its qualified name split into parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Name as written, including any prefix
    pub name: String,
    /// Name without prefix
    pub local_name: String,
    /// Namespace URI, only set for prefixed attributes
    pub namespace: Option<String>,
    /// Unescaped value
    pub value: String,
}

/// An element and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Name without prefix
    pub local_name: String,
    /// Prefix as written, if any
    pub prefix: Option<String>,
    /// Resolved namespace URI; `None` when unqualified or the prefix is undeclared
    pub namespace: Option<String>,
    /// Attributes in document order, namespace declarations excluded
    pub attributes: Vec<XmlAttribute>,
    /// Namespace declarations made on this element (`None` prefix is `xmlns`)
    pub declarations: Vec<(Option<String>, String)>,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
    /// Whether non-whitespace character data appears directly inside
    pub has_text: bool,
    /// Byte range of the whole element, tags included
    pub span: Range<usize>,
    /// Byte range between the start and end tag (empty for `<a/>`)
    pub inner: Range<usize>,
}

impl XmlElement {
    /// Value of the first attribute with the given local name.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.local_name == local_name)
            .map(|attr| attr.value.as_str())
    }

    /// First child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name == local_name)
    }

    /// All children with the given local name.
    pub fn children_named<'a>(
        &'a self,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.local_name == local_name)
    }

    /// Pre-order walk over this element and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Raw markup between the start and end tag.
    pub fn inner_xml<'s>(&self, source: &'s str) -> &'s str {
        &source[self.inner.clone()]
    }

    /// Unescaped character content of a leaf element, trimmed.
    pub fn text(&self, source: &str) -> String {
        unescape_xml(self.inner_xml(source).trim())
    }
}

/// Iterator returned by [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// A complete XML document: exactly one root element.
#[derive(Debug)]
pub struct XmlDocument<'s> {
    source: &'s str,
    root: XmlElement,
}

impl<'s> XmlDocument<'s> {
    /// Parse a full document from UTF-8 bytes.
    pub fn from_bytes(bytes: &'s [u8]) -> Result<Self> {
        let source = std::str::from_utf8(bytes)?;
        Self::parse(source)
    }

    /// Parse a full document. A leading byte order mark is dropped so that
    /// element spans index the returned [`source`](Self::source).
    pub fn parse(source: &'s str) -> Result<Self> {
        let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
        let mut roots = build_tree(source)?;
        match roots.len() {
            0 => Err(Error::InvalidFormat("XML document has no root element".to_string())),
            1 => Ok(Self {
                source,
                root: roots.remove(0),
            }),
            n => Err(Error::InvalidFormat(format!(
                "XML document has {} root elements",
                n
            ))),
        }
    }

    /// The root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// The source text the tree points into.
    pub fn source(&self) -> &'s str {
        self.source
    }
}

/// A markup fragment: any number of top-level elements.
///
/// Rich text values are fragments; they may carry several sibling roots and
/// use prefixes declared by the enclosing document.
#[derive(Debug)]
pub struct XmlFragment<'s> {
    source: &'s str,
    roots: Vec<XmlElement>,
}

impl<'s> XmlFragment<'s> {
    /// Parse a fragment.
    pub fn parse(source: &'s str) -> Result<Self> {
        let roots = build_tree(source)?;
        Ok(Self { source, roots })
    }

    /// Top-level elements in document order.
    pub fn roots(&self) -> &[XmlElement] {
        &self.roots
    }

    /// Every element of the fragment in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.roots.iter().flat_map(|root| root.descendants())
    }

    /// The source text the tree points into.
    pub fn source(&self) -> &'s str {
        self.source
    }
}

/// Namespace bindings introduced by one element.
type Scope = Vec<(Option<String>, String)>;

fn resolve_prefix(scopes: &[Scope], prefix: Option<&str>) -> Option<String> {
    if prefix == Some("xml") {
        return Some(XML_NAMESPACE.to_string());
    }
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter())
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}

fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Build an element from a start tag, pushing its namespace scope.
fn open_element(
    reader: &Reader<&[u8]>,
    start: &BytesStart,
    scopes: &mut Vec<Scope>,
    position: usize,
) -> Result<XmlElement> {
    let mut scope = Scope::new();
    let mut raw_attributes = Vec::new();

    for attr_result in start.attributes() {
        let attr = attr_result?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| Error::InvalidFormat(format!("Invalid attribute value: {}", e)))?
            .into_owned();

        if key == "xmlns" {
            scope.push((None, value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.push((Some(prefix.to_string()), value));
        } else {
            raw_attributes.push((key, value));
        }
    }
    let declarations = scope.clone();
    scopes.push(scope);

    let qname = std::str::from_utf8(start.name().as_ref())?.to_string();
    let (prefix, local_name) = split_name(&qname);
    let namespace = resolve_prefix(scopes, prefix);

    let attributes = raw_attributes
        .into_iter()
        .map(|(name, value)| {
            let (attr_prefix, attr_local) = split_name(&name);
            // Unprefixed attributes never take the default namespace
            let namespace = attr_prefix.and_then(|p| resolve_prefix(scopes, Some(p)));
            XmlAttribute {
                local_name: attr_local.to_string(),
                namespace,
                name: name.clone(),
                value,
            }
        })
        .collect();

    Ok(XmlElement {
        local_name: local_name.to_string(),
        prefix: prefix.map(str::to_string),
        namespace,
        attributes,
        declarations,
        children: Vec::new(),
        has_text: false,
        span: position..position,
        inner: position..position,
    })
}

fn attach(stack: &mut [XmlElement], roots: &mut Vec<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

/// Read `source` into a list of top-level elements.
fn build_tree(source: &str) -> Result<Vec<XmlElement>> {
    let mut reader = Reader::from_str(source);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut scopes: Vec<Scope> = Vec::new();
    let mut roots = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event_into(&mut buf)?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(ref e) => {
                let mut element = open_element(&reader, e, &mut scopes, before)?;
                element.inner = after..after;
                stack.push(element);
            },
            Event::Empty(ref e) => {
                let mut element = open_element(&reader, e, &mut scopes, before)?;
                scopes.pop();
                element.span = before..after;
                element.inner = after..after;
                attach(&mut stack, &mut roots, element);
            },
            Event::End(_) => {
                let mut element = stack.pop().ok_or_else(|| {
                    Error::InvalidFormat("Unexpected closing tag".to_string())
                })?;
                scopes.pop();
                element.inner = element.inner.start..before;
                element.span = element.span.start..after;
                attach(&mut stack, &mut roots, element);
            },
            Event::Text(ref t) => {
                if let Some(current) = stack.last_mut()
                    && t.iter().any(|b| !b.is_ascii_whitespace())
                {
                    current.has_text = true;
                }
            },
            Event::CData(_) => {
                if let Some(current) = stack.last_mut() {
                    current.has_text = true;
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::InvalidFormat(format!(
            "Unclosed element <{}> at byte {}",
            open.local_name, open.span.start
        )));
    }

    Ok(roots)
}
