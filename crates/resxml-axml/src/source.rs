//! Pull-style, namespace-aware XML input.
//!
//! The encoder consumes any [`XmlSource`]. [`QuickXmlSource`] implements it
//! on top of quick-xml, doing its own namespace resolution so that
//! declarations can be enumerated per depth the way a pull parser exposes
//! them.

/// Events produced by an [`XmlSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEvent {
    /// An element was opened. Element and attribute accessors are valid.
    StartTag,
    /// An element was closed. Name, namespace and depth still describe it.
    EndTag,
    /// The input is exhausted.
    EndDocument,
}

/// A namespace-aware pull parser.
///
/// Depth is 1 for the root element, both at its start and at its end tag.
/// Namespace declarations form a stack: `namespace_count(d)` is the number of
/// declarations in scope at depth `d`, so the declarations introduced by the
/// current element are `namespace_count(depth - 1)..namespace_count(depth)`.
pub trait XmlSource {
    /// Advance to the next structural event.
    fn next_event(&mut self) -> crate::Result<XmlEvent>;

    /// Local name of the current element.
    fn name(&self) -> &str;

    /// Prefix of the current element as written.
    fn prefix(&self) -> Option<&str>;

    /// Namespace URI of the current element.
    fn namespace(&self) -> Option<&str>;

    /// Number of attributes of the current start tag, declarations excluded.
    fn attribute_count(&self) -> usize;

    /// Local name of an attribute.
    fn attribute_name(&self, index: usize) -> Option<&str>;

    /// Prefix of an attribute as written.
    fn attribute_prefix(&self, index: usize) -> Option<&str>;

    /// Namespace URI of an attribute.
    fn attribute_namespace(&self, index: usize) -> Option<&str>;

    /// Unescaped attribute value.
    fn attribute_value(&self, index: usize) -> Option<&str>;

    /// Depth of the current element.
    fn depth(&self) -> usize;

    /// Number of namespace declarations in scope at `depth`.
    fn namespace_count(&self, depth: usize) -> usize;

    /// Prefix of a declaration; `None` for the default namespace.
    fn namespace_prefix(&self, index: usize) -> Option<&str>;

    /// URI of a declaration.
    fn namespace_uri(&self, index: usize) -> Option<&str>;

    /// 1-based line of the current event.
    fn line_number(&self) -> u32;
}

#[cfg(feature = "xml-source")]
pub use self::quick::QuickXmlSource;

#[cfg(feature = "xml-source")]
mod quick {
    use log::warn;
    use quick_xml::events::{BytesStart, Event};
    use quick_xml::Reader;

    use super::{XmlEvent, XmlSource};
    use crate::{Error, Result};

    /// Namespace bound to the `xml` prefix.
    const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

    #[derive(Debug, Clone)]
    struct Attribute {
        prefix: Option<String>,
        namespace: Option<String>,
        name: String,
        value: String,
    }

    #[derive(Debug, Clone)]
    struct Element {
        prefix: Option<String>,
        namespace: Option<String>,
        name: String,
        attributes: Vec<Attribute>,
    }

    /// [`XmlSource`] over an in-memory document, backed by quick-xml.
    ///
    /// # Example
    ///
    /// ```
    /// use resxml_axml::{QuickXmlSource, XmlEvent, XmlSource};
    ///
    /// let mut source = QuickXmlSource::new(r#"<a xmlns:x="urn:x" x:k="v"/>"#);
    /// assert_eq!(source.next_event().unwrap(), XmlEvent::StartTag);
    /// assert_eq!(source.attribute_namespace(0), Some("urn:x"));
    /// assert_eq!(source.namespace_count(1), 1);
    /// assert_eq!(source.next_event().unwrap(), XmlEvent::EndTag);
    /// assert_eq!(source.next_event().unwrap(), XmlEvent::EndDocument);
    /// ```
    pub struct QuickXmlSource<'a> {
        input: &'a [u8],
        reader: Reader<&'a [u8]>,
        /// Open elements, innermost last.
        open: Vec<Element>,
        /// The element the current event refers to.
        current: Option<Element>,
        /// Declarations in scope, outermost first.
        namespaces: Vec<(Option<String>, String)>,
        /// `namespace_counts[d]`: declarations in scope at depth `d`.
        namespace_counts: Vec<usize>,
        /// An empty element still owes its end tag.
        pending_end: bool,
        /// The previous event closed an element whose scope is still visible.
        pop_scope: bool,
        line: u32,
        line_scanned: usize,
    }

    impl<'a> QuickXmlSource<'a> {
        /// Create a source over XML text.
        pub fn new(xml: &'a str) -> Self {
            Self::from_bytes(xml.as_bytes())
        }

        /// Create a source over UTF-8 XML bytes.
        pub fn from_bytes(xml: &'a [u8]) -> Self {
            Self {
                input: xml,
                reader: Reader::from_reader(xml),
                open: Vec::new(),
                current: None,
                namespaces: Vec::new(),
                namespace_counts: vec![0],
                pending_end: false,
                pop_scope: false,
                line: 1,
                line_scanned: 0,
            }
        }

        /// Advance the line counter to byte offset `pos`.
        fn seek_line(&mut self, pos: usize) {
            let pos = pos.min(self.input.len());
            if pos > self.line_scanned {
                let newlines = memchr::memchr_iter(b'\n', &self.input[self.line_scanned..pos]).count();
                self.line += newlines as u32;
                self.line_scanned = pos;
            }
        }

        fn close_scope(&mut self) {
            if self.pop_scope {
                self.pop_scope = false;
                self.namespace_counts.pop();
                let in_scope = self.namespace_counts.last().copied().unwrap_or(0);
                self.namespaces.truncate(in_scope);
            }
        }

        fn resolve(&self, prefix: Option<&str>) -> Result<Option<String>> {
            match prefix {
                Some("xml") => Ok(Some(XML_NAMESPACE.to_string())),
                Some(prefix) => self
                    .namespaces
                    .iter()
                    .rev()
                    .find(|(p, _)| p.as_deref() == Some(prefix))
                    .map(|(_, uri)| Some(uri.clone()))
                    .ok_or_else(|| Error::UnboundPrefix(prefix.to_string())),
                None => Ok(self
                    .namespaces
                    .iter()
                    .rev()
                    .find(|(p, _)| p.is_none())
                    .map(|(_, uri)| uri.clone())
                    .filter(|uri| !uri.is_empty())),
            }
        }

        /// Push an element's declarations and resolve its names.
        fn open(&mut self, start: &BytesStart<'_>) -> Result<()> {
            let mut attributes = Vec::new();
            for attr in start.attributes() {
                let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
                let key = utf8(attr.key.as_ref())?;
                let value = attr
                    .unescape_value()
                    .map_err(|e| Error::Xml(e.to_string()))?
                    .into_owned();

                if key == "xmlns" {
                    self.namespaces.push((None, value));
                } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                    self.namespaces.push((Some(prefix.to_string()), value));
                } else {
                    let (prefix, name) = split_qname(key);
                    attributes.push(Attribute {
                        prefix: prefix.map(str::to_string),
                        namespace: None,
                        name: name.to_string(),
                        value,
                    });
                }
            }
            self.namespace_counts.push(self.namespaces.len());

            for attribute in &mut attributes {
                // Unprefixed attributes are in no namespace.
                if attribute.prefix.is_some() {
                    attribute.namespace = self.resolve(attribute.prefix.as_deref())?;
                }
            }

            let qname = start.name();
            let (prefix, name) = split_qname(utf8(qname.as_ref())?);
            let element = Element {
                prefix: prefix.map(str::to_string),
                namespace: self.resolve(prefix)?,
                name: name.to_string(),
                attributes,
            };
            self.open.push(element.clone());
            self.current = Some(element);
            Ok(())
        }

        fn close(&mut self) -> Result<XmlEvent> {
            let element = self
                .open
                .pop()
                .ok_or_else(|| Error::Xml("unexpected end tag".to_string()))?;
            self.current = Some(element);
            self.pop_scope = true;
            Ok(XmlEvent::EndTag)
        }

        fn attribute(&self, index: usize) -> Option<&Attribute> {
            self.current.as_ref()?.attributes.get(index)
        }
    }

    fn utf8(bytes: &[u8]) -> Result<&str> {
        Ok(std::str::from_utf8(bytes)?)
    }

    fn split_qname(qname: &str) -> (Option<&str>, &str) {
        match qname.split_once(':') {
            Some((prefix, name)) => (Some(prefix), name),
            None => (None, qname),
        }
    }

    impl XmlSource for QuickXmlSource<'_> {
        fn next_event(&mut self) -> Result<XmlEvent> {
            self.close_scope();
            if self.pending_end {
                self.pending_end = false;
                return self.close();
            }

            loop {
                let start = self.reader.buffer_position() as usize;
                let event = self
                    .reader
                    .read_event()
                    .map_err(|e| Error::Xml(format!("XML parse error: {}", e)))?;
                match event {
                    Event::Start(e) => {
                        self.seek_line(start);
                        self.open(&e)?;
                        return Ok(XmlEvent::StartTag);
                    }
                    Event::Empty(e) => {
                        self.seek_line(start);
                        self.open(&e)?;
                        self.pending_end = true;
                        return Ok(XmlEvent::StartTag);
                    }
                    Event::End(_) => {
                        self.seek_line(start);
                        return self.close();
                    }
                    Event::Text(e) => {
                        if !e.iter().all(u8::is_ascii_whitespace) {
                            warn!("ignoring text content in <{}>", self.name());
                        }
                    }
                    Event::CData(_) => {
                        warn!("ignoring CDATA section in <{}>", self.name());
                    }
                    Event::Eof => {
                        if let Some(element) = self.open.last() {
                            return Err(Error::UnexpectedEndOfDocument(element.name.clone()));
                        }
                        self.current = None;
                        return Ok(XmlEvent::EndDocument);
                    }
                    _ => {}
                }
            }
        }

        fn name(&self) -> &str {
            self.current.as_ref().map_or("", |e| e.name.as_str())
        }

        fn prefix(&self) -> Option<&str> {
            self.current.as_ref()?.prefix.as_deref()
        }

        fn namespace(&self) -> Option<&str> {
            self.current.as_ref()?.namespace.as_deref()
        }

        fn attribute_count(&self) -> usize {
            self.current.as_ref().map_or(0, |e| e.attributes.len())
        }

        fn attribute_name(&self, index: usize) -> Option<&str> {
            Some(&self.attribute(index)?.name)
        }

        fn attribute_prefix(&self, index: usize) -> Option<&str> {
            self.attribute(index)?.prefix.as_deref()
        }

        fn attribute_namespace(&self, index: usize) -> Option<&str> {
            self.attribute(index)?.namespace.as_deref()
        }

        fn attribute_value(&self, index: usize) -> Option<&str> {
            Some(&self.attribute(index)?.value)
        }

        fn depth(&self) -> usize {
            self.namespace_counts.len() - 1
        }

        fn namespace_count(&self, depth: usize) -> usize {
            let last = self.namespace_counts.len() - 1;
            self.namespace_counts[depth.min(last)]
        }

        fn namespace_prefix(&self, index: usize) -> Option<&str> {
            self.namespaces.get(index)?.0.as_deref()
        }

        fn namespace_uri(&self, index: usize) -> Option<&str> {
            Some(&self.namespaces.get(index)?.1)
        }

        fn line_number(&self) -> u32 {
            self.line
        }
    }

}
