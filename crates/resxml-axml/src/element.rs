//! Element tree: one node per source element.

use std::io::Write;

use log::trace;
use resxml_common::BinaryWriter;

use crate::chunk::{Chunk, Header};
use crate::context::BuildContext;
use crate::nodes::{AttributeChunk, EndNamespace, EndTag, StartNamespace, StartTag};
use crate::source::{XmlEvent, XmlSource};
use crate::{Error, Result, StringPool};

/// An element with its namespace scopes, tags and children.
///
/// Emitted as: namespace starts, start tag, children, end tag, namespace
/// ends in reverse declaration order.
#[derive(Debug, Clone)]
pub struct ElementNode {
    header: Header,
    namespace_starts: Vec<StartNamespace>,
    start: StartTag,
    children: Vec<ElementNode>,
    end: EndTag,
    namespace_ends: Vec<EndNamespace>,
}

impl ElementNode {
    /// Read the element the source is positioned on, up to its end tag.
    ///
    /// The source must have just returned [`XmlEvent::StartTag`].
    pub fn read<S: XmlSource + ?Sized>(source: &mut S, ctx: &mut BuildContext<'_>) -> Result<Self> {
        let line = source.line_number();
        let depth = source.depth();
        let declared = source.namespace_count(depth.saturating_sub(1))..source.namespace_count(depth);

        let mut namespace_starts = Vec::with_capacity(declared.len());
        for index in declared {
            let uri = source.namespace_uri(index).unwrap_or_default();
            namespace_starts.push(StartNamespace::start(
                line,
                source.namespace_prefix(index),
                uri,
                ctx,
            )?);
        }

        let count = source.attribute_count();
        let mut attributes = Vec::with_capacity(count);
        for index in 0..count {
            let name = source.attribute_name(index).ok_or_else(|| {
                Error::Xml(format!("attribute {index} of <{}> has no name", source.name()))
            })?;
            attributes.push(AttributeChunk::new(
                source.attribute_namespace(index),
                name,
                source.attribute_value(index).unwrap_or_default(),
                ctx,
            )?);
        }

        let name = source.name().to_string();
        let namespace = source.namespace().map(str::to_string);
        trace!("element <{}> at line {}, depth {}, {} attributes", name, line, depth, count);
        let start = StartTag::new(line, namespace.as_deref(), &name, attributes, ctx)?;

        let mut children = Vec::new();
        loop {
            match source.next_event()? {
                XmlEvent::StartTag => children.push(ElementNode::read(source, ctx)?),
                XmlEvent::EndTag => break,
                XmlEvent::EndDocument => return Err(Error::UnexpectedEndOfDocument(name)),
            }
        }

        let end_line = source.line_number();
        let end = EndTag::new(end_line, namespace.as_deref(), &name);
        let namespace_ends = namespace_starts
            .iter()
            .rev()
            .map(|ns| ns.end(end_line))
            .collect();

        Ok(Self {
            header: Header::empty(),
            namespace_starts,
            start,
            children,
            end,
            namespace_ends,
        })
    }

    /// The start tag.
    pub fn start(&self) -> &StartTag {
        &self.start
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[ElementNode] {
        &self.children
    }

    /// Namespace declarations opened by this element.
    pub fn namespace_starts(&self) -> &[StartNamespace] {
        &self.namespace_starts
    }

    /// Scope ends, in reverse declaration order.
    pub fn namespace_ends(&self) -> &[EndNamespace] {
        &self.namespace_ends
    }
}

impl Chunk for ElementNode {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        let namespaces: u32 = self
            .namespace_starts
            .iter_mut()
            .chain(self.namespace_ends.iter_mut())
            .map(|ns| ns.calc())
            .sum();
        let children: u32 = self.children.iter_mut().map(|child| child.calc()).sum();
        namespaces + self.start.calc() + self.end.calc() + children
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        for ns in &self.namespace_starts {
            ns.emit(w, pool)?;
        }
        self.start.emit(w, pool)?;
        for child in &self.children {
            child.emit(w, pool)?;
        }
        self.end.emit(w, pool)?;
        for ns in &self.namespace_ends {
            ns.emit(w, pool)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "xml-source"))]
mod tests {
    use super::*;
    use crate::resolver::NoResolver;
    use crate::QuickXmlSource;

    fn read(xml: &str) -> (ElementNode, StringPool) {
        let mut pool = StringPool::default();
        let mut source = QuickXmlSource::new(xml);
        assert_eq!(source.next_event().unwrap(), XmlEvent::StartTag);
        let mut ctx = BuildContext::new(&mut pool, &NoResolver);
        let node = ElementNode::read(&mut source, &mut ctx).unwrap();
        (node, pool)
    }

    #[test]
    fn test_namespace_pairs_reversed() {
        let (node, _) = read(r#"<a xmlns:x="urn:x" xmlns:y="urn:y" xmlns="urn:d"><b/></a>"#);
        let starts: Vec<_> = node.namespace_starts().iter().map(|ns| ns.uri()).collect();
        let ends: Vec<_> = node.namespace_ends().iter().map(|ns| ns.uri()).collect();

        assert_eq!(starts, ["urn:x", "urn:y", "urn:d"]);
        assert_eq!(ends, ["urn:d", "urn:y", "urn:x"]);
        assert!(node.namespace_ends().iter().all(|ns| !ns.is_start()));
        assert!(node.children()[0].namespace_starts().is_empty());
    }

    #[test]
    fn test_size_and_write_order() {
        let (mut node, mut pool) = read(r#"<a xmlns:x="urn:x"><b x:k="v"/><c/></a>"#);
        pool.calc();

        // 24 + 36 + (36 + 20 + 24) + (36 + 24) + 24 + 24
        assert_eq!(node.calc(), 248);

        let mut w = BinaryWriter::new(Vec::new());
        node.write(&mut w, &pool).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), 248);

        let mut types = Vec::new();
        let mut at = 0;
        while at < bytes.len() {
            types.push(u16::from_le_bytes([bytes[at], bytes[at + 1]]));
            at += u32::from_le_bytes(bytes[at + 4..at + 8].try_into().unwrap()) as usize;
        }
        assert_eq!(
            types,
            [0x0100, 0x0102, 0x0102, 0x0103, 0x0102, 0x0103, 0x0103, 0x0101]
        );
    }

    #[test]
    fn test_truncated_document() {
        let mut pool = StringPool::default();
        let mut source = QuickXmlSource::new("<a><b></b>");
        source.next_event().unwrap();
        let mut ctx = BuildContext::new(&mut pool, &NoResolver);
        let err = ElementNode::read(&mut source, &mut ctx).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEndOfDocument(_) | Error::Xml(_)));
    }
}
