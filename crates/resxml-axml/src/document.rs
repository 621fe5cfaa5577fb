//! Document root and the encoder entry points.

use std::io::Write;

use log::debug;
use resxml_common::BinaryWriter;

use crate::chunk::{Chunk, Header};
use crate::context::BuildContext;
use crate::element::ElementNode;
use crate::resolver::{FrameworkResolver, ResourceResolver};
use crate::resource_map::ResourceMap;
use crate::source::{XmlEvent, XmlSource};
use crate::string_pool::{StringEncoding, StringPool};
use crate::{ChunkType, Error, Result};

/// A complete binary XML document: pool, resource map and element tree.
#[derive(Debug, Clone)]
pub struct Document {
    header: Header,
    pool: StringPool,
    resource_map: Option<ResourceMap>,
    root: ElementNode,
}

impl Document {
    /// Build the element tree from a source, registering strings as it goes.
    pub fn read<S: XmlSource + ?Sized>(
        source: &mut S,
        encoding: StringEncoding,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self> {
        let mut pool = StringPool::new(encoding);
        let mut ctx = BuildContext::new(&mut pool, resolver);

        let root = loop {
            match source.next_event()? {
                XmlEvent::StartTag => break ElementNode::read(source, &mut ctx)?,
                XmlEvent::EndTag => return Err(Error::Xml("unexpected end tag".to_string())),
                XmlEvent::EndDocument => return Err(Error::NoRootElement),
            }
        };
        match source.next_event()? {
            XmlEvent::EndDocument => {}
            _ => return Err(Error::Xml("content after the root element".to_string())),
        }

        Ok(Self {
            header: Header::chunk(ChunkType::Xml),
            pool,
            resource_map: None,
            root,
        })
    }

    /// The string pool. Frozen once the document size has been calculated.
    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    /// The resource map, available once the size has been calculated.
    pub fn resource_map(&self) -> Option<&ResourceMap> {
        self.resource_map.as_ref()
    }

    /// The root element.
    pub fn root(&self) -> &ElementNode {
        &self.root
    }

    /// Calculate sizes and write the whole document.
    pub fn encode<W: Write>(&mut self, w: &mut BinaryWriter<W>) -> Result<()> {
        self.calc();
        self.emit(w, &self.pool)
    }

    /// Encode into a byte vector.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut w = BinaryWriter::new(Vec::with_capacity(self.calc() as usize));
        self.encode(&mut w)?;
        Ok(w.into_inner())
    }
}

impl Chunk for Document {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        // The pool can only be frozen after the tree has registered everything.
        let tree = self.root.calc();
        let pool = self.pool.calc();
        let map = self
            .resource_map
            .insert(ResourceMap::collect(&self.pool))
            .calc();
        let size = u32::from(self.header.header_size()) + tree + pool + map;

        debug!(
            "document size {} bytes: string pool {}, resource map {} ({} ids), tree {}",
            size,
            pool,
            map,
            self.resource_map.as_ref().map_or(0, |m| m.ids().len()),
            tree
        );
        size
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, _pool: &StringPool) -> Result<()> {
        let map = self
            .resource_map
            .as_ref()
            .ok_or(Error::SizeNotCalculated(Some(ChunkType::XmlResourceMap)))?;
        self.pool.emit(w, &self.pool)?;
        map.emit(w, &self.pool)?;
        self.root.emit(w, &self.pool)
    }
}

/// Overrides the application package of an inner resolver.
struct AppPackage<'a> {
    inner: &'a dyn ResourceResolver,
    package: &'a str,
}

impl ResourceResolver for AppPackage<'_> {
    fn attribute_id(&self, name: &str, package: &str) -> Option<u32> {
        self.inner.attribute_id(name, package)
    }

    fn app_package(&self) -> Option<&str> {
        Some(self.package)
    }
}

/// Converts textual XML into binary XML.
///
/// # Example
///
/// ```
/// use resxml_axml::{Encoder, StringEncoding};
///
/// let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
///     package="com.example" android:versionCode="1"/>"#;
///
/// let bytes = Encoder::new()
///     .string_encoding(StringEncoding::Utf8)
///     .encode_str(xml)
///     .unwrap();
/// assert_eq!(&bytes[0..2], &[0x03, 0x00]);
/// ```
pub struct Encoder {
    encoding: StringEncoding,
    resolver: Box<dyn ResourceResolver + Send + Sync>,
    app_package: Option<String>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// Encoder with UTF-16 strings and the built-in framework attribute ids.
    pub fn new() -> Self {
        Self {
            encoding: StringEncoding::Utf16,
            resolver: Box::new(FrameworkResolver::with_table(Default::default())),
            app_package: None,
        }
    }

    /// Choose the string pool layout.
    pub fn string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Resolve attribute ids through `resolver`.
    pub fn resolver(mut self, resolver: impl ResourceResolver + Send + Sync + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Package the `res-auto` namespace refers to, overriding the resolver's.
    pub fn app_package(mut self, package: impl Into<String>) -> Self {
        self.app_package = Some(package.into());
        self
    }

    /// Build the chunk tree without writing it.
    pub fn build_document<S: XmlSource + ?Sized>(&self, source: &mut S) -> Result<Document> {
        let resolver: &dyn ResourceResolver = &*self.resolver;
        match self.app_package.as_deref() {
            Some(package) => Document::read(
                source,
                self.encoding,
                &AppPackage {
                    inner: resolver,
                    package,
                },
            ),
            None => Document::read(source, self.encoding, resolver),
        }
    }

    /// Encode a source into bytes.
    pub fn encode_source<S: XmlSource + ?Sized>(&self, source: &mut S) -> Result<Vec<u8>> {
        self.build_document(source)?.to_bytes()
    }

    /// Encode a source into a sink.
    ///
    /// Nothing reaches the sink unless the whole document encoded.
    pub fn encode_to<S: XmlSource + ?Sized, W: Write>(&self, source: &mut S, mut sink: W) -> Result<()> {
        let bytes = self.encode_source(source)?;
        sink.write_all(&bytes)?;
        Ok(())
    }

    /// Encode XML text.
    #[cfg(feature = "xml-source")]
    pub fn encode_str(&self, xml: &str) -> Result<Vec<u8>> {
        self.encode_source(&mut crate::QuickXmlSource::new(xml))
    }
}
