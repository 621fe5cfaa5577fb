//! Structural chunks: attributes, start/end tags and namespace scopes.

use std::io::Write;

use resxml_common::BinaryWriter;

use crate::chunk::{Chunk, Header};
use crate::context::BuildContext;
use crate::resolver::ANDROID_NAMESPACE;
use crate::value::ValueChunk;
use crate::{ChunkType, Error, Result, StringPool};

/// Size of one attribute entry.
pub const ATTRIBUTE_SIZE: u16 = 20;

/// Offset of the attribute array from the start of the start-tag body.
pub const ATTRIBUTE_START: u16 = 20;

/// Index of a string in the frozen pool as written on the wire.
fn string_ref(pool: &StringPool, namespace: Option<&str>, text: Option<&str>) -> Result<i32> {
    match text {
        Some(text) => pool.index(namespace, text),
        None => Ok(-1),
    }
}

/// One attribute of a start tag.
#[derive(Debug, Clone)]
pub struct AttributeChunk {
    header: Header,
    namespace: Option<String>,
    name: String,
    value: ValueChunk,
}

impl AttributeChunk {
    /// Create an attribute and register its strings.
    ///
    /// The name is registered under the attribute's namespace, which is what
    /// gives it a resource id.
    pub fn new(
        namespace: Option<&str>,
        name: &str,
        raw_value: &str,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Self> {
        let namespace = namespace.filter(|ns| !ns.is_empty());
        if let Some(namespace) = namespace {
            ctx.register(None, namespace)?;
        }
        ctx.register(namespace, name)?;
        let value = ValueChunk::new(raw_value, ctx)?;

        Ok(Self {
            header: Header::empty(),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            value,
        })
    }

    /// Namespace URI of the attribute.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name of the attribute.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The typed value.
    pub fn value(&self) -> &ValueChunk {
        &self.value
    }

    fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.name == name
    }
}

impl Chunk for AttributeChunk {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        12 + self.value.calc()
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        let namespace = self.namespace.as_deref();
        w.write_i32(string_ref(pool, None, namespace)?)?;
        w.write_i32(pool.index(namespace, &self.name)?)?;
        w.write_i32(string_ref(pool, None, self.value.value().as_str())?)?;
        self.value.emit(w, pool)
    }
}

/// Element start tag with its attributes.
#[derive(Debug, Clone)]
pub struct StartTag {
    header: Header,
    namespace: Option<String>,
    name: String,
    attributes: Vec<AttributeChunk>,
    id_index: u16,
    class_index: u16,
    style_index: u16,
}

impl StartTag {
    /// Create a start tag and register the element's strings.
    ///
    /// Records the 1-based positions of the `android:id`, `class` and `style`
    /// attributes; 0 means absent.
    pub fn new(
        line_number: u32,
        namespace: Option<&str>,
        name: &str,
        attributes: Vec<AttributeChunk>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Self> {
        if attributes.len() > usize::from(u16::MAX) {
            return Err(Error::TooManyAttributes(attributes.len()));
        }
        let namespace = namespace.filter(|ns| !ns.is_empty());
        if let Some(namespace) = namespace {
            ctx.register(None, namespace)?;
        }
        ctx.register(None, name)?;

        let position = |ns: Option<&str>, attr: &str| {
            attributes
                .iter()
                .position(|a| a.is(ns, attr))
                .map_or(0, |i| i as u16 + 1)
        };
        let id_index = position(Some(ANDROID_NAMESPACE), "id");
        let class_index = position(None, "class");
        let style_index = position(None, "style");

        Ok(Self {
            header: Header::node(ChunkType::XmlStartElement, line_number),
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            attributes,
            id_index,
            class_index,
            style_index,
        })
    }

    /// Namespace URI of the element.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attributes, in source order.
    pub fn attributes(&self) -> &[AttributeChunk] {
        &self.attributes
    }

    /// 1-based `(id, class, style)` attribute positions.
    pub fn special_indices(&self) -> (u16, u16, u16) {
        (self.id_index, self.class_index, self.style_index)
    }
}

impl Chunk for StartTag {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        let attributes: u32 = self.attributes.iter_mut().map(|a| a.calc()).sum();
        u32::from(self.header.header_size()) + u32::from(ATTRIBUTE_START) + attributes
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        w.write_i32(string_ref(pool, None, self.namespace.as_deref())?)?;
        w.write_i32(pool.index(None, &self.name)?)?;
        w.write_u16(ATTRIBUTE_START)?;
        w.write_u16(ATTRIBUTE_SIZE)?;
        w.write_u16(self.attributes.len() as u16)?;
        w.write_u16(self.id_index)?;
        w.write_u16(self.class_index)?;
        w.write_u16(self.style_index)?;
        for attribute in &self.attributes {
            attribute.emit(w, pool)?;
        }
        Ok(())
    }
}

/// Element end tag.
#[derive(Debug, Clone)]
pub struct EndTag {
    header: Header,
    namespace: Option<String>,
    name: String,
}

impl EndTag {
    /// End tag for an element whose strings the start tag registered.
    pub fn new(line_number: u32, namespace: Option<&str>, name: &str) -> Self {
        Self {
            header: Header::node(ChunkType::XmlEndElement, line_number),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            name: name.to_string(),
        }
    }
}

impl Chunk for EndTag {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        u32::from(self.header.header_size()) + 8
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        w.write_i32(string_ref(pool, None, self.namespace.as_deref())?)?;
        w.write_i32(pool.index(None, &self.name)?)?;
        Ok(())
    }
}

/// A namespace declaration, as the start or end of its scope.
#[derive(Debug, Clone)]
pub struct NamespaceChunk {
    header: Header,
    prefix: Option<String>,
    uri: String,
}

/// Opens a namespace scope.
pub type StartNamespace = NamespaceChunk;

/// Closes a namespace scope.
pub type EndNamespace = NamespaceChunk;

impl NamespaceChunk {
    /// Start of a namespace scope. Registers the prefix and URI.
    pub fn start(
        line_number: u32,
        prefix: Option<&str>,
        uri: &str,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Self> {
        let prefix = prefix.filter(|p| !p.is_empty());
        if let Some(prefix) = prefix {
            ctx.register(None, prefix)?;
        }
        ctx.register(None, uri)?;
        Ok(Self {
            header: Header::node(ChunkType::XmlStartNamespace, line_number),
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        })
    }

    /// The matching end of this scope.
    pub fn end(&self, line_number: u32) -> Self {
        Self {
            header: Header::node(ChunkType::XmlEndNamespace, line_number),
            prefix: self.prefix.clone(),
            uri: self.uri.clone(),
        }
    }

    /// Declared prefix; `None` for the default namespace.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Namespace URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Whether this chunk opens the scope.
    pub fn is_start(&self) -> bool {
        self.header.chunk_type() == Some(ChunkType::XmlStartNamespace)
    }
}

impl Chunk for NamespaceChunk {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        u32::from(self.header.header_size()) + 8
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        w.write_i32(string_ref(pool, None, self.prefix.as_deref())?)?;
        w.write_i32(pool.index(None, &self.uri)?)?;
        Ok(())
    }
}
