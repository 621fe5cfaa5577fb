//! Binary XML decoder.
//!
//! Walks the chunks of a compiled XML document and rebuilds the element
//! tree, resolving string references and rendering typed values back to text.

#[cfg(feature = "xml-output")]
use std::io::Write;

use log::warn;
use resxml_common::BinaryReader;
use zerocopy::FromBytes;

use crate::attribute::RawAttribute;
use crate::header::{ChunkHeader, EndElementBody, NamespaceBody, NodeHeader, StartElementBody, StringPoolHeader};
use crate::string_pool::UTF8_FLAG;
use crate::value::ValueType;
use crate::{ChunkType, Error, Result};

/// Multipliers for the four complex radix forms (23p0, 16p7, 8p15, 0p23).
const RADIX_MULTS: [f32; 4] = [
    1.0 / 256.0,
    1.0 / 32_768.0,
    1.0 / 8_388_608.0,
    1.0 / 2_147_483_648.0,
];

const DIMENSION_UNITS: [&str; 6] = ["px", "dip", "sp", "pt", "in", "mm"];

const FRACTION_UNITS: [&str; 2] = ["%", "%p"];

/// Value of a packed complex number, without its unit.
pub fn complex_to_float(complex: u32) -> f32 {
    ((complex & 0xFFFF_FF00) as i32) as f32 * RADIX_MULTS[((complex >> 4) & 3) as usize]
}

/// A namespace declaration on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix; `None` for the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

/// A decoded attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AxmlAttribute {
    pub namespace: Option<String>,
    /// Prefix bound to the namespace where the element appears.
    pub prefix: Option<String>,
    pub name: String,
    /// Resource id from the resource map, if the name has one.
    pub resource_id: Option<u32>,
    /// Original text, when the encoder kept it.
    pub raw_value: Option<String>,
    pub value_type: u8,
    pub data: u32,
    /// The value rendered as text; `None` for null values.
    pub value: Option<String>,
}

impl AxmlAttribute {
    /// `prefix:name`, or just the name.
    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.name)
    }
}

/// A decoded element.
#[derive(Debug, Clone, PartialEq)]
pub struct AxmlElement {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub line_number: u32,
    /// Declarations introduced by this element.
    pub namespaces: Vec<NamespaceDecl>,
    pub attributes: Vec<AxmlAttribute>,
    pub children: Vec<AxmlElement>,
}

impl AxmlElement {
    /// `prefix:name`, or just the name.
    pub fn qualified_name(&self) -> String {
        qualify(self.prefix.as_deref(), &self.name)
    }

    /// Find an attribute by namespace and local name.
    pub fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&AxmlAttribute> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == namespace && a.name == name)
    }
}

fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
        _ => name.to_string(),
    }
}

/// Decoded string pool.
#[derive(Debug, Default)]
struct StringTable {
    strings: Vec<String>,
    utf8: bool,
}

impl StringTable {
    fn parse(chunk: &RawChunk<'_>) -> Result<Self> {
        let (header, _) = StringPoolHeader::read_from_prefix(chunk.header)
            .map_err(|_| Error::MalformedChunk("string pool header too short".to_string()))?;
        let header_size = ChunkHeader::SIZE + chunk.header.len();
        let count = header.string_count.get() as usize;
        let utf8 = header.flags.get() & UTF8_FLAG != 0;
        if count == 0 {
            return Ok(Self {
                strings: Vec::new(),
                utf8,
            });
        }

        let body = BinaryReader::new(chunk.body);
        let strings_start = (header.strings_start.get() as usize)
            .checked_sub(header_size)
            .ok_or_else(|| Error::MalformedChunk("strings start inside the pool header".to_string()))?;
        let strings_end = if header.style_count.get() > 0 {
            let styles_start = header.styles_start.get() as usize;
            if styles_start < header.strings_start.get() as usize {
                return Err(Error::MalformedChunk(format!(
                    "styles offset ({styles_start}) before strings offset ({strings_start})"
                )));
            }
            styles_start - header_size
        } else {
            chunk.body.len()
        };
        let section = body.slice(strings_start, strings_end)?;

        let mut offsets = BinaryReader::new(chunk.body);
        let mut strings = Vec::with_capacity(count.min(chunk.body.len() / 4));
        for _ in 0..count {
            let offset = offsets.read_u32()? as usize;
            let text = if utf8 {
                read_utf8(section, offset)?
            } else {
                read_utf16(section, offset)?
            };
            strings.push(text);
        }
        Ok(Self { strings, utf8 })
    }

    fn get(&self, index: u32) -> Result<&str> {
        self.strings
            .get(index as usize)
            .map(String::as_str)
            .ok_or(Error::StringIndexOutOfBounds {
                index,
                count: self.strings.len(),
            })
    }

    /// A string reference where `-1` means none.
    fn optional(&self, index: i32) -> Result<Option<String>> {
        if index < 0 {
            return Ok(None);
        }
        self.get(index as u32).map(|s| Some(s.to_string()))
    }
}

fn read_utf16(section: &[u8], offset: usize) -> Result<String> {
    let mut reader = BinaryReader::new(section);
    reader.seek(offset)?;
    let mut len = reader.read_u16()? as usize;
    if len & 0x8000 != 0 {
        len = ((len & 0x7FFF) << 16) | reader.read_u16()? as usize;
    }
    let bytes = reader.read_bytes(len * 2)?;
    if reader.read_u16()? != 0 {
        return Err(Error::MalformedChunk(
            "UTF-16 string is not NUL terminated".to_string(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    Ok(String::from_utf16(&units)?)
}

fn read_utf8_len(reader: &mut BinaryReader<'_>) -> Result<usize> {
    let mut len = reader.read_u8()? as usize;
    if len & 0x80 != 0 {
        len = ((len & 0x7F) << 8) | reader.read_u8()? as usize;
    }
    Ok(len)
}

fn read_utf8(section: &[u8], offset: usize) -> Result<String> {
    let mut reader = BinaryReader::new(section);
    reader.seek(offset)?;
    read_utf8_len(&mut reader)?; // UTF-16 length
    let len = read_utf8_len(&mut reader)?;
    let bytes = reader.read_bytes(len)?;
    if reader.read_u8()? != 0 {
        return Err(Error::MalformedChunk(
            "UTF-8 string is not NUL terminated".to_string(),
        ));
    }
    Ok(std::str::from_utf8(bytes)?.to_string())
}

/// Render a typed value as text.
fn coerce(value_type: u8, data: u32, strings: &StringTable) -> Result<Option<String>> {
    let text = match ValueType::from_code(value_type) {
        Some(ValueType::Null) => return Ok(None),
        Some(ValueType::Reference) => format!("@{data:08X}"),
        Some(ValueType::Attribute) => format!("?{data:08X}"),
        Some(ValueType::String) => strings.get(data)?.to_string(),
        Some(ValueType::Float) => format!("{:?}", f32::from_bits(data)),
        Some(ValueType::Dimension) => format!(
            "{:?}{}",
            complex_to_float(data),
            DIMENSION_UNITS.get((data & 0xF) as usize).unwrap_or(&"")
        ),
        Some(ValueType::Fraction) => format!(
            "{:?}{}",
            complex_to_float(data),
            FRACTION_UNITS.get((data & 0xF) as usize).unwrap_or(&"")
        ),
        Some(ValueType::IntHex) => format!("0x{data:08X}"),
        Some(ValueType::IntBoolean) => (data != 0).to_string(),
        Some(
            ValueType::IntColorArgb8
            | ValueType::IntColorRgb8
            | ValueType::IntColorArgb4
            | ValueType::IntColorRgb4,
        ) => format!("#{data:08X}"),
        _ if (0x10..=0x1f).contains(&value_type) => (data as i32).to_string(),
        _ => {
            return Err(Error::MalformedChunk(format!(
                "cannot render value type 0x{value_type:02x}"
            )))
        }
    };
    Ok(Some(text))
}

/// One chunk of the document body.
struct RawChunk<'a> {
    chunk_type: u16,
    /// Header bytes after the common 8.
    header: &'a [u8],
    body: &'a [u8],
}

impl<'a> RawChunk<'a> {
    /// Read the next chunk, or `None` at the end of the input.
    ///
    /// A chunk claiming more bytes than remain ends the walk.
    fn next(reader: &mut BinaryReader<'a>) -> Result<Option<Self>> {
        if reader.remaining() < ChunkHeader::SIZE {
            return Ok(None);
        }
        let start = reader.position();
        let header: ChunkHeader = reader.read_struct()?;
        let header_size = header.header_size.get() as usize;
        let size = header.size.get() as usize;

        if size.saturating_sub(ChunkHeader::SIZE) > reader.remaining() {
            warn!(
                "chunk 0x{:04x} at offset {} claims {} bytes, only {} left; stopping",
                header.chunk_type.get(),
                start,
                size,
                reader.remaining() + ChunkHeader::SIZE
            );
            return Ok(None);
        }
        if header_size < ChunkHeader::SIZE {
            return Err(Error::MalformedChunk(format!(
                "header too short: {header_size} bytes"
            )));
        }
        if header_size > size {
            return Err(Error::MalformedChunk(format!(
                "header of {header_size} bytes exceeds chunk size {size}"
            )));
        }

        let chunk = Self {
            chunk_type: header.chunk_type.get(),
            header: reader.slice(start + ChunkHeader::SIZE, start + header_size)?,
            body: reader.slice(start + header_size, start + size)?,
        };
        reader.seek(start + size)?;
        Ok(Some(chunk))
    }

    fn line_number(&self) -> u32 {
        NodeHeader::read_from_prefix(self.header).map_or(0, |(node, _)| node.line_number.get())
    }

    fn body<T: FromBytes>(&self, what: &str) -> Result<T> {
        T::read_from_prefix(self.body)
            .map(|(body, _)| body)
            .map_err(|_| Error::MalformedChunk(format!("{what} chunk too short")))
    }
}

/// Accumulates chunks into an element tree.
#[derive(Default)]
struct TreeBuilder {
    strings: Option<StringTable>,
    resource_ids: Option<Vec<u32>>,
    /// Declarations in scope, outermost first.
    scopes: Vec<NamespaceDecl>,
    /// Declarations waiting for the next start element.
    pending: Vec<NamespaceDecl>,
    open: Vec<AxmlElement>,
    root: Option<AxmlElement>,
}

impl TreeBuilder {
    fn feed(&mut self, chunk: &RawChunk<'_>) -> Result<()> {
        match ChunkType::from_code(chunk.chunk_type) {
            Some(ChunkType::StringPool) => {
                if self.strings.is_some() {
                    return Err(Error::MalformedChunk("multiple string pools".to_string()));
                }
                self.strings = Some(StringTable::parse(chunk)?);
            }
            Some(ChunkType::XmlResourceMap) => {
                if self.resource_ids.is_some() {
                    return Err(Error::MalformedChunk("multiple resource maps".to_string()));
                }
                self.resource_ids = Some(
                    chunk
                        .body
                        .chunks_exact(4)
                        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                        .collect(),
                );
            }
            Some(ChunkType::XmlStartNamespace) => {
                let strings = self.strings.as_ref().ok_or(Error::MissingStringPool)?;
                let body: NamespaceBody = chunk.body("namespace")?;
                let decl = NamespaceDecl {
                    prefix: strings.optional(body.prefix.get())?,
                    uri: strings.optional(body.uri.get())?.unwrap_or_default(),
                };
                self.scopes.push(decl.clone());
                self.pending.push(decl);
            }
            Some(ChunkType::XmlEndNamespace) => {
                self.scopes.pop();
            }
            Some(ChunkType::XmlStartElement) => self.start_element(chunk)?,
            Some(ChunkType::XmlEndElement) => self.end_element(chunk)?,
            Some(ChunkType::XmlCdata) => warn!("skipping CDATA chunk"),
            Some(ChunkType::Xml) | None => {
                warn!("skipping unknown chunk type 0x{:04x}", chunk.chunk_type)
            }
        }
        Ok(())
    }

    fn prefix_for(&self, namespace: Option<&str>) -> Option<String> {
        let namespace = namespace?;
        self.scopes
            .iter()
            .rev()
            .find(|decl| decl.uri == namespace)
            .and_then(|decl| decl.prefix.clone())
    }

    fn start_element(&mut self, chunk: &RawChunk<'_>) -> Result<()> {
        let strings = self.strings.as_ref().ok_or(Error::MissingStringPool)?;
        let body: StartElementBody = chunk.body("start element")?;

        let attr_start = usize::from(body.attribute_start.get());
        let attr_size = usize::from(body.attribute_size.get());
        let attr_count = usize::from(body.attribute_count.get());
        let attr_end = attr_start + attr_count * attr_size;
        if attr_start > chunk.body.len() || attr_end > chunk.body.len() {
            return Err(Error::MalformedChunk(format!(
                "attributes end at {attr_end}, body has {} bytes",
                chunk.body.len()
            )));
        }
        if attr_count > 0 && attr_size < std::mem::size_of::<RawAttribute>() {
            return Err(Error::MalformedChunk(format!(
                "attribute size {attr_size} too small"
            )));
        }

        let mut attributes = Vec::with_capacity(attr_count);
        for i in 0..attr_count {
            let at = attr_start + i * attr_size;
            let (raw, _) = RawAttribute::read_from_prefix(&chunk.body[at..])
                .map_err(|_| Error::MalformedChunk("attribute too short".to_string()))?;
            let name_index = raw.name.get();
            let namespace = strings.optional(raw.namespace.get())?;
            let resource_id = self
                .resource_ids
                .as_deref()
                .and_then(|ids| ids.get(usize::try_from(name_index).ok()?))
                .copied();
            attributes.push(AxmlAttribute {
                prefix: self.prefix_for(namespace.as_deref()),
                namespace,
                name: strings.get(name_index as u32)?.to_string(),
                resource_id,
                raw_value: strings.optional(raw.raw_value.get())?,
                value_type: raw.value.data_type,
                data: raw.value.data.get(),
                value: coerce(raw.value.data_type, raw.value.data.get(), strings)?,
            });
        }

        let namespace = strings.optional(body.namespace.get())?;
        let element = AxmlElement {
            prefix: self.prefix_for(namespace.as_deref()),
            namespace,
            name: strings.get(body.name.get() as u32)?.to_string(),
            line_number: chunk.line_number(),
            namespaces: std::mem::take(&mut self.pending),
            attributes,
            children: Vec::new(),
        };
        self.open.push(element);
        Ok(())
    }

    fn end_element(&mut self, chunk: &RawChunk<'_>) -> Result<()> {
        if self.strings.is_none() {
            return Err(Error::MissingStringPool);
        }
        let _: EndElementBody = chunk.body("end element")?;
        let element = self
            .open
            .pop()
            .ok_or_else(|| Error::MalformedChunk("end element without start".to_string()))?;
        match self.open.last_mut() {
            Some(parent) => parent.children.push(element),
            None if self.root.is_none() => self.root = Some(element),
            None => return Err(Error::MalformedChunk("multiple root elements".to_string())),
        }
        Ok(())
    }
}

/// A decoded binary XML document.
#[derive(Debug)]
pub struct AxmlDocument {
    strings: StringTable,
    resource_ids: Vec<u32>,
    root: Option<AxmlElement>,
}

impl AxmlDocument {
    /// Check whether data starts with a binary XML document chunk.
    pub fn is_binary_xml(data: &[u8]) -> bool {
        ChunkHeader::read_from_prefix(data).is_ok_and(|(header, _)| {
            header.chunk_type.get() == ChunkType::Xml.code()
                && usize::from(header.header_size.get()) == ChunkHeader::SIZE
        })
    }

    /// Parse a binary XML document.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !Self::is_binary_xml(data) {
            return Err(Error::NotBinaryXml);
        }

        let mut reader = BinaryReader::new(data);
        let header: ChunkHeader = reader.read_struct()?;
        let end = (header.size.get() as usize).min(data.len());
        let mut reader = BinaryReader::new(&data[..end]);
        reader.seek(ChunkHeader::SIZE)?;

        let mut builder = TreeBuilder::default();
        while let Some(chunk) = RawChunk::next(&mut reader)? {
            builder.feed(&chunk)?;
        }

        if let Some(element) = builder.open.last() {
            return Err(Error::UnexpectedEndOfDocument(element.name.clone()));
        }
        Ok(Self {
            strings: builder.strings.unwrap_or_default(),
            resource_ids: builder.resource_ids.unwrap_or_default(),
            root: builder.root,
        })
    }

    /// The root element, if the document has one.
    pub fn root(&self) -> Option<&AxmlElement> {
        self.root.as_ref()
    }

    /// All pool strings in index order.
    pub fn strings(&self) -> &[String] {
        &self.strings.strings
    }

    /// Whether the pool was UTF-8 encoded.
    pub fn is_utf8(&self) -> bool {
        self.strings.utf8
    }

    /// The resource map.
    pub fn resource_ids(&self) -> &[u32] {
        &self.resource_ids
    }

    /// Convert to XML string.
    #[cfg(feature = "xml-output")]
    pub fn to_xml_string(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write_xml(&mut output)?;
        String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write XML to a writer.
    #[cfg(feature = "xml-output")]
    pub fn write_xml<W: Write>(&self, writer: &mut W) -> Result<()> {
        use quick_xml::events::{BytesDecl, Event};
        use quick_xml::Writer;

        let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);
        xml_writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::Xml(e.to_string()))?;

        if let Some(root) = self.root() {
            Self::write_element(&mut xml_writer, root)?;
        }
        Ok(())
    }

    #[cfg(feature = "xml-output")]
    fn write_element<W: Write>(writer: &mut quick_xml::Writer<W>, element: &AxmlElement) -> Result<()> {
        use quick_xml::events::{BytesEnd, BytesStart, Event};

        let qname = element.qualified_name();
        let mut start = BytesStart::new(qname.as_str());
        for decl in &element.namespaces {
            let key = match &decl.prefix {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            start.push_attribute((key.as_str(), decl.uri.as_str()));
        }
        for attr in &element.attributes {
            let key = attr.qualified_name();
            start.push_attribute((key.as_str(), attr.value.as_deref().unwrap_or("@null")));
        }

        if element.children.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|e| Error::Xml(e.to_string()))?;
        } else {
            writer
                .write_event(Event::Start(start))
                .map_err(|e| Error::Xml(e.to_string()))?;
            for child in &element.children {
                Self::write_element(writer, child)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(qname.as_str())))
                .map_err(|e| Error::Xml(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;
    use crate::StringPool;
    use resxml_common::BinaryWriter;

    fn chunk(chunk_type: u16, header_ext: &[u8], body: &[u8]) -> Vec<u8> {
        let header_size = 8 + header_ext.len();
        let mut out = Vec::new();
        out.extend_from_slice(&chunk_type.to_le_bytes());
        out.extend_from_slice(&(header_size as u16).to_le_bytes());
        out.extend_from_slice(&((header_size + body.len()) as u32).to_le_bytes());
        out.extend_from_slice(header_ext);
        out.extend_from_slice(body);
        out
    }

    fn document(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = chunk(0x0003, &[], &[]);
        out[4..8].copy_from_slice(&((8 + body.len()) as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    fn pool(strings: &[&str]) -> Vec<u8> {
        let mut pool = StringPool::default();
        for s in strings {
            pool.register(None, s, &crate::NoResolver).unwrap();
        }
        let mut w = BinaryWriter::new(Vec::new());
        pool.calc();
        pool.emit(&mut w, &StringPool::default()).unwrap();
        w.into_inner()
    }

    fn start_element(name: i32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend_from_slice(&name.to_le_bytes());
        body.extend_from_slice(&[20, 0, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        chunk(0x0102, &[1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF], &body)
    }

    fn end_element(name: i32) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(-1i32).to_le_bytes());
        body.extend_from_slice(&name.to_le_bytes());
        chunk(0x0103, &[1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF], &body)
    }

    #[test]
    fn test_is_binary_xml() {
        assert!(AxmlDocument::is_binary_xml(&document(&[])));
        assert!(!AxmlDocument::is_binary_xml(b"<?xml"));
        assert!(!AxmlDocument::is_binary_xml(&[0x03, 0x00]));
        assert!(matches!(AxmlDocument::parse(b"<a/>"), Err(Error::NotBinaryXml)));
    }

    #[test]
    fn test_minimal_document() {
        let data = document(&[pool(&["root"]), start_element(0), end_element(0)]);
        let doc = AxmlDocument::parse(&data).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.namespace, None);
        assert_eq!(root.line_number, 1);
        assert!(doc.resource_ids().is_empty());
        assert!(!doc.is_utf8());
    }

    #[test]
    fn test_unknown_chunks_are_skipped() {
        let data = document(&[
            chunk(0x0999, &[], &[1, 2, 3, 4]),
            pool(&["root"]),
            start_element(0),
            end_element(0),
        ]);
        assert_eq!(AxmlDocument::parse(&data).unwrap().root().unwrap().name, "root");
    }

    #[test]
    fn test_overrunning_chunk_ends_walk() {
        let mut truncated = chunk(0x0102, &[], &[0; 4]);
        truncated[4..8].copy_from_slice(&1000u32.to_le_bytes());
        let data = document(&[pool(&["root"]), truncated]);
        let doc = AxmlDocument::parse(&data).unwrap();
        assert!(doc.root().is_none());
        assert_eq!(doc.strings(), ["root"]);
    }

    #[test]
    fn test_structural_errors() {
        let data = document(&[start_element(0)]);
        assert!(matches!(AxmlDocument::parse(&data), Err(Error::MissingStringPool)));

        let data = document(&[pool(&["a"]), pool(&["b"])]);
        assert!(matches!(AxmlDocument::parse(&data), Err(Error::MalformedChunk(_))));

        let data = document(&[pool(&["a"]), start_element(5), end_element(5)]);
        assert!(matches!(
            AxmlDocument::parse(&data),
            Err(Error::StringIndexOutOfBounds { index: 5, count: 1 })
        ));

        let data = document(&[pool(&["a"]), start_element(0)]);
        assert!(matches!(
            AxmlDocument::parse(&data),
            Err(Error::UnexpectedEndOfDocument(name)) if name == "a"
        ));

        let data = document(&[chunk(0x0001, &[], &[])]);
        assert!(matches!(AxmlDocument::parse(&data), Err(Error::MalformedChunk(_))));

        let mut bad_header = chunk(0x0001, &[], &[]);
        bad_header[2..4].copy_from_slice(&4u16.to_le_bytes());
        assert!(matches!(
            AxmlDocument::parse(&document(&[bad_header])),
            Err(Error::MalformedChunk(_))
        ));
    }

    #[test]
    fn test_string_terminator_checked() {
        let mut data = pool(&["ab"]);
        // Corrupt the UTF-16 terminator.
        let at = data.len() - 2;
        data[at] = b'!';
        let data = document(&[data]);
        assert!(matches!(AxmlDocument::parse(&data), Err(Error::MalformedChunk(_))));
    }

    #[test]
    fn test_coerce_values() {
        let strings = StringTable {
            strings: vec!["hello".to_string()],
            utf8: false,
        };
        let render = |ty: u8, data: u32| coerce(ty, data, &strings).unwrap();

        assert_eq!(render(0x00, 0), None);
        assert_eq!(render(0x01, 0x7f04_0001).as_deref(), Some("@7F040001"));
        assert_eq!(render(0x02, 0x0101_0036).as_deref(), Some("?01010036"));
        assert_eq!(render(0x03, 0).as_deref(), Some("hello"));
        assert_eq!(render(0x04, 1.5f32.to_bits()).as_deref(), Some("1.5"));
        assert_eq!(render(0x05, 0x0500_0021).as_deref(), Some("10.0dip"));
        assert_eq!(render(0x05, 0x0080_0020).as_deref(), Some("1.0px"));
        assert_eq!(render(0x06, 0x4000_0030).as_deref(), Some("0.5%"));
        assert_eq!(render(0x10, (-3i32) as u32).as_deref(), Some("-3"));
        assert_eq!(render(0x11, 0x1F).as_deref(), Some("0x0000001F"));
        assert_eq!(render(0x12, 1).as_deref(), Some("true"));
        assert_eq!(render(0x1c, 0xFFFF_0000).as_deref(), Some("#FFFF0000"));
        assert!(coerce(0x03, 9, &strings).is_err());
        assert!(coerce(0x07, 0, &strings).is_err());
    }

    #[test]
    fn test_complex_to_float_bands() {
        assert_eq!(complex_to_float(crate::value::complex(0.5, 0)), 0.5);
        assert_eq!(complex_to_float(crate::value::complex(-1.0, 0)), -1.0);
        assert_eq!(complex_to_float(crate::value::complex(300.0, 0)), 300.0);
        assert_eq!(complex_to_float(crate::value::complex(70000.0, 0)), 70000.0);
    }
}

#[cfg(all(test, feature = "xml-source", feature = "xml-output"))]
mod round_trip {
    use super::*;
    use crate::resolver::ANDROID_NAMESPACE;
    use crate::{Encoder, StringEncoding};

    const LAYOUT: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:app="http://schemas.android.com/apk/res-auto"
    android:orientation="vertical"
    android:layout_width="10dp"
    android:layout_height="50%">
    <TextView android:id="@7f080001" android:text="Hello &amp; welcome" style="@7f0a0001"
        android:enabled="true" android:alpha="0.5" app:tint="#80FF0000"/>
    <View android:layout_width="-2" android:visibility="0x1" android:background="@null"/>
</LinearLayout>
"##;

    fn strip_lines(element: &mut AxmlElement) {
        element.line_number = 0;
        element.children.iter_mut().for_each(strip_lines);
    }

    #[test]
    fn test_decodes_encoded_tree() {
        for encoding in [StringEncoding::Utf16, StringEncoding::Utf8] {
            let bytes = Encoder::new().string_encoding(encoding).encode_str(LAYOUT).unwrap();
            let doc = AxmlDocument::parse(&bytes).unwrap();
            assert_eq!(doc.is_utf8(), encoding == StringEncoding::Utf8);

            let root = doc.root().unwrap();
            assert_eq!(root.name, "LinearLayout");
            assert_eq!(root.line_number, 2);
            assert_eq!(root.namespaces.len(), 2);
            assert_eq!(root.namespaces[0].prefix.as_deref(), Some("android"));
            assert_eq!(root.children.len(), 2);

            let width = root.attribute(Some(ANDROID_NAMESPACE), "layout_width").unwrap();
            assert_eq!(width.prefix.as_deref(), Some("android"));
            assert_eq!(width.resource_id, Some(0x0101_00f4));
            assert_eq!(width.value.as_deref(), Some("10.0dip"));
            assert_eq!(width.raw_value, None);

            let text_view = &root.children[0];
            assert_eq!(text_view.line_number, 7);
            let text = text_view.attribute(Some(ANDROID_NAMESPACE), "text").unwrap();
            assert_eq!(text.value.as_deref(), Some("Hello & welcome"));
            assert_eq!(text.raw_value.as_deref(), Some("Hello & welcome"));
            let tint = text_view
                .attribute(Some("http://schemas.android.com/apk/res-auto"), "tint")
                .unwrap();
            assert_eq!(tint.value.as_deref(), Some("#80FF0000"));
            assert_eq!(tint.resource_id, None);
            assert_eq!(text_view.attributes[0].name, "id");
            assert_eq!(text_view.attribute(None, "style").unwrap().value_type, 0x01);

            let view = &root.children[1];
            assert_eq!(view.attributes[0].value.as_deref(), Some("-2"));
            assert_eq!(view.attributes[1].value.as_deref(), Some("0x00000001"));
            assert_eq!(view.attributes[2].value, None);
        }
    }

    #[test]
    fn test_xml_output_reencodes_to_same_tree() {
        let bytes = Encoder::new().encode_str(LAYOUT).unwrap();
        let first = AxmlDocument::parse(&bytes).unwrap();
        let xml = first.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("xmlns:android=\"http://schemas.android.com/apk/res/android\""));

        let again = Encoder::new().encode_str(&xml).unwrap();
        let second = AxmlDocument::parse(&again).unwrap();

        let mut a = first.root().unwrap().clone();
        let mut b = second.root().unwrap().clone();
        strip_lines(&mut a);
        strip_lines(&mut b);
        assert_eq!(a, b);
        assert_eq!(first.resource_ids(), second.resource_ids());
    }
}
