//! Document-wide string pool.
//!
//! Strings are registered while the element tree is built. The pool is frozen
//! once, during the document's size pass: entries are stable-sorted so that
//! strings carrying a resource id come first (ascending id), followed by the
//! rest in registration order. Indices handed out after freezing never change.

use std::io::Write;

use log::{debug, warn};
use resxml_common::BinaryWriter;
use rustc_hash::FxHashMap;

use crate::chunk::{Chunk, Header};
use crate::resolver::{package_for_namespace, ResourceResolver};
use crate::{ChunkType, Error, Result};

/// Pool flag marking UTF-8 entries.
pub const UTF8_FLAG: u32 = 1 << 8;

/// Byte layout of pool entries, chosen once per document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StringEncoding {
    /// Length in code units, UTF-16LE code units, u16 terminator, 4-byte padding.
    #[default]
    Utf16,
    /// UTF-16 length, UTF-8 byte length, bytes, 0 terminator. Not padded.
    Utf8,
}

impl StringEncoding {
    /// Largest string length, in units of the length prefix, the layout can express.
    pub const fn max_len(self) -> usize {
        match self {
            StringEncoding::Utf16 => 0x7FFF_FFFF,
            StringEncoding::Utf8 => 0x7FFF,
        }
    }

    /// Encoded size of one entry in bytes.
    pub fn entry_size(self, text: &str) -> u32 {
        let units = text.encode_utf16().count();
        match self {
            StringEncoding::Utf16 => {
                let prefix = if units > 0x7FFF { 4 } else { 2 };
                let len = prefix + units * 2 + 2;
                (len + len % 4) as u32
            }
            StringEncoding::Utf8 => {
                let bytes = text.len();
                (utf8_prefix_len(units) + utf8_prefix_len(bytes) + bytes + 1) as u32
            }
        }
    }

    /// Write one entry.
    fn write_entry<W: Write>(self, w: &mut BinaryWriter<W>, text: &str) -> Result<()> {
        match self {
            StringEncoding::Utf16 => {
                let units: Vec<u16> = text.encode_utf16().collect();
                let start = w.position();
                if units.len() > 0x7FFF {
                    w.write_u16(((units.len() >> 16) as u16) | 0x8000)?;
                    w.write_u16(units.len() as u16)?;
                } else {
                    w.write_u16(units.len() as u16)?;
                }
                for unit in &units {
                    w.write_u16(*unit)?;
                }
                w.write_u16(0)?;
                if (w.position() - start) % 4 != 0 {
                    w.write_u16(0)?;
                }
            }
            StringEncoding::Utf8 => {
                write_utf8_len(w, text.encode_utf16().count())?;
                write_utf8_len(w, text.len())?;
                w.write_bytes(text.as_bytes())?;
                w.write_u8(0)?;
            }
        }
        Ok(())
    }
}

fn align4(len: u32) -> u32 {
    (len + 3) & !3
}

fn utf8_prefix_len(len: usize) -> usize {
    if len > 0x7F {
        2
    } else {
        1
    }
}

fn write_utf8_len<W: Write>(w: &mut BinaryWriter<W>, len: usize) -> Result<()> {
    if len > 0x7F {
        w.write_u8(((len >> 8) as u8) | 0x80)?;
    }
    w.write_u8(len as u8)?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Entry {
    namespace: Option<String>,
    text: String,
    resource_id: Option<u32>,
}

/// A pool entry as seen after freezing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolEntry<'a> {
    /// The string.
    pub text: &'a str,
    /// Namespace the string was registered under, if any.
    pub namespace: Option<&'a str>,
    /// Resolved resource id, if any.
    pub resource_id: Option<u32>,
}

/// The string pool chunk.
#[derive(Debug, Clone)]
pub struct StringPool {
    header: Header,
    encoding: StringEncoding,
    /// Entries in registration order.
    entries: Vec<Entry>,
    /// Text to entry ids, in registration order.
    by_text: FxHashMap<String, Vec<usize>>,
    /// Frozen order: pool index to entry id.
    order: Vec<usize>,
    /// Entry id to pool index.
    positions: Vec<u32>,
    /// Byte offset of each frozen entry, relative to the strings start.
    offsets: Vec<u32>,
    /// Entry ids of names in a resource package that got no id.
    unresolved: Vec<usize>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new(StringEncoding::default())
    }
}

impl StringPool {
    /// Create an empty pool with the given entry layout.
    pub fn new(encoding: StringEncoding) -> Self {
        Self {
            header: Header::chunk(ChunkType::StringPool),
            encoding,
            entries: Vec::new(),
            by_text: FxHashMap::default(),
            order: Vec::new(),
            positions: Vec::new(),
            offsets: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Entry layout of this pool.
    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the pool has been frozen by its size pass.
    pub fn is_frozen(&self) -> bool {
        self.header.size().is_some()
    }

    /// Register `text`, optionally under a namespace.
    ///
    /// Without a namespace any existing entry for the text satisfies the call.
    /// With one, an entry of the same namespace satisfies it; otherwise a
    /// namespace-less entry is promoted to that namespace and its resource id
    /// is resolved; otherwise a new entry is added. An entry's namespace is
    /// never overwritten. Empty text is not registered.
    pub fn register(
        &mut self,
        namespace: Option<&str>,
        text: &str,
        resolver: &dyn ResourceResolver,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if self.is_frozen() {
            return Err(Error::PoolFrozen {
                text: text.to_string(),
            });
        }
        self.check_length(text)?;

        let namespace = namespace.filter(|ns| !ns.is_empty());
        let candidates = self.by_text.get(text).map(Vec::as_slice).unwrap_or(&[]);

        let Some(namespace) = namespace else {
            if candidates.is_empty() {
                self.push(None, text, None);
            }
            return Ok(());
        };

        if candidates
            .iter()
            .any(|&i| self.entries[i].namespace.as_deref() == Some(namespace))
        {
            return Ok(());
        }

        let package = package_for_namespace(namespace, resolver);
        let resource_id = package.and_then(|package| resolver.attribute_id(text, package));

        let plain = candidates
            .iter()
            .copied()
            .find(|&i| self.entries[i].namespace.is_none());
        let id = match plain {
            Some(i) => {
                let entry = &mut self.entries[i];
                entry.namespace = Some(namespace.to_string());
                entry.resource_id = resource_id;
                i
            }
            None => self.push(Some(namespace), text, resource_id),
        };

        if let (Some(package), None) = (package, resource_id) {
            warn!("no resource id for attribute {package}:{text}; it will be ignored by the platform");
            self.unresolved.push(id);
        }
        Ok(())
    }

    /// Attribute names in a resource namespace that the resolver had no id for.
    pub fn unresolved(&self) -> impl Iterator<Item = &str> + '_ {
        self.unresolved.iter().map(|&i| self.entries[i].text.as_str())
    }

    fn push(&mut self, namespace: Option<&str>, text: &str, resource_id: Option<u32>) -> usize {
        let id = self.entries.len();
        self.entries.push(Entry {
            namespace: namespace.map(str::to_string),
            text: text.to_string(),
            resource_id,
        });
        self.by_text.entry(text.to_string()).or_default().push(id);
        id
    }

    fn check_length(&self, text: &str) -> Result<()> {
        let max = self.encoding.max_len();
        let len = match self.encoding {
            StringEncoding::Utf16 => text.encode_utf16().count(),
            StringEncoding::Utf8 => text.len().max(text.encode_utf16().count()),
        };
        if len > max {
            return Err(Error::StringTooLong { len, max });
        }
        Ok(())
    }

    /// Frozen index of `text`, or `None` for the empty string.
    ///
    /// Without a namespace the first entry for the text in frozen order
    /// matches; with one, only an entry of that namespace matches.
    pub fn lookup(&self, namespace: Option<&str>, text: &str) -> Result<Option<u32>> {
        if text.is_empty() {
            return Ok(None);
        }
        if !self.is_frozen() {
            return Err(Error::PoolNotFrozen);
        }
        let namespace = namespace.filter(|ns| !ns.is_empty());

        self.by_text
            .get(text)
            .into_iter()
            .flatten()
            .filter(|&&i| namespace.is_none() || self.entries[i].namespace.as_deref() == namespace)
            .map(|&i| self.positions[i])
            .min()
            .map(Some)
            .ok_or_else(|| Error::UnresolvedString {
                text: text.to_string(),
            })
    }

    /// Wire form of [`StringPool::lookup`]: the index, or `-1` for none.
    pub fn index(&self, namespace: Option<&str>, text: &str) -> Result<i32> {
        Ok(self
            .lookup(namespace, text)?
            .map_or(-1, |index| index as i32))
    }

    /// Entries in frozen order. Empty before freezing.
    pub fn entries(&self) -> impl Iterator<Item = PoolEntry<'_>> + '_ {
        self.order.iter().map(|&i| {
            let entry = &self.entries[i];
            PoolEntry {
                text: &entry.text,
                namespace: entry.namespace.as_deref(),
                resource_id: entry.resource_id,
            }
        })
    }

    /// Byte offsets of the frozen entries, relative to the strings start.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Sort the entries and lay them out. Returns the total entry bytes.
    fn freeze(&mut self) -> u32 {
        let entries = &self.entries;
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by_key(|&i| {
            let id = entries[i].resource_id;
            (id.is_none(), id)
        });

        let mut positions = vec![0u32; entries.len()];
        let mut offsets = Vec::with_capacity(entries.len());
        let mut offset = 0u32;
        for (index, &i) in order.iter().enumerate() {
            positions[i] = index as u32;
            offsets.push(offset);
            offset += self.encoding.entry_size(&entries[i].text);
        }

        debug!(
            "froze string pool: {} strings, {} with resource ids, {} bytes of {:?} data",
            order.len(),
            entries.iter().filter(|e| e.resource_id.is_some()).count(),
            offset,
            self.encoding
        );

        self.order = order;
        self.positions = positions;
        self.offsets = offsets;
        offset
    }

    fn strings_start(&self) -> u32 {
        u32::from(self.header.header_size()) + self.order.len() as u32 * 4
    }
}

impl Chunk for StringPool {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        let data = self.freeze();
        self.strings_start() + align4(data)
    }

    fn write_header_ext<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<()> {
        let flags = match self.encoding {
            StringEncoding::Utf16 => 0,
            StringEncoding::Utf8 => UTF8_FLAG,
        };
        w.write_u32(self.order.len() as u32)?;
        w.write_u32(0)?; // styles
        w.write_u32(flags)?;
        w.write_u32(self.strings_start())?;
        w.write_u32(0)?;
        Ok(())
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, _pool: &StringPool) -> Result<()> {
        for offset in &self.offsets {
            w.write_u32(*offset)?;
        }
        let start = w.position();
        for &i in &self.order {
            self.encoding.write_entry(w, &self.entries[i].text)?;
        }
        // UTF-8 entries are packed; the section as a whole stays 4-aligned.
        while (w.position() - start) % 4 != 0 {
            w.write_u8(0)?;
        }
        Ok(())
    }
}
