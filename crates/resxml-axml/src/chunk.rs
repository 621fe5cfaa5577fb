//! Chunk framework: headers, size memoization and checked emission.
//!
//! Every piece of the binary output is a [`Chunk`]. Emission is two-phase:
//! [`Chunk::calc`] resolves sizes bottom-up (each parent's size hook calls
//! `calc` on its children and sums their memoized sizes), then
//! [`Chunk::write`] emits the tree top-down. After a chunk is emitted the
//! number of bytes it produced is compared against its declared size.

use std::io::Write;

use resxml_common::BinaryWriter;

use crate::{ChunkType, Error, Result, StringPool};

/// Framing variant of a chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// `type:u16, headerSize:u16, size:u32`, followed by any type-specific
    /// header fields.
    Chunk(ChunkType),
    /// A full header plus `lineNo:u32, comment:u32` for tree node chunks.
    Node {
        chunk_type: ChunkType,
        line_number: u32,
        /// String pool index of an attached comment, `-1` on the wire if none.
        comment: Option<u32>,
    },
    /// Zero bytes. Used by wrappers that only group children.
    Empty,
}

/// Header of a chunk with its memoized size.
#[derive(Debug, Clone)]
pub struct Header {
    kind: HeaderKind,
    size: Option<u32>,
}

impl Header {
    /// Full header for a chunk type.
    pub fn chunk(chunk_type: ChunkType) -> Self {
        Self {
            kind: HeaderKind::Chunk(chunk_type),
            size: None,
        }
    }

    /// Node header carrying a source line number.
    pub fn node(chunk_type: ChunkType, line_number: u32) -> Self {
        Self {
            kind: HeaderKind::Node {
                chunk_type,
                line_number,
                comment: None,
            },
            size: None,
        }
    }

    /// Empty header.
    pub fn empty() -> Self {
        Self {
            kind: HeaderKind::Empty,
            size: None,
        }
    }

    /// The framing variant.
    pub fn kind(&self) -> HeaderKind {
        self.kind
    }

    /// The chunk type, if the header is not empty.
    pub fn chunk_type(&self) -> Option<ChunkType> {
        match self.kind {
            HeaderKind::Chunk(chunk_type) | HeaderKind::Node { chunk_type, .. } => Some(chunk_type),
            HeaderKind::Empty => None,
        }
    }

    /// Number of header bytes on the wire.
    pub fn header_size(&self) -> u16 {
        self.chunk_type().map_or(0, ChunkType::header_size)
    }

    /// Source line number of a node header.
    pub fn line_number(&self) -> Option<u32> {
        match self.kind {
            HeaderKind::Node { line_number, .. } => Some(line_number),
            _ => None,
        }
    }

    /// Declared total size, once calculated.
    pub fn size(&self) -> Option<u32> {
        self.size
    }

    /// Write the common header fields for a chunk of `size` bytes.
    fn write<W: Write>(&self, w: &mut BinaryWriter<W>, size: u32) -> Result<()> {
        match self.kind {
            HeaderKind::Empty => {}
            HeaderKind::Chunk(chunk_type) => {
                w.write_u16(chunk_type.code())?;
                w.write_u16(chunk_type.header_size())?;
                w.write_u32(size)?;
            }
            HeaderKind::Node {
                chunk_type,
                line_number,
                comment,
            } => {
                w.write_u16(chunk_type.code())?;
                w.write_u16(chunk_type.header_size())?;
                w.write_u32(size)?;
                w.write_u32(line_number)?;
                w.write_i32(comment.map_or(-1, |index| index as i32))?;
            }
        }
        Ok(())
    }
}

/// A node of the binary output tree.
pub trait Chunk {
    /// The chunk's header.
    fn header(&self) -> &Header;

    /// Mutable access to the chunk's header.
    fn header_mut(&mut self) -> &mut Header;

    /// Size hook. Computes the total size in bytes, header included.
    ///
    /// Runs at most once per chunk, from [`Chunk::calc`]; implementations call
    /// `calc` on their children first.
    fn compute_size(&mut self) -> u32;

    /// Type-specific header fields written after the common ones.
    fn write_header_ext<W: Write>(&self, _w: &mut BinaryWriter<W>) -> Result<()> {
        Ok(())
    }

    /// Write everything after the header.
    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()>;

    /// Resolve and memoize the declared size.
    fn calc(&mut self) -> u32 {
        if let Some(size) = self.header().size {
            return size;
        }
        let size = self.compute_size();
        self.header_mut().size = Some(size);
        size
    }

    /// Calculate sizes, then emit this chunk.
    fn write<W: Write>(&mut self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        self.calc();
        self.emit(w, pool)
    }

    /// Emit an already calculated chunk and check its size.
    fn emit<W: Write>(&self, w: &mut BinaryWriter<W>, pool: &StringPool) -> Result<()> {
        let header = self.header();
        let declared = header
            .size
            .ok_or(Error::SizeNotCalculated(header.chunk_type()))?;

        let start = w.position();
        header.write(w, declared)?;
        self.write_header_ext(w)?;
        self.write_body(w, pool)?;

        let written = w.position() - start;
        if written != u64::from(declared) {
            return Err(Error::SizeMismatch {
                chunk: header.chunk_type(),
                declared,
                written,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts how often its size hook runs.
    struct Probe {
        header: Header,
        body: Vec<u8>,
        claimed: Option<u32>,
        hook_calls: usize,
    }

    impl Probe {
        fn new(header: Header, body: &[u8]) -> Self {
            Self {
                header,
                body: body.to_vec(),
                claimed: None,
                hook_calls: 0,
            }
        }
    }

    impl Chunk for Probe {
        fn header(&self) -> &Header {
            &self.header
        }

        fn header_mut(&mut self) -> &mut Header {
            &mut self.header
        }

        fn compute_size(&mut self) -> u32 {
            self.hook_calls += 1;
            self.claimed
                .unwrap_or(self.header.header_size() as u32 + self.body.len() as u32)
        }

        fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, _pool: &StringPool) -> Result<()> {
            w.write_bytes(&self.body)?;
            Ok(())
        }
    }

    fn frozen_pool() -> StringPool {
        let mut pool = StringPool::default();
        pool.calc();
        pool
    }

    #[test]
    fn test_calc_runs_hook_once() {
        let mut probe = Probe::new(Header::chunk(ChunkType::XmlResourceMap), &[1, 2, 3, 4]);
        assert_eq!(probe.calc(), 12);
        assert_eq!(probe.calc(), 12);
        assert_eq!(probe.hook_calls, 1);

        let mut w = BinaryWriter::new(Vec::new());
        probe.write(&mut w, &frozen_pool()).unwrap();
        assert_eq!(probe.hook_calls, 1);
    }

    #[test]
    fn test_full_header_layout() {
        let mut probe = Probe::new(Header::chunk(ChunkType::XmlResourceMap), &[0xAA; 4]);
        let mut w = BinaryWriter::new(Vec::new());
        probe.write(&mut w, &frozen_pool()).unwrap();

        assert_eq!(
            w.into_inner(),
            [0x80, 0x01, 0x08, 0x00, 0x0C, 0x00, 0x00, 0x00, 0xAA, 0xAA, 0xAA, 0xAA]
        );
    }

    #[test]
    fn test_node_header_layout() {
        let mut header = Header::node(ChunkType::XmlEndElement, 7);
        assert_eq!(header.line_number(), Some(7));
        let mut probe = Probe::new(header.clone(), &[]);
        let mut w = BinaryWriter::new(Vec::new());
        probe.write(&mut w, &frozen_pool()).unwrap();
        let bytes = w.into_inner();

        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &[0x03, 0x01, 0x10, 0x00]);
        assert_eq!(&bytes[4..8], &16u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &7u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &[0xFF; 4]);

        header.kind = HeaderKind::Node {
            chunk_type: ChunkType::XmlEndElement,
            line_number: 7,
            comment: Some(3),
        };
        let mut probe = Probe::new(header, &[]);
        let mut w = BinaryWriter::new(Vec::new());
        probe.write(&mut w, &frozen_pool()).unwrap();
        assert_eq!(&w.into_inner()[12..16], &3u32.to_le_bytes());
    }

    #[test]
    fn test_empty_header_writes_only_body() {
        let mut probe = Probe::new(Header::empty(), &[9, 9]);
        assert_eq!(probe.calc(), 2);
        let mut w = BinaryWriter::new(Vec::new());
        probe.write(&mut w, &frozen_pool()).unwrap();
        assert_eq!(w.into_inner(), [9, 9]);
    }

    #[test]
    fn test_size_mismatch_is_fatal() {
        let mut probe = Probe::new(Header::chunk(ChunkType::XmlResourceMap), &[0; 4]);
        probe.claimed = Some(16);
        let mut w = BinaryWriter::new(Vec::new());
        let err = probe.write(&mut w, &frozen_pool()).unwrap_err();

        assert!(matches!(
            err,
            Error::SizeMismatch {
                chunk: Some(ChunkType::XmlResourceMap),
                declared: 16,
                written: 12,
            }
        ));
    }

    #[test]
    fn test_emit_requires_calc() {
        let probe = Probe::new(Header::empty(), &[]);
        let mut w = BinaryWriter::new(Vec::new());
        assert!(matches!(
            probe.emit(&mut w, &frozen_pool()),
            Err(Error::SizeNotCalculated(None))
        ));
    }
}
