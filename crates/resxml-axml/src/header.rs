//! On-disk chunk headers and fixed chunk bodies, as read by the decoder.

use zerocopy::byteorder::little_endian::{I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Header common to every chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ChunkHeader {
    /// Chunk type code.
    pub chunk_type: U16,
    /// Header size including these 8 bytes.
    pub header_size: U16,
    /// Total chunk size including the header.
    pub size: U32,
}

impl ChunkHeader {
    /// Size of the common header.
    pub const SIZE: usize = 8;
}

/// Extra header fields of tree node chunks.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct NodeHeader {
    pub line_number: U32,
    /// Pool index of a comment, `-1` if none.
    pub comment: I32,
}

/// Extra header fields of the string pool chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct StringPoolHeader {
    pub string_count: U32,
    pub style_count: U32,
    pub flags: U32,
    /// Offset of the string data from the start of the chunk.
    pub strings_start: U32,
    /// Offset of the style data from the start of the chunk.
    pub styles_start: U32,
}

/// Fixed part of a start element body.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct StartElementBody {
    pub namespace: I32,
    pub name: I32,
    /// Offset of the attribute array from the start of the body.
    pub attribute_start: U16,
    pub attribute_size: U16,
    pub attribute_count: U16,
    pub id_index: U16,
    pub class_index: U16,
    pub style_index: U16,
}

/// Body of an end element chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct EndElementBody {
    pub namespace: I32,
    pub name: I32,
}

/// Body of a namespace start or end chunk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct NamespaceBody {
    pub prefix: I32,
    pub uri: I32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_sizes() {
        assert_eq!(std::mem::size_of::<ChunkHeader>(), ChunkHeader::SIZE);
        assert_eq!(std::mem::size_of::<NodeHeader>(), 8);
        assert_eq!(std::mem::size_of::<StringPoolHeader>(), 20);
        assert_eq!(std::mem::size_of::<StartElementBody>(), 20);
        assert_eq!(std::mem::size_of::<EndElementBody>(), 8);
        assert_eq!(std::mem::size_of::<NamespaceBody>(), 8);
    }

    #[test]
    fn test_read_header() {
        let bytes = [0x03, 0x00, 0x08, 0x00, 0x40, 0x01, 0x00, 0x00];
        let header = ChunkHeader::read_from_bytes(&bytes).unwrap();
        assert_eq!(header.chunk_type.get(), 3);
        assert_eq!(header.header_size.get(), 8);
        assert_eq!(header.size.get(), 0x140);
    }
}
