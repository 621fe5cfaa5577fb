//! Chunk type codes and their fixed header sizes.

/// Type code of a framed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ChunkType {
    /// Shared string pool.
    StringPool = 0x0001,
    /// Outer XML document.
    Xml = 0x0003,
    /// Namespace scope start.
    XmlStartNamespace = 0x0100,
    /// Namespace scope end.
    XmlEndNamespace = 0x0101,
    /// Element start tag with attributes.
    XmlStartElement = 0x0102,
    /// Element end tag.
    XmlEndElement = 0x0103,
    /// Character data. Decoded and skipped, never produced by the encoder.
    XmlCdata = 0x0104,
    /// Resource id table for the identified string pool prefix.
    XmlResourceMap = 0x0180,
}

impl ChunkType {
    /// All known chunk types.
    pub const ALL: [ChunkType; 8] = [
        ChunkType::StringPool,
        ChunkType::Xml,
        ChunkType::XmlStartNamespace,
        ChunkType::XmlEndNamespace,
        ChunkType::XmlStartElement,
        ChunkType::XmlEndElement,
        ChunkType::XmlCdata,
        ChunkType::XmlResourceMap,
    ];

    /// Header size shared by every tree node chunk.
    pub const NODE_HEADER_SIZE: u16 = 16;

    /// Wire type code.
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Fixed header size in bytes.
    pub const fn header_size(self) -> u16 {
        match self {
            ChunkType::StringPool => 28,
            ChunkType::Xml | ChunkType::XmlResourceMap => 8,
            ChunkType::XmlStartNamespace
            | ChunkType::XmlEndNamespace
            | ChunkType::XmlStartElement
            | ChunkType::XmlEndElement
            | ChunkType::XmlCdata => Self::NODE_HEADER_SIZE,
        }
    }

    /// Look up a chunk type by its wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for ty in ChunkType::ALL {
            assert_eq!(ChunkType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(ChunkType::from_code(0x0002), None);
    }

    #[test]
    fn test_header_sizes() {
        assert_eq!(ChunkType::StringPool.header_size(), 28);
        assert_eq!(ChunkType::Xml.header_size(), 8);
        assert_eq!(ChunkType::XmlResourceMap.header_size(), 8);
        assert_eq!(ChunkType::XmlStartElement.header_size(), 16);
    }
}
