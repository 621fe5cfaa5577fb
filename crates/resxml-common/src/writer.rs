//! Binary writer for little-endian output streams.
//!
//! [`BinaryWriter`] wraps any [`Write`] sink and counts the bytes written
//! through it, so callers can check how many bytes a section produced.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::Result;

/// A little-endian scalar writer that tracks its stream position.
///
/// # Example
///
/// ```
/// use resxml_common::BinaryWriter;
///
/// let mut writer = BinaryWriter::new(Vec::new());
/// writer.write_u16(0x0003).unwrap();
/// writer.write_u16(0x0008).unwrap();
/// writer.write_i32(-1).unwrap();
///
/// assert_eq!(writer.position(), 8);
/// assert_eq!(writer.into_inner(), [3, 0, 8, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
/// ```
#[derive(Debug)]
pub struct BinaryWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new writer around a sink, starting at position 0.
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        self.position += 1;
        Ok(())
    }

    /// Write a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner.write_u16::<LittleEndian>(value)?;
        self.position += 2;
        Ok(())
    }

    /// Write a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner.write_i32::<LittleEndian>(value)?;
        self.position += 4;
        Ok(())
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryReader;

    #[test]
    fn test_write_primitives_little_endian() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_u8(0xAB).unwrap();
        writer.write_u16(0x0102).unwrap();
        writer.write_u32(0x0A0B0C0D).unwrap();

        assert_eq!(writer.position(), 7);
        assert_eq!(
            writer.into_inner(),
            [0xAB, 0x02, 0x01, 0x0D, 0x0C, 0x0B, 0x0A]
        );
    }

    #[test]
    fn test_reader_reads_back_writer_output() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_i32(-1).unwrap();
        writer.write_bytes(b"ab").unwrap();
        writer.write_u16(0).unwrap();
        assert_eq!(writer.position(), 8);

        let bytes = writer.into_inner();
        let mut reader = BinaryReader::new(&bytes);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.read_bytes(2).unwrap(), b"ab");
        assert_eq!(reader.read_u16().unwrap(), 0);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_sink_failure_propagates() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = BinaryWriter::new(Full);
        assert!(writer.write_u32(1).is_err());
        assert_eq!(writer.position(), 0);
    }
}
