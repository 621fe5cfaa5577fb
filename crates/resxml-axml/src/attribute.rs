//! On-disk attribute entry.

use zerocopy::byteorder::little_endian::{I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// A typed value as stored on disk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RawValue {
    /// Always 8.
    pub size: U16,
    pub res0: u8,
    pub data_type: u8,
    pub data: U32,
}

/// One attribute of a start element.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RawAttribute {
    /// Pool index of the namespace URI, `-1` if none.
    pub namespace: I32,
    /// Pool index of the local name.
    pub name: I32,
    /// Pool index of the original text, `-1` if not kept.
    pub raw_value: I32,
    pub value: RawValue,
}
