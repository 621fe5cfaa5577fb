//! Error types for binary XML encoding and decoding.

use thiserror::Error;

use crate::ChunkType;

/// Errors that can occur when encoding or decoding binary XML.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] resxml_common::Error),

    /// A non-empty string was looked up but never registered in the pool.
    #[error("string not found in pool: {text:?}")]
    UnresolvedString { text: String },

    /// An attribute value form this encoder does not implement.
    #[error("unsupported value {raw:?}: {reason}")]
    UnsupportedValue { raw: String, reason: &'static str },

    /// An attribute value matched a typed form but its payload does not fit.
    #[error("invalid value {raw:?}: {reason}")]
    InvalidValue { raw: String, reason: String },

    /// A chunk emitted a different number of bytes than it declared.
    #[error("{chunk:?} chunk declared {declared} bytes but wrote {written}")]
    SizeMismatch {
        chunk: Option<ChunkType>,
        declared: u32,
        written: u64,
    },

    /// A chunk was emitted before its size was calculated.
    #[error("{0:?} chunk emitted before its size was calculated")]
    SizeNotCalculated(Option<ChunkType>),

    /// A pool lookup happened before the pool was frozen.
    #[error("string pool is not frozen yet")]
    PoolNotFrozen,

    /// A registration happened after the pool was frozen.
    #[error("string pool is frozen, cannot register {text:?}")]
    PoolFrozen { text: String },

    /// A string is too long for the selected pool encoding.
    #[error("string of {len} units exceeds the pool limit of {max}")]
    StringTooLong { len: usize, max: usize },

    /// An element has more attributes than a start tag can count.
    #[error("element has {0} attributes (maximum 65535)")]
    TooManyAttributes(usize),

    /// Malformed source XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// A prefix was used without a namespace declaration in scope.
    #[error("unbound namespace prefix: {0}")]
    UnboundPrefix(String),

    /// The source contained no element.
    #[error("no root element found in XML")]
    NoRootElement,

    /// The source ended inside an open element.
    #[error("document ended inside element {0:?}")]
    UnexpectedEndOfDocument(String),

    /// Input does not start with a binary XML document chunk.
    #[error("not a binary XML document")]
    NotBinaryXml,

    /// A chunk header or body is inconsistent.
    #[error("malformed chunk: {0}")]
    MalformedChunk(String),

    /// A string index outside the decoded pool.
    #[error("string index {index} out of bounds (pool size: {count})")]
    StringIndexOutOfBounds { index: u32, count: usize },

    /// An element chunk appeared before the string pool.
    #[error("element encountered before string pool")]
    MissingStringPool,

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// UTF-16 decoding error.
    #[error("UTF-16 error: {0}")]
    Utf16(#[from] std::string::FromUtf16Error),
}

/// Result type for binary XML operations.
pub type Result<T> = std::result::Result<T, Error>;
