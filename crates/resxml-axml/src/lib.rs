//! Encoder and decoder for compiled-resource binary XML.
//!
//! Android packages ship their manifest and layouts as binary XML: a chunk
//! stream holding a deduplicated string pool, a resource map tying attribute
//! names to numeric resource ids, and the element tree with pre-typed
//! attribute values. This crate builds that stream from a textual XML event
//! source and reads it back.
//!
//! # Example
//!
//! ```
//! use resxml_axml::{AxmlDocument, Encoder, StringEncoding};
//!
//! let xml = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
//!     package="com.example" android:versionCode="1"/>"#;
//!
//! let bytes = Encoder::new()
//!     .string_encoding(StringEncoding::Utf8)
//!     .encode_str(xml)?;
//! assert!(AxmlDocument::is_binary_xml(&bytes));
//!
//! let doc = AxmlDocument::parse(&bytes)?;
//! let root = doc.root().unwrap();
//! assert_eq!(root.name, "manifest");
//! assert_eq!(root.attributes[1].value.as_deref(), Some("1"));
//! # Ok::<(), resxml_axml::Error>(())
//! ```

mod attribute;
mod chunk;
mod chunk_type;
mod context;
mod document;
mod element;
mod error;
mod header;
mod nodes;
mod parser;
mod resolver;
mod resource_map;
mod source;
mod string_pool;
mod value;

pub use attribute::{RawAttribute, RawValue};
pub use chunk::{Chunk, Header, HeaderKind};
pub use chunk_type::ChunkType;
pub use context::BuildContext;
pub use document::{Document, Encoder};
pub use element::ElementNode;
pub use error::{Error, Result};
pub use header::ChunkHeader;
pub use nodes::{AttributeChunk, EndNamespace, EndTag, NamespaceChunk, StartNamespace, StartTag};
pub use parser::{complex_to_float, AxmlAttribute, AxmlDocument, AxmlElement, NamespaceDecl};
pub use resolver::{
    package_for_namespace, FrameworkResolver, NoResolver, ResourceResolver, StaticResolver,
    ANDROID_NAMESPACE, ANDROID_PACKAGE, RES_AUTO_NAMESPACE, RES_NAMESPACE_PREFIX,
};
pub use resource_map::ResourceMap;
pub use source::{XmlEvent, XmlSource};
#[cfg(feature = "xml-source")]
pub use source::QuickXmlSource;
pub use string_pool::{PoolEntry, StringEncoding, StringPool};
pub use value::{complex, DimensionUnit, Value, ValueChunk, ValueType};
