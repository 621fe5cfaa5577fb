//! Resxml - compiled Android resource XML library.
//!
//! This crate provides a unified interface to the resxml crates for turning
//! textual Android XML (manifests, layouts, drawables) into the binary form
//! packaged in APKs, and reading that form back.
//!
//! # Crates
//!
//! - [`resxml_common`] - Little-endian binary reading and writing
//! - [`resxml_axml`] - Binary XML chunks, string pool, value typing, encoder and decoder
//!
//! # Example
//!
//! ```no_run
//! use resxml::prelude::*;
//!
//! let xml = std::fs::read_to_string("AndroidManifest.xml")?;
//!
//! let encoder = Encoder::new().app_package("com.example");
//! let bytes = encoder.encode_str(&xml)?;
//! std::fs::write("AndroidManifest.bin", &bytes)?;
//!
//! let doc = AxmlDocument::parse(&bytes)?;
//! println!("{}", doc.to_xml_string()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use resxml_axml as axml;
pub use resxml_common as common;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use resxml_axml::{
        AxmlDocument, AxmlElement, Encoder, FrameworkResolver, ResourceResolver, StaticResolver,
        StringEncoding, Value, XmlSource,
    };
    #[cfg(feature = "full")]
    pub use resxml_axml::QuickXmlSource;
    pub use resxml_common::{BinaryReader, BinaryWriter};
}

// Re-export commonly used types at the crate root
pub use resxml_axml::{AxmlDocument, Encoder};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
