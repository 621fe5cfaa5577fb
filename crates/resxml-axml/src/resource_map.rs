//! Resource map chunk: the resource ids of the pool's identified prefix.

use std::io::Write;

use resxml_common::BinaryWriter;

use crate::chunk::{Chunk, Header};
use crate::{ChunkType, Result, StringPool};

/// Table mapping pool indices `0..n` to resource ids.
#[derive(Debug, Clone)]
pub struct ResourceMap {
    header: Header,
    ids: Vec<u32>,
}

impl ResourceMap {
    /// Collect the ids of the leading identified entries of a frozen pool.
    ///
    /// Identified entries sort first, so pool index `i` maps to `ids[i]`.
    pub fn collect(pool: &StringPool) -> Self {
        let ids = pool.entries().map_while(|entry| entry.resource_id).collect();
        Self {
            header: Header::chunk(ChunkType::XmlResourceMap),
            ids,
        }
    }

    /// The collected ids.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }
}

impl Chunk for ResourceMap {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn compute_size(&mut self) -> u32 {
        u32::from(self.header.header_size()) + self.ids.len() as u32 * 4
    }

    fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>, _pool: &StringPool) -> Result<()> {
        for id in &self.ids {
            w.write_u32(*id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{StaticResolver, ANDROID_NAMESPACE};

    #[test]
    fn test_collects_identified_prefix() {
        let resolver = StaticResolver::new()
            .attr("android", "versionCode", 0x0101_021b)
            .attr("android", "name", 0x0101_0003);
        let mut pool = StringPool::default();
        pool.register(None, "manifest", &resolver).unwrap();
        pool.register(Some(ANDROID_NAMESPACE), "versionCode", &resolver).unwrap();
        pool.register(Some(ANDROID_NAMESPACE), "name", &resolver).unwrap();
        pool.register(Some(ANDROID_NAMESPACE), "unknownAttr", &resolver).unwrap();
        pool.calc();

        let mut map = ResourceMap::collect(&pool);
        assert_eq!(map.ids(), &[0x0101_0003, 0x0101_021b]);

        let mut w = BinaryWriter::new(Vec::new());
        map.write(&mut w, &pool).unwrap();
        assert_eq!(
            w.into_inner(),
            [
                0x80, 0x01, 0x08, 0x00, 0x10, 0x00, 0x00, 0x00, //
                0x03, 0x00, 0x01, 0x01, 0x1b, 0x02, 0x01, 0x01,
            ]
        );
    }

    #[test]
    fn test_empty_map_is_header_only() {
        let mut pool = StringPool::default();
        pool.calc();
        let mut map = ResourceMap::collect(&pool);
        assert_eq!(map.calc(), 8);
    }
}
