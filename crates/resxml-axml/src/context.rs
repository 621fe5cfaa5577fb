//! State shared by chunks while the element tree is being built.

use crate::resolver::ResourceResolver;
use crate::{Result, StringPool};

/// Construction-time context: the document's pool and the id resolver.
pub struct BuildContext<'a> {
    pool: &'a mut StringPool,
    resolver: &'a dyn ResourceResolver,
}

impl<'a> BuildContext<'a> {
    /// Create a context over a pool that is not frozen yet.
    pub fn new(pool: &'a mut StringPool, resolver: &'a dyn ResourceResolver) -> Self {
        Self { pool, resolver }
    }

    /// Register a string in the document pool.
    pub fn register(&mut self, namespace: Option<&str>, text: &str) -> Result<()> {
        self.pool.register(namespace, text, self.resolver)
    }
}
