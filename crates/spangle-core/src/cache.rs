//! Render cache
//!
//! Caches rendered trees to avoid re-running the pipeline for unchanged
//! content. Keyed by content hash and context fingerprint so a changed
//! flag or palette never serves a stale tree. The cache is owned by the
//! host view, which decides lifetime and invalidation.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::context::RenderContext;
use crate::pipeline::{Pipeline, Rendered};

/// Cache key: (content hash, context fingerprint)
type CacheKey = (u64, u64);

#[derive(Debug, Default)]
pub struct RenderCache {
    cache: HashMap<CacheKey, Arc<Rendered>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable hash of the message text
    pub fn content_hash(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(&self, text: &str, ctx: &RenderContext) -> Option<Arc<Rendered>> {
        self.cache
            .get(&(Self::content_hash(text), ctx.fingerprint()))
            .cloned()
    }

    /// Fetch a cached render or run the pipeline and cache the result
    pub fn get_or_render(
        &mut self,
        pipeline: &Pipeline,
        text: &str,
        ctx: &RenderContext,
    ) -> Arc<Rendered> {
        let key = (Self::content_hash(text), ctx.fingerprint());
        if let Some(cached) = self.cache.get(&key) {
            return Arc::clone(cached);
        }
        let rendered = Arc::new(pipeline.render(text, ctx));
        self.cache.insert(key, Arc::clone(&rendered));
        rendered
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
