//! Layout-hint cache owned by the host view

use std::collections::HashMap;

use crate::context::ContentKind;

/// Measured card heights keyed by content identity
///
/// Owned by the parent list view and passed down to children, so hints
/// survive child remounts without any module-global state.
#[derive(Debug, Default)]
pub struct HeightCache {
    heights: HashMap<(ContentKind, u64), u16>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ContentKind, id: u64) -> Option<u16> {
        self.heights.get(&(kind, id)).copied()
    }

    pub fn set(&mut self, kind: ContentKind, id: u64, height: u16) {
        self.heights.insert((kind, id), height);
    }

    /// Drop the hint for one piece of content, e.g. after an edit
    pub fn invalidate(&mut self, kind: ContentKind, id: u64) {
        self.heights.remove(&(kind, id));
    }

    pub fn clear(&mut self) {
        self.heights.clear();
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_invalidate() {
        let mut cache = HeightCache::new();
        cache.set(ContentKind::Post, 3, 120);
        assert_eq!(cache.get(ContentKind::Post, 3), Some(120));
        // same id under another kind is a different entry
        assert_eq!(cache.get(ContentKind::Comment, 3), None);
        cache.invalidate(ContentKind::Post, 3);
        assert!(cache.is_empty());
    }
}
