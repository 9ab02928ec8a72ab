//! Cross-page resource cache.
//!
//! Pages converted in parallel share fonts and color spaces resolved from the
//! same document objects. Lookups take a read lock; misses compute the value
//! outside any lock and insert it unless another thread won the race, so
//! concurrent callers always observe one value per key.

use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

use super::color::ColorSpace;
use super::resources::{Font, ResourceKind};

#[derive(Debug, Clone)]
enum CachedResource {
    Font(Arc<dyn Font>),
    ColorSpace(ColorSpace),
}

/// Thread-safe compute-or-fetch cache keyed by resource identity.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<FxHashMap<(ResourceKind, u64), CachedResource>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: (ResourceKind, u64)) -> Option<CachedResource> {
        self.entries.read().ok()?.get(&key).cloned()
    }

    fn get_or_insert(
        &self,
        key: (ResourceKind, u64),
        compute: impl FnOnce() -> Option<CachedResource>,
    ) -> Option<CachedResource> {
        if let Some(hit) = self.get(key) {
            tracing::trace!(?key, "resource cache hit");
            return Some(hit);
        }
        let value = compute()?;
        match self.entries.write() {
            Ok(mut entries) => Some(entries.entry(key).or_insert(value).clone()),
            // A poisoned lock only loses caching, not the value.
            Err(_) => Some(value),
        }
    }

    /// Returns the cached font for `key`, resolving it with `load` on a miss.
    pub fn font(
        &self,
        key: u64,
        load: impl FnOnce() -> Option<Arc<dyn Font>>,
    ) -> Option<Arc<dyn Font>> {
        match self.get_or_insert((ResourceKind::Font, key), || {
            load().map(CachedResource::Font)
        })? {
            CachedResource::Font(f) => Some(f),
            CachedResource::ColorSpace(_) => None,
        }
    }

    /// Returns the cached color space for `key`, resolving it with `load` on a miss.
    pub fn color_space(
        &self,
        key: u64,
        load: impl FnOnce() -> Option<ColorSpace>,
    ) -> Option<ColorSpace> {
        match self.get_or_insert((ResourceKind::ColorSpace, key), || {
            load().map(CachedResource::ColorSpace)
        })? {
            CachedResource::ColorSpace(cs) => Some(cs),
            CachedResource::Font(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resources::FallbackFont;

    #[test]
    fn test_second_lookup_does_not_load() {
        let cache = ResourceCache::new();
        let first = cache.font(7, || Some(Arc::new(FallbackFont::default())));
        assert!(first.is_some());
        let second = cache.font(7, || panic!("loaded twice"));
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let cache = ResourceCache::new();
        cache.font(1, || Some(Arc::new(FallbackFont::default())));
        let cs = cache.color_space(1, || Some(ColorSpace::DeviceRgb));
        assert_eq!(cs, Some(ColorSpace::DeviceRgb));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_fetch_is_idempotent() {
        use rayon::prelude::*;
        let cache = ResourceCache::new();
        let fonts: Vec<_> = (0..64)
            .into_par_iter()
            .filter_map(|_| cache.font(3, || Some(Arc::new(FallbackFont::default()))))
            .collect();
        assert!(fonts.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
