//! In-memory reference cache

use parking_lot::RwLock;
use ahash::AHashMap;
use serde_json::Value;
use wm_core::CacheKey;

use crate::{CacheError, CacheStore};

/// Key-addressed store held entirely in memory
///
/// Batched writes are applied under a single write lock, so readers never
/// observe half of a batch.
#[derive(Debug, Default)]
pub struct MemoryCache {
    /// Cached values indexed by canonical key
    entries: RwLock<AHashMap<String, Value>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the entry for `key`, as an outside invalidation would
    pub fn evict(&self, key: &CacheKey) -> Option<Value> {
        self.entries.write().remove(key.canonical())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl CacheStore for MemoryCache {
    fn read_query(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        Ok(self.entries.read().get(key.canonical()).cloned())
    }

    fn write_query(&self, key: &CacheKey, data: Value) -> Result<(), CacheError> {
        self.entries.write().insert(key.canonical().to_string(), data);
        Ok(())
    }

    fn write_batch(&self, writes: Vec<(CacheKey, Value)>) -> Result<(), CacheError> {
        let mut entries = self.entries.write();
        for (key, data) in writes {
            entries.insert(key.canonical().to_string(), data);
        }
        Ok(())
    }

    fn supports_transactions(&self) -> bool {
        true
    }
}
