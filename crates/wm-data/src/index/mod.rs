//! Tracking of observed query instances

use parking_lot::RwLock;
use ahash::AHashMap;
use wm_core::CacheKey;

/// Records which (query name, variables) instances have completed, so a
/// later mutation knows which cache entries to touch
///
/// Keys are kept in insertion order and never de-duplicated: a query
/// instance that executes twice is tracked twice.
#[derive(Debug, Default)]
pub struct QueryKeyTracker {
    /// Cache keys indexed by query name
    queries: RwLock<AHashMap<String, Vec<CacheKey>>>,
}

impl QueryKeyTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key` to the keys tracked for `query_name`
    pub fn add_query(&self, query_name: &str, key: CacheKey) {
        self.queries
            .write()
            .entry(query_name.to_string())
            .or_insert_with(Vec::new)
            .push(key);
    }

    /// Drop every entry for `query_name` equal to `key`
    pub fn remove_query(&self, query_name: &str, key: &CacheKey) {
        if let Some(keys) = self.queries.write().get_mut(query_name) {
            keys.retain(|tracked| tracked != key);
        }
    }

    /// Keys currently tracked for `query_name`
    pub fn get_keys(&self, query_name: &str) -> Vec<CacheKey> {
        self.queries
            .read()
            .get(query_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Keys for several query names, concatenated in the order given
    pub fn keys_for(&self, query_names: &[&str]) -> Vec<CacheKey> {
        let queries = self.queries.read();
        query_names
            .iter()
            .filter_map(|name| queries.get(*name))
            .flat_map(|keys| keys.iter().cloned())
            .collect()
    }

    /// Whether at least one key is tracked for `query_name`
    pub fn has_any(&self, query_name: &str) -> bool {
        self.queries
            .read()
            .get(query_name)
            .map(|keys| !keys.is_empty())
            .unwrap_or(false)
    }

    /// Number of keys tracked for `query_name`, duplicates included
    pub fn len(&self, query_name: &str) -> usize {
        self.queries.read().get(query_name).map(Vec::len).unwrap_or(0)
    }

    /// Forget every tracked key
    pub fn clear(&self) {
        self.queries.write().clear();
    }
}
