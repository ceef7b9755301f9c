//! Pre-mutation cache states kept for rolling back speculative writes

use parking_lot::Mutex;
use ahash::AHashMap;
use serde_json::Value;
use wm_core::CacheKey;

/// One snapshot slot per cache key
///
/// A slot holding `None` is cleared and is never restored. Snapshots do not
/// stack: a second optimistic write to the same key before the first
/// settles overwrites the first snapshot.
#[derive(Debug, Default)]
pub struct OptimisticSnapshotStore {
    snapshots: Mutex<AHashMap<String, Option<Value>>>,
}

impl OptimisticSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `key`, replacing whatever was there
    pub fn set(&self, key: &CacheKey, value: Option<Value>) {
        self.snapshots.lock().insert(key.canonical().to_string(), value);
    }

    /// The snapshot to restore for `key`, if one is held
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.snapshots.lock().get(key.canonical()).cloned().flatten()
    }

    /// Mark the slot for `key` as cleared
    pub fn clear(&self, key: &CacheKey) {
        self.set(key, None);
    }

    /// Number of slots currently holding a value
    pub fn held(&self) -> usize {
        self.snapshots.lock().values().filter(|v| v.is_some()).count()
    }
}
