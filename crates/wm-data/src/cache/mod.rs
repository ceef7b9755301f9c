//! Cache adapter: the only path from the engine to the external cache

use std::sync::Arc;
use serde_json::Value;
use tracing::{debug, warn};
use wm_core::{CacheKey, Operation};

use crate::CacheStore;

/// Uniform read/write/transaction façade over a [`CacheStore`]
///
/// Store failures are logged and degrade to a miss or a skipped write. In
/// read-only mode every write is suppressed and the store is left untouched.
#[derive(Clone)]
pub struct CacheAdapter {
    store: Arc<dyn CacheStore>,
    debug: bool,
    read_only: bool,
}

impl CacheAdapter {
    /// Create a new adapter over `store`
    pub fn new(store: Arc<dyn CacheStore>, debug: bool, read_only: bool) -> Self {
        Self {
            store,
            debug,
            read_only,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Key addressing the result of `operation`
    pub fn create_key(&self, operation: &Operation) -> CacheKey {
        operation.cache_key()
    }

    /// Read the cached value for `key`
    ///
    /// A miss, a stored `null` and a failed read all come back as `None`.
    pub fn read(&self, key: &CacheKey) -> Option<Value> {
        match self.store.read_query(key) {
            Ok(Some(Value::Null)) | Ok(None) => {
                if self.debug {
                    debug!(cache_key = %key, "Nothing cached for key");
                }
                None
            }
            Ok(Some(value)) => Some(value),
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Unable to read from cache");
                None
            }
        }
    }

    /// Write `data` under `key`; returns whether the store was written
    pub fn write(&self, key: &CacheKey, data: Value) -> bool {
        if self.read_only {
            if self.debug {
                debug!(cache_key = %key, data = %data, "Read-only: write suppressed");
            }
            return false;
        }

        let verify = self.debug.then(|| data.clone());
        match self.store.write_query(key, data) {
            Ok(()) => {
                if let Some(expected) = verify {
                    self.verify_write(key, &expected);
                }
                true
            }
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Unable to write to the cache");
                false
            }
        }
    }

    /// Run `batch` against a batching context and commit its writes as one unit
    ///
    /// Returns the number of writes committed to the store.
    pub fn perform_transaction<F>(&self, batch: F) -> usize
    where
        F: FnOnce(&mut Transaction<'_>),
    {
        let mut transaction = Transaction {
            adapter: self,
            writes: Vec::new(),
        };
        batch(&mut transaction);
        self.commit(transaction.writes)
    }

    fn commit(&self, writes: Vec<(CacheKey, Value)>) -> usize {
        if writes.is_empty() {
            return 0;
        }

        let count = writes.len();
        let verify = self.debug.then(|| writes.clone());
        if self.debug && !self.store.supports_transactions() {
            debug!(count, "Store has no native transactions, writing entries one by one");
        }

        match self.store.write_batch(writes) {
            Ok(()) => {
                for (key, expected) in verify.iter().flatten() {
                    self.verify_write(key, expected);
                }
                count
            }
            Err(e) => {
                warn!(count, error = %e, "Unable to write batch to the cache");
                0
            }
        }
    }

    /// Read a write back and compare it with what was sent
    fn verify_write(&self, key: &CacheKey, expected: &Value) {
        match self.store.read_query(key) {
            Ok(Some(ref written)) if written == expected => {
                debug!(cache_key = %key, data = %expected, "Updated the cache");
            }
            _ => {
                warn!(cache_key = %key, data = %expected, "Unable to write to the cache: read-back mismatch");
            }
        }
    }
}

/// Batching context handed out by [`CacheAdapter::perform_transaction`]
pub struct Transaction<'a> {
    adapter: &'a CacheAdapter,
    writes: Vec<(CacheKey, Value)>,
}

impl Transaction<'_> {
    /// Queue a write; suppressed in read-only mode
    pub fn write(&mut self, key: &CacheKey, data: Value) {
        if self.adapter.read_only {
            if self.adapter.debug {
                debug!(cache_key = %key, data = %data, "Read-only: write suppressed");
            }
            return;
        }
        self.writes.push((key.clone(), data));
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheError, MemoryCache};
    use parking_lot::Mutex;
    use serde_json::json;
    use wm_core::Document;

    /// Store that fails every access
    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn read_query(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
            Err(CacheError::Read { key: key.to_string(), reason: "offline".into() })
        }

        fn write_query(&self, key: &CacheKey, _data: Value) -> Result<(), CacheError> {
            Err(CacheError::Write { key: key.to_string(), reason: "offline".into() })
        }
    }

    /// Store without native transactions that records every single write
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<String>>,
    }

    impl CacheStore for RecordingStore {
        fn read_query(&self, _key: &CacheKey) -> Result<Option<Value>, CacheError> {
            Ok(None)
        }

        fn write_query(&self, key: &CacheKey, _data: Value) -> Result<(), CacheError> {
            self.writes.lock().push(key.query_name().to_string());
            Ok(())
        }
    }

    fn todos_key() -> CacheKey {
        Operation::new(Document::query("GetTodos"))
            .with_variables(json!({ "filter": "SHOW_ALL" }))
            .cache_key()
    }

    #[test]
    fn test_create_key_matches_operation() {
        let adapter = CacheAdapter::new(Arc::new(MemoryCache::new()), false, false);
        let operation = Operation::new(Document::query("GetTodos")).with_variables(json!({ "filter": "SHOW_ALL" }));
        assert_eq!(adapter.create_key(&operation), todos_key());
    }

    #[test]
    fn test_read_write() {
        let store = Arc::new(MemoryCache::new());
        let adapter = CacheAdapter::new(store.clone(), true, false);

        assert_eq!(adapter.read(&todos_key()), None);
        assert!(adapter.write(&todos_key(), json!({ "todos": [] })));
        assert_eq!(adapter.read(&todos_key()), Some(json!({ "todos": [] })));

        store.write_query(&todos_key(), Value::Null).unwrap();
        assert_eq!(adapter.read(&todos_key()), None);
    }

    #[test]
    fn test_store_failures_degrade() {
        let adapter = CacheAdapter::new(Arc::new(BrokenStore), true, false);
        assert_eq!(adapter.read(&todos_key()), None);
        assert!(!adapter.write(&todos_key(), json!(1)));
        assert_eq!(adapter.perform_transaction(|tx| tx.write(&todos_key(), json!(1))), 0);
    }

    #[test]
    fn test_read_only_leaves_store_untouched() {
        let store = Arc::new(MemoryCache::new());
        let adapter = CacheAdapter::new(store.clone(), true, true);

        assert!(!adapter.write(&todos_key(), json!({ "todos": [] })));
        let committed = adapter.perform_transaction(|tx| {
            tx.write(&todos_key(), json!({ "todos": [1] }));
            assert!(tx.is_empty());
        });

        assert_eq!(committed, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_transaction_commits_once() {
        let store = Arc::new(RecordingStore::default());
        let adapter = CacheAdapter::new(store.clone(), false, false);

        let committed = adapter.perform_transaction(|tx| {
            tx.write(&todos_key(), json!(1));
            tx.write(&todos_key(), json!(2));
            // nothing reaches the store until the batch returns
            assert!(store.writes.lock().is_empty());
        });

        assert_eq!(committed, 2);
        assert_eq!(*store.writes.lock(), vec!["GetTodos", "GetTodos"]);
    }
}
