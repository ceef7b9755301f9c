//! Cache access and engine-owned registries
//!
//! The external cache is reached only through the narrow [`CacheStore`]
//! contract. Everything else in this crate is private, per-engine state.

pub mod cache;
pub mod index;
pub mod memory;
pub mod snapshot;

use serde_json::Value;
use thiserror::Error;
use wm_core::CacheKey;

// Re-exports
pub use cache::{CacheAdapter, Transaction};
pub use index::QueryKeyTracker;
pub use memory::MemoryCache;
pub use snapshot::OptimisticSnapshotStore;

/// Errors an external cache may report
///
/// These never leave the [`CacheAdapter`]: they are logged and the access
/// degrades to a miss or a skipped write.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("read failed for {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("write failed for {key}: {reason}")]
    Write { key: String, reason: String },

    #[error("transaction failed: {0}")]
    Transaction(String),
}

/// Read/write contract of the external key-addressed cache
pub trait CacheStore: Send + Sync {
    /// Read the value stored under `key`; a miss is `Ok(None)`
    fn read_query(&self, key: &CacheKey) -> Result<Option<Value>, CacheError>;

    /// Store `data` under `key`
    fn write_query(&self, key: &CacheKey, data: Value) -> Result<(), CacheError>;

    /// Apply several writes as one unit
    ///
    /// Stores without native transactions fall back to writing one entry at
    /// a time, which observers may see partially applied.
    fn write_batch(&self, writes: Vec<(CacheKey, Value)>) -> Result<(), CacheError> {
        for (key, data) in writes {
            self.write_query(&key, data)?;
        }
        Ok(())
    }

    /// Whether [`write_batch`](CacheStore::write_batch) is atomic
    fn supports_transactions(&self) -> bool {
        false
    }
}
