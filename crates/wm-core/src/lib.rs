//! Core types for the watched-mutation cache synchronization engine
//!
//! This crate provides the operation model, cache keys, the static
//! mutation -> query registry and the event notifier shared by the
//! storage and pipeline crates.

pub mod classify;
pub mod error;
pub mod events;
pub mod operation;
pub mod registry;
pub mod result;

// Re-export commonly used types
pub use error::ConfigError;
pub use events::{EventNotifier, Listener, SyncEvent};
pub use operation::{CacheKey, Document, Operation, OperationContext, OperationKind, Variables};
pub use registry::{
    MutationInfo, MutationQueryMap, MutationRegistry, QueryInfo, UpdateContext, UpdateFn,
};
pub use result::{ExecutionResult, ResponseError};
