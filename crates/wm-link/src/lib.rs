//! Request pipeline and the watched-mutation synchronization link
//!
//! [`WatchedMutationLink`] sits in a chain of [`Link`]s. It watches query
//! results go by, remembers which query instances were fetched, and when a
//! watched mutation succeeds it runs the caller's update functions against
//! every cached instance of the affected queries. Mutations carrying an
//! optimistic prediction are applied before the network round-trip and
//! rolled back if the mutation fails.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wm_core::MutationQueryMap;
//! use wm_data::MemoryCache;
//! use wm_link::{LinkChain, SyncOptions, WatchedMutationLink};
//!
//! let map = MutationQueryMap::new().watch("AddTodo", "GetTodos", |ctx| {
//!     // merge ctx.mutation.result into ctx.query.result
//!     Ok(None)
//! });
//! let watched = WatchedMutationLink::new(
//!     SyncOptions::new().with_cache(Arc::new(MemoryCache::new())).with_map(map),
//! )?;
//! let chain = LinkChain::new(vec![Arc::new(watched), Arc::new(transport_link)]);
//! ```

pub mod config;
pub mod link;
pub mod sync;

use thiserror::Error;

pub use config::{LinkSettings, SyncConfig, SyncOptions};
pub use link::{execute, FnLink, Link, LinkChain, NextLink, ResultStream, Transport, TransportLink};
pub use sync::{Classification, WatchedMutationLink};

/// Errors travelling on the pipeline's error channel
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("network error: {0}")]
    Network(String),

    #[error("update function for mutation '{mutation}' and query '{query}' failed: {source}")]
    UpdateCallback {
        mutation: String,
        query: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}
