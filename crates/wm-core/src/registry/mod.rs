//! Static mutation -> query -> update function configuration
//!
//! The map is supplied once at construction and validated as a whole; a
//! [`MutationRegistry`] is read-only for the lifetime of the engine.

use std::fmt;
use std::sync::Arc;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ConfigError;
use crate::operation::Variables;
use crate::result::ExecutionResult;

/// The mutation half of an update callback's context
#[derive(Debug, Clone, Copy)]
pub struct MutationInfo<'a> {
    pub name: &'a str,
    pub variables: &'a Variables,
    /// The mutation's result, or `{ data: prediction }` during an optimistic pass
    pub result: &'a ExecutionResult,
}

/// The query half of an update callback's context
#[derive(Debug, Clone, Copy)]
pub struct QueryInfo<'a> {
    pub name: &'a str,
    pub variables: &'a Variables,
    /// The value currently cached for this query instance
    pub result: &'a Value,
}

/// Everything an update callback gets to see
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub mutation: MutationInfo<'a>,
    pub query: QueryInfo<'a>,
}

/// Computes the new cached value for a query after a mutation
///
/// `Ok(None)` (or `Ok(Some(Value::Null))`) means there is nothing to write.
pub type UpdateFn =
    Arc<dyn Fn(&UpdateContext<'_>) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Caller-supplied configuration: mutation name -> query name -> update function
#[derive(Clone, Default)]
pub struct MutationQueryMap {
    entries: IndexMap<String, IndexMap<String, UpdateFn>>,
}

impl MutationQueryMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `update` to run for `query` whenever `mutation` settles
    pub fn watch<F>(mut self, mutation: &str, query: &str, update: F) -> Self
    where
        F: Fn(&UpdateContext<'_>) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.entries
            .entry(mutation.to_string())
            .or_default()
            .insert(query.to_string(), Arc::new(update));
        self
    }

    /// Set the whole query map for one mutation
    pub fn insert(mut self, mutation: &str, queries: IndexMap<String, UpdateFn>) -> Self {
        self.entries.insert(mutation.to_string(), queries);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MutationQueryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape: IndexMap<&str, Vec<&str>> = self
            .entries
            .iter()
            .map(|(mutation, queries)| {
                (mutation.as_str(), queries.keys().map(String::as_str).collect())
            })
            .collect();
        f.debug_struct("MutationQueryMap").field("entries", &shape).finish()
    }
}

fn skip_update(_: &UpdateContext<'_>) -> anyhow::Result<Option<Value>> {
    Ok(None)
}

/// Validated, read-only view of a [`MutationQueryMap`]
#[derive(Clone, Debug)]
pub struct MutationRegistry {
    map: MutationQueryMap,
}

impl MutationRegistry {
    /// Validate the whole map; nothing is registered if any entry is invalid
    pub fn new(map: MutationQueryMap) -> Result<Self, ConfigError> {
        for (mutation, queries) in &map.entries {
            if mutation.is_empty() {
                return Err(ConfigError::EmptyMutationName);
            }
            if queries.is_empty() {
                return Err(ConfigError::NoQueriesForMutation {
                    mutation: mutation.clone(),
                });
            }
            if queries.keys().any(String::is_empty) {
                return Err(ConfigError::EmptyQueryName {
                    mutation: mutation.clone(),
                });
            }
        }
        Ok(Self { map })
    }

    /// Whether `mutation` is a watched mutation
    pub fn is_watched(&self, mutation: &str) -> bool {
        self.map.entries.contains_key(mutation)
    }

    /// Query names affected by `mutation`, in registration order
    pub fn query_names(&self, mutation: &str) -> Vec<&str> {
        self.map
            .entries
            .get(mutation)
            .map(|queries| queries.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Update function for the pair, or a no-op when the pair is not registered
    pub fn update_fn(&self, mutation: &str, query: &str) -> UpdateFn {
        self.map
            .entries
            .get(mutation)
            .and_then(|queries| queries.get(query))
            .cloned()
            .unwrap_or_else(|| Arc::new(skip_update) as UpdateFn)
    }

    pub fn mutation_names(&self) -> Vec<&str> {
        self.map.entries.keys().map(String::as_str).collect()
    }

    /// Every query name targeted by any mutation (may repeat)
    pub fn all_query_names(&self) -> Vec<&str> {
        self.map
            .entries
            .values()
            .flat_map(|queries| queries.keys().map(String::as_str))
            .collect()
    }

    /// Whether any watched mutation affects `query`
    pub fn is_query_related(&self, query: &str) -> bool {
        self.map
            .entries
            .values()
            .any(|queries| queries.contains_key(query))
    }
}
