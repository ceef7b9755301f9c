//! Synchronization of cached query results with watched mutations

use std::sync::Arc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::debug;
use wm_core::classify::{is_mutation, is_optimistic, is_query};
use wm_core::events::names;
use wm_core::{
    CacheKey, ConfigError, EventNotifier, ExecutionResult, Listener, MutationInfo,
    MutationQueryMap, MutationRegistry, Operation, QueryInfo, SyncEvent, UpdateContext,
};
use wm_data::{CacheAdapter, CacheStore, OptimisticSnapshotStore, QueryKeyTracker};

use crate::config::{SyncConfig, SyncOptions};
use crate::link::{once, Link, NextLink, ResultStream};
use crate::LinkError;


/// What the engine does with one observed (operation, outcome) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Successful query that some watched mutation targets: track its key
    RelatedQuery,
    /// Watched optimistic mutation succeeded: keep the speculative writes
    OptimisticSettle,
    /// Watched mutation succeeded: run the update pass
    UpdatePass,
    /// Watched optimistic mutation failed: restore the snapshots
    OptimisticRevert,
    /// Not ours; passed along untouched
    PassThrough,
}

/// Link that keeps cached query results consistent with watched mutations
#[derive(Clone)]
pub struct WatchedMutationLink {
    state: Arc<SyncState>,
}

/// Per-engine state; nothing here is shared across engine instances
struct SyncState {
    registry: MutationRegistry,
    cache: CacheAdapter,
    tracker: QueryKeyTracker,
    snapshots: OptimisticSnapshotStore,
    notifier: EventNotifier<SyncEvent>,
    debug: bool,
}

impl WatchedMutationLink {
    /// Construct from the options object
    pub fn new(options: SyncOptions) -> Result<Self, ConfigError> {
        Ok(Self::from_config(options.normalize()?))
    }

    /// Construct from positional arguments
    pub fn from_positional(
        cache: Arc<dyn CacheStore>,
        map: MutationQueryMap,
        debug: bool,
        read_only: bool,
    ) -> Result<Self, ConfigError> {
        Self::new(SyncOptions::from_positional(cache, map, debug, read_only))
    }

    /// Construct from an already validated configuration
    pub fn from_config(config: SyncConfig) -> Self {
        let SyncConfig {
            cache,
            registry,
            settings,
        } = config;

        if settings.debug {
            debug!(
                watched_mutations = ?registry.mutation_names(),
                read_only = settings.read_only,
                "Constructed watched mutation link"
            );
        }

        Self {
            state: Arc::new(SyncState {
                registry,
                cache: CacheAdapter::new(cache, settings.debug, settings.read_only),
                tracker: QueryKeyTracker::new(),
                snapshots: OptimisticSnapshotStore::new(),
                notifier: EventNotifier::new(),
                debug: settings.debug,
            }),
        }
    }

    /// Listen for one or more space-separated lifecycle events
    pub fn on(&self, events: &str, listener: Listener<SyncEvent>) {
        self.state.notifier.on(events, listener);
    }

    pub fn off(&self, events: &str, listener: &Listener<SyncEvent>) {
        self.state.notifier.off(events, listener);
    }

    /// Decide how an observed outcome is handled
    pub fn classify(
        &self,
        operation: &Operation,
        outcome: &Result<ExecutionResult, LinkError>,
    ) -> Classification {
        self.state.classify(operation, outcome)
    }

    pub fn registry(&self) -> &MutationRegistry {
        &self.state.registry
    }

    pub fn tracker(&self) -> &QueryKeyTracker {
        &self.state.tracker
    }

    pub fn snapshots(&self) -> &OptimisticSnapshotStore {
        &self.state.snapshots
    }
}

impl Link for WatchedMutationLink {
    fn request(&self, operation: Operation, forward: NextLink) -> ResultStream {
        let state = self.state.clone();

        // The optimistic pass completes before anything is sent downstream
        if state.is_watched_optimistic(&operation) {
            if let Err(e) = state.optimistic_pass(&operation) {
                return once(Err(e));
            }
        }

        forward(operation.clone())
            .flat_map(move |outcome| {
                let follow_up = state.observe(&operation, &outcome);
                let mut items = vec![outcome];
                if let Err(e) = follow_up {
                    items.push(Err(e));
                }
                stream::iter(items)
            })
            .boxed()
    }
}

impl SyncState {
    fn classify(
        &self,
        operation: &Operation,
        outcome: &Result<ExecutionResult, LinkError>,
    ) -> Classification {
        let kind = operation.kind();
        let name = operation.name();
        let succeeded = matches!(outcome, Ok(result) if result.is_successful());
        let optimistic = is_optimistic(&operation.context);

        if is_query(kind) && succeeded && self.registry.is_query_related(name) {
            return Classification::RelatedQuery;
        }
        if is_mutation(kind) && self.registry.is_watched(name) {
            match (succeeded, optimistic) {
                (true, true) => return Classification::OptimisticSettle,
                (true, false) => return Classification::UpdatePass,
                (false, true) => return Classification::OptimisticRevert,
                (false, false) => {}
            }
        }
        Classification::PassThrough
    }

    fn is_watched_optimistic(&self, operation: &Operation) -> bool {
        is_mutation(operation.kind())
            && is_optimistic(&operation.context)
            && self.registry.is_watched(operation.name())
    }

    /// React to one outcome; an `Err` is a callback failure to surface
    fn observe(
        &self,
        operation: &Operation,
        outcome: &Result<ExecutionResult, LinkError>,
    ) -> Result<(), LinkError> {
        match (self.classify(operation, outcome), outcome) {
            (Classification::RelatedQuery, _) => self.add_related_query(operation),
            (Classification::OptimisticSettle, _) => self.settle(operation),
            (Classification::UpdatePass, Ok(result)) => {
                let written = self.update_pass(operation, result)?;
                self.notify(names::CACHE_UPDATE, operation, written);
            }
            (Classification::OptimisticRevert, _) => self.revert_pass(operation),
            _ => {}
        }
        Ok(())
    }

    fn add_related_query(&self, operation: &Operation) {
        if self.debug {
            debug!(query = operation.name(), "Found a successful query related to a watched mutation");
        }
        self.tracker
            .add_query(operation.name(), self.cache.create_key(operation));
    }

    /// Every tracked key for every query the mutation affects
    fn related_keys(&self, mutation: &str) -> Vec<CacheKey> {
        self.tracker.keys_for(&self.registry.query_names(mutation))
    }

    /// Run the update functions for every tracked instance of the affected
    /// queries and commit the results in one transaction
    ///
    /// Returns the keys committed to the cache, empty when the batch was
    /// suppressed or failed. The first callback error aborts the pass and
    /// nothing is written.
    fn update_pass(
        &self,
        operation: &Operation,
        mutation_result: &ExecutionResult,
    ) -> Result<Vec<CacheKey>, LinkError> {
        let mutation = operation.name();
        let mut queued: Vec<(CacheKey, Value)> = Vec::new();

        for query in self.registry.query_names(mutation) {
            let update = self.registry.update_fn(mutation, query);

            for key in self.tracker.get_keys(query) {
                let cached = match self.cache.read(&key) {
                    Some(cached) => cached,
                    None => {
                        // invalidated outside the engine; stop tracking it
                        if self.debug {
                            debug!(cache_key = %key, "Dropping stale query key");
                        }
                        self.tracker.remove_query(query, &key);
                        continue;
                    }
                };

                if self.debug {
                    debug!(mutation, cache_key = %key, "Invoking update function for related cached query");
                }
                let ctx = UpdateContext {
                    mutation: MutationInfo {
                        name: mutation,
                        variables: &operation.variables,
                        result: mutation_result,
                    },
                    query: QueryInfo {
                        name: query,
                        variables: key.variables(),
                        result: &cached,
                    },
                };

                match update(&ctx) {
                    Ok(Some(value)) if !value.is_null() => queued.push((key, value)),
                    Ok(_) => {
                        if self.debug {
                            debug!(cache_key = %key, "Update function returned nothing to write");
                        }
                    }
                    Err(source) => {
                        return Err(LinkError::UpdateCallback {
                            mutation: mutation.to_string(),
                            query: query.to_string(),
                            source,
                        });
                    }
                }
            }
        }

        let keys: Vec<CacheKey> = queued.iter().map(|(key, _)| key.clone()).collect();
        let committed = self.cache.perform_transaction(|tx| {
            for (key, value) in queued {
                tx.write(&key, value);
            }
        });
        if committed == 0 {
            return Ok(Vec::new());
        }
        Ok(keys)
    }

    /// Snapshot every related key, then apply the prediction as if the
    /// mutation had already returned `{ data: prediction }`
    fn optimistic_pass(&self, operation: &Operation) -> Result<(), LinkError> {
        let prediction = match &operation.context.optimistic_response {
            Some(prediction) => prediction.clone(),
            None => return Ok(()),
        };

        let keys = self.related_keys(operation.name());
        for key in &keys {
            self.snapshots.set(key, self.cache.read(key));
        }

        match self.update_pass(operation, &ExecutionResult::data(prediction)) {
            Ok(written) => {
                self.notify(names::OPTIMISTIC_CACHE_UPDATE, operation, written);
                Ok(())
            }
            Err(e) => {
                for key in &keys {
                    self.snapshots.clear(key);
                }
                Err(e)
            }
        }
    }

    /// The speculative writes stand; drop their snapshots
    fn settle(&self, operation: &Operation) {
        for key in self.related_keys(operation.name()) {
            self.snapshots.clear(&key);
        }
    }

    /// Write every held snapshot back and clear all related slots
    fn revert_pass(&self, operation: &Operation) {
        let mut restored = Vec::new();
        for key in self.related_keys(operation.name()) {
            if let Some(prior) = self.snapshots.get(&key) {
                if self.cache.write(&key, prior) {
                    restored.push(key.clone());
                }
            }
            self.snapshots.clear(&key);
        }
        self.notify(names::OPTIMISTIC_CACHE_REVERT, operation, restored);
    }

    /// Trigger `event` unless no key was written
    fn notify(&self, event: &str, operation: &Operation, keys: Vec<CacheKey>) {
        if keys.is_empty() {
            return;
        }
        let payload = SyncEvent {
            mutation: operation.name().to_string(),
            variables: operation.variables.clone(),
            keys,
        };
        self.notifier.trigger(event, &payload);
    }
}
