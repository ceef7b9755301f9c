use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

use crate::operation::{CacheKey, Variables};

/// Listener invoked with the trigger arguments and the event name
pub type Listener<A> = Arc<dyn Fn(&A, &str) + Send + Sync>;

/// Observer lists keyed by event name
///
/// Delivery is synchronous and in registration order. A panicking listener
/// is not caught: the panic unwinds into whoever called [`trigger`].
///
/// [`trigger`]: EventNotifier::trigger
pub struct EventNotifier<A> {
    listeners: Arc<Mutex<AHashMap<String, Vec<Listener<A>>>>>,
}

/// Lifecycle events emitted by the synchronization engine
pub mod names {
    /// Speculative results were written before the network round-trip
    pub const OPTIMISTIC_CACHE_UPDATE: &str = "optimisticCacheUpdate";

    /// Results were written after a watched mutation succeeded
    pub const CACHE_UPDATE: &str = "cacheUpdate";

    /// Speculative results were rolled back after a failed mutation
    pub const OPTIMISTIC_CACHE_REVERT: &str = "optimisticCacheRevert";
}

/// Payload delivered with every engine lifecycle event
#[derive(Debug, Clone)]
pub struct SyncEvent {
    /// Mutation that caused the event
    pub mutation: String,

    /// Variables the mutation was issued with
    pub variables: Variables,

    /// Cache entries written or restored
    pub keys: Vec<CacheKey>,
}

impl<A: 'static> EventNotifier<A> {
    /// Create a new notifier with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Register `listener` for every space-separated name in `events`
    pub fn on(&self, events: &str, listener: Listener<A>) {
        let mut listeners = self.listeners.lock();
        for event in events.split_whitespace() {
            listeners
                .entry(event.to_string())
                .or_insert_with(Vec::new)
                .push(listener.clone());
        }
    }

    /// Remove `listener` from every space-separated name in `events`
    pub fn off(&self, events: &str, listener: &Listener<A>) {
        let mut listeners = self.listeners.lock();
        for event in events.split_whitespace() {
            if let Some(registered) = listeners.get_mut(event) {
                registered.retain(|l| !std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
                if registered.is_empty() {
                    listeners.remove(event);
                }
            }
        }
    }

    /// Invoke every listener registered for `event`
    pub fn trigger(&self, event: &str, args: &A) {
        // Snapshot the list so listeners may call on/off while being notified
        let registered = match self.listeners.lock().get(event) {
            Some(registered) => registered.clone(),
            None => return,
        };

        for listener in registered {
            listener(args, event);
        }
    }

    /// Number of listeners registered for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map(Vec::len).unwrap_or(0)
    }
}

impl<A: 'static> Default for EventNotifier<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a listener from a closure
pub fn listener_from_fn<A, F>(f: F) -> Listener<A>
where
    F: Fn(&A, &str) + Send + Sync + 'static,
{
    Arc::new(f)
}
