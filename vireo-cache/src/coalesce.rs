//! Optional in-flight request coalescing.
//!
//! The engine performs no single-flight deduplication: concurrent fetches
//! over overlapping id sets may each load the same id from the source, and
//! loaders are required to tolerate that. For the rare loader whose source
//! query is expensive enough to protect, a [`FlightGroup`] can wrap the hot
//! path and collapse concurrent loads of one id into a single execution.
//!
//! This is an extension, not part of the read path: nothing in
//! [`MultiGetCache`] uses it.
//!
//! [`MultiGetCache`]: crate::multi::MultiGetCache

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, OnceCell};
use vireo_core::VireoResult;

use crate::traits::CacheId;

/// Coalesces concurrent executions keyed by id.
///
/// Only concurrency is deduplicated: once every caller of a flight has
/// received its value the slot is released, and the next call executes
/// again. Caching completed values is the cache engine's job, not this
/// type's.
pub struct FlightGroup<K, V>
where
    K: CacheId,
    V: Clone + Send + Sync + 'static,
{
    inflight: Mutex<HashMap<K, Weak<OnceCell<V>>>>,
}

impl<K, V> Default for FlightGroup<K, V>
where
    K: CacheId,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FlightGroup<K, V>
where
    K: CacheId,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty group.
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `load` for `id`, joining an in-flight execution if one exists.
    ///
    /// If another caller is already loading this id, the current caller
    /// waits for that execution and receives a clone of its value. A failed
    /// execution leaves the slot empty, so one of the waiting callers (or
    /// the next caller) runs its own `load`.
    pub async fn run<F, Fut>(&self, id: &K, load: F) -> VireoResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VireoResult<V>>,
    {
        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight.retain(|_, slot| slot.strong_count() > 0);
            match inflight.get(id).and_then(Weak::upgrade) {
                Some(cell) => cell,
                None => {
                    let cell = Arc::new(OnceCell::new());
                    inflight.insert(id.clone(), Arc::downgrade(&cell));
                    cell
                }
            }
        };

        cell.get_or_try_init(load).await.map(V::clone)
    }
}
