//! Multi-key cache-aside engine.
//!
//! This module implements the core retrieval logic: chunked backend reads,
//! degradation of backend failures to source loads, bounded source
//! batches, and detached write-back.
//!
//! # Failure Policy
//!
//! A flaky cache must never make a feature unavailable. Backend read
//! failures only cost latency: every id in a failed chunk is loaded from
//! the source instead. Backend write failures are reported through the
//! error-log collaborator and dropped. Only a source-of-truth failure
//! fails the caller, because then there is nothing correct to return.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use vireo_core::{
    BackendError, CacheDefaults, ConfigError, ErrorReporter, Severity, TracingReporter,
    VireoError, VireoResult,
};

use crate::keys::{KeyMap, KeySpace};
use crate::traits::{CacheBackend, CacheEntry, CacheId, SourceLoader};

/// Hard ceiling on keys per backend `multi_get`.
pub const READ_BATCH: usize = 500;

/// Hard ceiling on ids per source load.
pub const SOURCE_BATCH: usize = 50;

/// Immutable description of one logical fetch.
///
/// Replaces mutable staged construction: everything the engine needs is
/// fixed here before the engine exists, and validated once.
#[derive(Debug, Clone)]
pub struct CachePlan<K: CacheId> {
    ids: Vec<K>,
    space: KeySpace,
    ttl: Duration,
}

impl<K: CacheId> CachePlan<K> {
    /// Create a plan for the given key space and requested ids, with the
    /// default TTL.
    pub fn new(space: KeySpace, ids: Vec<K>) -> Self {
        Self {
            ids,
            space,
            ttl: CacheDefaults::default().default_ttl,
        }
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Get the requested ids.
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    /// Get the key space.
    pub fn space(&self) -> &KeySpace {
        &self.space
    }

    /// Get the entry TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Validate the plan. The TTL must be positive.
    pub fn validate(&self) -> VireoResult<()> {
        if self.ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "ttl".to_string(),
                value: format!("{:?}", self.ttl),
                reason: "ttl must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Multi-key cache-aside engine.
///
/// Constructed per logical fetch from a [`CachePlan`], an injected backend,
/// and the cache type's source loader. The key directory is built once at
/// construction and never mutated.
///
/// # Type Parameters
///
/// - `K`: domain id type
/// - `V`: cached value type; `V::default()` is the placeholder for ids the
///   source knows nothing about
/// - `B`: backend provider (`?Sized`, so `Arc<dyn CacheBackend>` works)
/// - `L`: source-of-truth loader
///
/// # Example
///
/// ```ignore
/// let plan = CachePlan::new(KeySpace::new("user", "v1"), user_ids)
///     .with_ttl(Duration::from_secs(600));
/// let cache = MultiGetCache::new(plan, backend, loader)?;
///
/// let users = cache.fetch().await?; // one entry per requested id
/// ```
pub struct MultiGetCache<K, V, B, L>
where
    K: CacheId,
    V: CacheEntry,
    B: CacheBackend + ?Sized,
    L: SourceLoader<K, V> + ?Sized,
{
    backend: Arc<B>,
    loader: Arc<L>,
    reporter: Arc<dyn ErrorReporter>,
    key_map: KeyMap<K>,
    ttl: Duration,
    _entry: PhantomData<fn() -> V>,
}

impl<K, V, B, L> MultiGetCache<K, V, B, L>
where
    K: CacheId,
    V: CacheEntry,
    B: CacheBackend + ?Sized,
    L: SourceLoader<K, V> + ?Sized,
{
    /// Create an engine with the default `tracing`-backed reporter.
    pub fn new(plan: CachePlan<K>, backend: Arc<B>, loader: Arc<L>) -> VireoResult<Self> {
        Self::with_reporter(plan, backend, loader, Arc::new(TracingReporter))
    }

    /// Create an engine with an explicit error reporter.
    pub fn with_reporter(
        plan: CachePlan<K>,
        backend: Arc<B>,
        loader: Arc<L>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> VireoResult<Self> {
        plan.validate()?;
        let key_map = KeyMap::build(plan.space(), plan.ids());
        if key_map.is_empty() {
            tracing::warn!(
                namespace = plan.space().namespace(),
                "cache plan built with no ids"
            );
        }
        Ok(Self {
            backend,
            loader,
            reporter,
            key_map,
            ttl: plan.ttl(),
            _entry: PhantomData,
        })
    }

    /// Number of distinct ids this engine will fetch.
    pub fn len(&self) -> usize {
        self.key_map.len()
    }

    /// True when the plan carried no ids.
    pub fn is_empty(&self) -> bool {
        self.key_map.is_empty()
    }

    /// Fetch every requested id, reading through the cache.
    ///
    /// Returns exactly one entry per distinct requested id: the cached
    /// value on a hit, the loaded value on a miss, `V::default()` when the
    /// source has nothing. Newly-loaded entries (placeholders included) are
    /// written back on detached tasks; the returned map never waits on
    /// them.
    pub async fn fetch(&self) -> VireoResult<HashMap<K, V>> {
        if self.key_map.is_empty() {
            tracing::warn!("fetch invoked with an empty key set");
            return Ok(HashMap::new());
        }

        let mut result: HashMap<K, V> = HashMap::with_capacity(self.key_map.len());
        let mut misses: Vec<K> = Vec::new();

        for chunk in self.key_map.backend_keys().chunks(READ_BATCH) {
            match self.backend.multi_get(chunk).await {
                Ok(found) => {
                    for key in chunk {
                        let Some(id) = self.key_map.id_of(key.as_str()) else {
                            continue;
                        };
                        match found.get(key) {
                            Some(raw) => match serde_json::from_str::<V>(raw) {
                                Ok(value) => {
                                    result.insert(id.clone(), value);
                                }
                                Err(error) => {
                                    tracing::debug!(
                                        key = %key,
                                        error = %error,
                                        "cached entry failed to decode, treating as miss"
                                    );
                                    misses.push(id.clone());
                                }
                            },
                            None => misses.push(id.clone()),
                        }
                    }
                }
                Err(error) => {
                    // Degrade the whole chunk to the source rather than
                    // surfacing a backend failure to the caller.
                    tracing::warn!(
                        keys = chunk.len(),
                        error = %error,
                        "multi_get failed, loading chunk from source"
                    );
                    misses.extend(
                        chunk
                            .iter()
                            .filter_map(|key| self.key_map.id_of(key.as_str()))
                            .cloned(),
                    );
                }
            }
        }

        for batch in misses.chunks(SOURCE_BATCH) {
            let loaded = self.loader.load(batch).await?;
            for id in batch {
                let value = loaded
                    .get(id)
                    .cloned()
                    .or_else(|| id.case_folded().and_then(|folded| loaded.get(&folded).cloned()))
                    .unwrap_or_default();
                self.write_back(id, &value);
                result.insert(id.clone(), value);
            }
        }

        tracing::debug!(
            requested = self.key_map.len(),
            loaded = misses.len(),
            "multi-key fetch complete"
        );
        Ok(result)
    }

    /// Delete every key in this engine's key directory.
    ///
    /// All deletions are issued concurrently and awaited together;
    /// individual outcomes are not distinguished (best-effort
    /// invalidation).
    pub async fn clear(&self) -> VireoResult<()> {
        let deletions = self.key_map.backend_keys().iter().map(|key| {
            let backend = Arc::clone(&self.backend);
            async move {
                let _ = backend.del(key).await;
            }
        });
        join_all(deletions).await;
        Ok(())
    }

    /// Persist one resolved miss on a detached task.
    ///
    /// The value is serialized from the already-resolved entry; nothing on
    /// this path can alter what the caller receives, and the read path
    /// never waits on the spawned write.
    fn write_back(&self, id: &K, value: &V) {
        let Some(key) = self.key_map.key_of(id) else {
            return;
        };
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(error) => {
                let error: VireoError = BackendError::Serialization {
                    reason: error.to_string(),
                }
                .into();
                self.reporter.report(&error, Severity::Medium);
                tracing::error!(key = %key, error = %error, "cache entry failed to serialize");
                return;
            }
        };

        let backend = Arc::clone(&self.backend);
        let reporter = Arc::clone(&self.reporter);
        let key = key.to_string();
        let ttl = self.ttl;
        tokio::spawn(async move {
            if let Err(error) = backend.set(&key, payload, ttl).await {
                reporter.report(&error, Severity::Medium);
                tracing::error!(key = %key, error = %error, "cache write-back failed");
            }
        });
    }
}
