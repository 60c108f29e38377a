//! Single-key sibling of the multi-key engine.
//!
//! Most cache types fetch many ids at once; a handful (current user,
//! platform settings, a single channel page) only ever want one. This
//! wrapper keeps their call sites honest about that while reusing the
//! multi-key read path unchanged: same key directory, same failure policy,
//! same detached write-back.

use std::collections::HashMap;
use std::sync::Arc;

use vireo_core::{ErrorReporter, VireoResult};

use crate::keys::KeySpace;
use crate::multi::{CachePlan, MultiGetCache};
use crate::traits::{CacheBackend, CacheEntry, CacheId, SourceLoader};

/// Cache-aside engine for exactly one id.
pub struct SingleGetCache<K, V, B, L>
where
    K: CacheId,
    V: CacheEntry,
    B: CacheBackend + ?Sized,
    L: SourceLoader<K, V> + ?Sized,
{
    inner: MultiGetCache<K, V, B, L>,
    id: K,
}

impl<K, V, B, L> SingleGetCache<K, V, B, L>
where
    K: CacheId,
    V: CacheEntry,
    B: CacheBackend + ?Sized,
    L: SourceLoader<K, V> + ?Sized,
{
    /// Create an engine for one id with the default reporter.
    pub fn new(plan: CachePlan<K>, id: K, backend: Arc<B>, loader: Arc<L>) -> VireoResult<Self> {
        Ok(Self {
            inner: MultiGetCache::new(plan, backend, loader)?,
            id,
        })
    }

    /// Create an engine for one id with an explicit error reporter.
    pub fn with_reporter(
        plan: CachePlan<K>,
        id: K,
        backend: Arc<B>,
        loader: Arc<L>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> VireoResult<Self> {
        Ok(Self {
            inner: MultiGetCache::with_reporter(plan, backend, loader, reporter)?,
            id,
        })
    }

    /// Convenience constructor: builds the one-id plan itself.
    pub fn for_id(space: KeySpace, id: K, backend: Arc<B>, loader: Arc<L>) -> VireoResult<Self> {
        let plan = CachePlan::new(space, vec![id.clone()]);
        Self::new(plan, id, backend, loader)
    }

    /// Fetch the value, reading through the cache.
    ///
    /// Returns `V::default()` when the source has nothing for this id,
    /// matching the multi-key completeness contract.
    pub async fn fetch_one(&self) -> VireoResult<V> {
        let mut result: HashMap<K, V> = self.inner.fetch().await?;
        Ok(result.remove(&self.id).unwrap_or_default())
    }

    /// Delete this id's key.
    pub async fn clear(&self) -> VireoResult<()> {
        self.inner.clear().await
    }
}
