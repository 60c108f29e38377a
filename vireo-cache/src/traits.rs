//! Cache engine traits: id and value bounds, backend contract, source loader.
//!
//! The engine is generic over these traits rather than over concrete cache
//! types. A per-entity cache supplies an id type, a value type, and a
//! [`SourceLoader`]; the backend is whichever [`CacheBackend`] the provider
//! wiring hands it. Forgetting to supply any of them is a compile error,
//! not a runtime "not implemented" failure.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use vireo_core::VireoResult;

/// Domain identifier usable as a cache map key.
///
/// `Display` supplies the id's key segment, so key building stays a pure
/// function of (key space, id).
pub trait CacheId: Clone + Eq + Hash + Display + Send + Sync + 'static {
    /// Case-folded form of this id, if one exists and differs.
    ///
    /// Loader responses are consulted under the exact id first, then under
    /// this form. Compatibility behavior for loaders that key their
    /// responses by lowercased identifiers; ids with no textual case
    /// return `None`.
    fn case_folded(&self) -> Option<Self> {
        None
    }
}

impl CacheId for String {
    fn case_folded(&self) -> Option<Self> {
        let folded = self.to_lowercase();
        (folded != *self).then_some(folded)
    }
}

impl CacheId for Uuid {}
impl CacheId for u32 {}
impl CacheId for u64 {}
impl CacheId for i64 {}

/// Value stored by the cache.
///
/// `Default` supplies the placeholder written for ids the source knows
/// nothing about, so repeated lookups of absent ids stay cheap.
pub trait CacheEntry:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> CacheEntry for T where
    T: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Key/value backend contract.
///
/// Two interchangeable families exist: the distributed store shared by all
/// app servers and the in-process store ([`MemoryBackend`]). Both speak
/// JSON strings; serialization is the engine's job, not the backend's.
///
/// Implementations should be cheap to share (`Arc<dyn CacheBackend>`) and
/// must tolerate concurrent callers.
///
/// [`MemoryBackend`]: crate::memory_backend::MemoryBackend
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Fetch many keys at once.
    ///
    /// Keys with no live entry are simply absent from the returned map;
    /// that is a miss, not an error. Errors mean the backend itself could
    /// not be consulted.
    async fn multi_get(&self, keys: &[String]) -> VireoResult<HashMap<String, String>>;

    /// Store one serialized entry under `key` for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> VireoResult<()>;

    /// Delete one key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> VireoResult<()>;

    /// Get backend statistics.
    async fn stats(&self) -> VireoResult<CacheStats>;
}

/// Source-of-truth loader supplied by each concrete cache type.
///
/// Given a batch of miss ids, return authoritative values keyed by id. Ids
/// with no authoritative value are simply absent from the map. Loaders must
/// tolerate duplicate concurrent invocation: the engine performs no
/// single-flight deduplication across overlapping fetches.
#[async_trait]
pub trait SourceLoader<K: CacheId, V: CacheEntry>: Send + Sync + 'static {
    async fn load(&self, ids: &[K]) -> VireoResult<HashMap<K, V>>;
}

/// Statistics about backend usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in the backend.
    pub entry_count: u64,
    /// Approximate memory usage in bytes.
    pub memory_bytes: u64,
    /// Number of entries removed by expiry.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_string_id_case_folds() {
        let id = "User-7".to_string();
        assert_eq!(id.case_folded(), Some("user-7".to_string()));
    }

    #[test]
    fn test_lowercase_string_id_has_no_fold() {
        let id = "user-7".to_string();
        assert_eq!(id.case_folded(), None);
    }

    #[test]
    fn test_numeric_ids_have_no_fold() {
        assert_eq!(42u64.case_folded(), None);
        assert_eq!((-3i64).case_folded(), None);
        assert_eq!(Uuid::nil().case_folded(), None);
    }
}
