//! In-process cache backend with per-entry expiry.
//!
//! Backs the `InProcess` provider slots. Entries carry an absolute expiry
//! timestamp; reads treat an expired entry as a miss and `purge_expired`
//! reclaims the space. Statistics are tracked the same way for both
//! backend families so dashboards can compare them.
//!
//! # Thread Safety
//!
//! A single `RwLock` guards the entry map: shared read transactions for
//! `multi_get`, exclusive ones for `set`, `del`, and purging. Poisoning of
//! the data lock surfaces as `BackendError::LockPoisoned`; poisoning of the
//! statistics lock only loses counters.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vireo_core::{BackendError, VireoResult};

use crate::traits::{CacheBackend, CacheStats};

/// One stored entry: serialized value plus absolute expiry.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process key/value store with TTL semantics.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, StoredEntry>>,
    stats: RwLock<CacheStats>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_reads(&self, hits: u64, misses: u64) {
        if let Ok(mut stats) = self.stats.write() {
            stats.hits += hits;
            stats.misses += misses;
        }
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> VireoResult<u64> {
        let now = Utc::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| BackendError::LockPoisoned)?;

        let before = entries.len() as u64;
        entries.retain(|_, entry| entry.expires_at > now);
        let purged = before - entries.len() as u64;
        drop(entries);

        if let Ok(mut stats) = self.stats.write() {
            stats.entry_count = stats.entry_count.saturating_sub(purged);
            stats.evictions += purged;
        }

        Ok(purged)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn multi_get(&self, keys: &[String]) -> VireoResult<HashMap<String, String>> {
        let now = Utc::now();
        let entries = self
            .entries
            .read()
            .map_err(|_| BackendError::LockPoisoned)?;

        let mut found = HashMap::new();
        let mut misses = 0u64;
        for key in keys {
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => {
                    found.insert(key.clone(), entry.value.clone());
                }
                _ => misses += 1,
            }
        }
        drop(entries);

        self.record_reads(found.len() as u64, misses);
        Ok(found)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> VireoResult<()> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| BackendError::OperationFailed {
            op: "set",
            reason: e.to_string(),
        })?;
        let entry = StoredEntry {
            value,
            expires_at: Utc::now() + ttl,
        };
        let size = key.len() + entry.value.len();

        let mut entries = self
            .entries
            .write()
            .map_err(|_| BackendError::LockPoisoned)?;
        let is_new = entries.insert(key.to_string(), entry).is_none();
        drop(entries);

        if let Ok(mut stats) = self.stats.write() {
            if is_new {
                stats.entry_count += 1;
            }
            stats.memory_bytes += size as u64;
        }

        Ok(())
    }

    async fn del(&self, key: &str) -> VireoResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| BackendError::LockPoisoned)?;
        let removed = entries.remove(key).is_some();
        drop(entries);

        if removed {
            if let Ok(mut stats) = self.stats.write() {
                stats.entry_count = stats.entry_count.saturating_sub(1);
            }
        }

        Ok(())
    }

    async fn stats(&self) -> VireoResult<CacheStats> {
        Ok(self
            .stats
            .read()
            .map(|s| s.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_set_and_multi_get() {
        let backend = MemoryBackend::new();

        backend
            .set("k1", "\"a\"".to_string(), HOUR)
            .await
            .expect("set should succeed");

        let found = backend
            .multi_get(&keys(&["k1", "k2"]))
            .await
            .expect("multi_get should succeed");

        assert_eq!(found.len(), 1);
        assert_eq!(found.get("k1").map(String::as_str), Some("\"a\""));
        assert!(!found.contains_key("k2"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let backend = MemoryBackend::new();

        backend
            .set("k1", "\"a\"".to_string(), Duration::ZERO)
            .await
            .expect("set should succeed");

        let found = backend
            .multi_get(&keys(&["k1"]))
            .await
            .expect("multi_get should succeed");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_del_removes_entry() {
        let backend = MemoryBackend::new();

        backend
            .set("k1", "\"a\"".to_string(), HOUR)
            .await
            .expect("set should succeed");
        backend.del("k1").await.expect("del should succeed");

        let found = backend
            .multi_get(&keys(&["k1"]))
            .await
            .expect("multi_get should succeed");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_del_of_absent_key_is_ok() {
        let backend = MemoryBackend::new();
        backend.del("nope").await.expect("del should succeed");
    }

    #[tokio::test]
    async fn test_overwrite_keeps_latest() {
        let backend = MemoryBackend::new();

        backend
            .set("k1", "\"old\"".to_string(), HOUR)
            .await
            .expect("set should succeed");
        backend
            .set("k1", "\"new\"".to_string(), HOUR)
            .await
            .expect("set should succeed");

        let found = backend
            .multi_get(&keys(&["k1"]))
            .await
            .expect("multi_get should succeed");
        assert_eq!(found.get("k1").map(String::as_str), Some("\"new\""));
    }

    #[tokio::test]
    async fn test_stats_track_reads_and_entries() {
        let backend = MemoryBackend::new();

        // Miss
        let _ = backend.multi_get(&keys(&["k1"])).await;

        backend
            .set("k1", "\"a\"".to_string(), HOUR)
            .await
            .expect("set should succeed");

        // Hits
        let _ = backend.multi_get(&keys(&["k1"])).await;
        let _ = backend.multi_get(&keys(&["k1"])).await;

        let stats = backend.stats().await.expect("stats should succeed");
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_counts_evictions() {
        let backend = MemoryBackend::new();

        backend
            .set("gone", "\"a\"".to_string(), Duration::ZERO)
            .await
            .expect("set should succeed");
        backend
            .set("kept", "\"b\"".to_string(), HOUR)
            .await
            .expect("set should succeed");

        let purged = backend.purge_expired().expect("purge should succeed");
        assert_eq!(purged, 1);

        let stats = backend.stats().await.expect("stats should succeed");
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.evictions, 1);
    }
}
