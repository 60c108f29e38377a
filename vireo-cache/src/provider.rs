//! Process-wide backend providers.
//!
//! The engine itself takes its backend by injection; this module is the
//! application wiring that keeps one shared instance per
//! `(BackendKind, Consistency)` slot so hundreds of short-lived engines
//! reuse the same connections. In-process slots are created on demand.
//! Distributed slots wrap an external client and must be registered at
//! startup; asking for one that was never registered is a configuration
//! bug, not a runtime condition.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use vireo_core::{BackendError, ConfigError, VireoResult};

use crate::memory_backend::MemoryBackend;
use crate::traits::CacheBackend;

/// Which backend family a cache type reads through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Shared across app servers.
    Distributed,
    /// Local to this process.
    InProcess,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distributed => write!(f, "distributed"),
            Self::InProcess => write!(f, "in-process"),
        }
    }
}

/// Consistency behavior requested from the distributed store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consistency {
    Eventual,
    Strong,
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eventual => write!(f, "eventual"),
            Self::Strong => write!(f, "strong"),
        }
    }
}

type Registry = RwLock<HashMap<(BackendKind, Consistency), Arc<dyn CacheBackend>>>;

static REGISTRY: Lazy<Registry> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a backend for a slot, replacing any previous one.
///
/// Applications call this once at startup for each distributed slot they
/// use. Registering an in-process slot is allowed but rarely needed.
pub fn register(
    kind: BackendKind,
    consistency: Consistency,
    backend: Arc<dyn CacheBackend>,
) -> VireoResult<()> {
    let mut registry = REGISTRY.write().map_err(|_| BackendError::LockPoisoned)?;
    registry.insert((kind, consistency), backend);
    Ok(())
}

/// Get the shared backend for a slot.
///
/// In-process slots are created on first use. Distributed slots must have
/// been [`register`]ed.
pub fn shared(kind: BackendKind, consistency: Consistency) -> VireoResult<Arc<dyn CacheBackend>> {
    {
        let registry = REGISTRY.read().map_err(|_| BackendError::LockPoisoned)?;
        if let Some(backend) = registry.get(&(kind, consistency)) {
            return Ok(Arc::clone(backend));
        }
    }

    if kind == BackendKind::InProcess {
        let mut registry = REGISTRY.write().map_err(|_| BackendError::LockPoisoned)?;
        let backend = registry
            .entry((kind, consistency))
            .or_insert_with(|| Arc::new(MemoryBackend::new()));
        return Ok(Arc::clone(backend));
    }

    Err(ConfigError::ProviderNotRegistered {
        kind: kind.to_string(),
        consistency: consistency.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use vireo_core::VireoError;

    #[test]
    fn test_in_process_slot_is_a_singleton() {
        let first = shared(BackendKind::InProcess, Consistency::Eventual)
            .expect("in-process slot should exist");
        let second = shared(BackendKind::InProcess, Consistency::Eventual)
            .expect("in-process slot should exist");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_slots_are_distinct_per_consistency() {
        let eventual = shared(BackendKind::InProcess, Consistency::Eventual)
            .expect("in-process slot should exist");
        let strong = shared(BackendKind::InProcess, Consistency::Strong)
            .expect("in-process slot should exist");
        assert!(!Arc::ptr_eq(&eventual, &strong));
    }

    #[test]
    fn test_unregistered_distributed_slot_errors() {
        let err = shared(BackendKind::Distributed, Consistency::Eventual)
            .err()
            .expect("unregistered distributed slot must error");
        assert!(matches!(err, VireoError::Config(_)));
    }

    #[tokio::test]
    async fn test_registered_distributed_slot_is_returned() {
        use crate::traits::CacheStats;
        use async_trait::async_trait;

        struct FakeClient;

        #[async_trait]
        impl CacheBackend for FakeClient {
            async fn multi_get(
                &self,
                _keys: &[String],
            ) -> VireoResult<HashMap<String, String>> {
                Ok(HashMap::new())
            }

            async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> VireoResult<()> {
                Ok(())
            }

            async fn del(&self, _key: &str) -> VireoResult<()> {
                Ok(())
            }

            async fn stats(&self) -> VireoResult<CacheStats> {
                Ok(CacheStats::default())
            }
        }

        let client: Arc<dyn CacheBackend> = Arc::new(FakeClient);
        register(BackendKind::Distributed, Consistency::Strong, Arc::clone(&client))
            .expect("register should succeed");

        let resolved = shared(BackendKind::Distributed, Consistency::Strong)
            .expect("registered slot should resolve");
        assert!(Arc::ptr_eq(&resolved, &client));
    }
}
