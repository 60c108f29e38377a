//! Key directory: deterministic id-to-backend-key mapping for one fetch.
//!
//! A [`KeySpace`] is the key-naming policy of one cache type (namespace +
//! schema version on top of the environment prefix). A [`KeyMap`] is built
//! once per fetch from the requested ids and is immutable afterwards; it
//! holds both directions of the mapping so backend responses can be folded
//! back onto domain ids.
//!
//! Key building is a pure function of (key space, id). There is no
//! content-based cache busting: bump the version when the cached shape
//! changes.

use std::collections::HashMap;

use vireo_core::{sha256_hex, CacheDefaults};

use crate::traits::CacheId;

/// Hard ceiling on backend key length, in bytes.
///
/// Keys above this are swapped for their digest form. The ceiling matches
/// the strictest store the platform deploys against.
pub const MAX_KEY_BYTES: usize = 250;

/// Namespaced, versioned key policy for one cache type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
    namespace: String,
    version: String,
}

impl KeySpace {
    /// Create a key space under the default environment prefix.
    pub fn new(namespace: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_defaults(&CacheDefaults::default(), namespace, version)
    }

    /// Create a key space under the prefix from the given defaults.
    pub fn with_defaults(
        defaults: &CacheDefaults,
        namespace: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            prefix: defaults.key_prefix.clone(),
            namespace: namespace.into(),
            version: version.into(),
        }
    }

    /// Get the namespace of this key space.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build the backend key for one id.
    ///
    /// Format: `{prefix}_{namespace}_{version}_{id}`. A key exceeding
    /// [`MAX_KEY_BYTES`] is replaced by
    /// `{prefix}_{namespace}_{version}_h_{sha256-hex of the full key}`,
    /// which stays deterministic per id. The fixed segments are expected to
    /// sit well under the ceiling.
    pub fn key_for<K: CacheId>(&self, id: &K) -> String {
        let key = format!("{}_{}_{}_{}", self.prefix, self.namespace, self.version, id);
        if key.len() > MAX_KEY_BYTES {
            format!(
                "{}_{}_{}_h_{}",
                self.prefix,
                self.namespace,
                self.version,
                sha256_hex(&key)
            )
        } else {
            key
        }
    }
}

/// Bidirectional id-to-key mapping for one fetch operation.
///
/// Invariant: the mapping is a bijection. Duplicate ids in the request
/// collapse to a single entry; every backend key resolves to exactly one
/// domain id.
#[derive(Debug, Clone)]
pub struct KeyMap<K: CacheId> {
    forward: HashMap<K, String>,
    inverse: HashMap<String, K>,
    keys: Vec<String>,
}

impl<K: CacheId> KeyMap<K> {
    /// Build the map for the given ids, deduplicating as it goes.
    pub fn build(space: &KeySpace, ids: &[K]) -> Self {
        let mut forward = HashMap::with_capacity(ids.len());
        let mut inverse = HashMap::with_capacity(ids.len());
        let mut keys = Vec::with_capacity(ids.len());

        for id in ids {
            if forward.contains_key(id) {
                continue;
            }
            let key = space.key_for(id);
            forward.insert(id.clone(), key.clone());
            inverse.insert(key.clone(), id.clone());
            keys.push(key);
        }

        Self {
            forward,
            inverse,
            keys,
        }
    }

    /// Number of distinct ids in the map.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no ids were requested.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All backend keys, in first-seen id order.
    pub fn backend_keys(&self) -> &[String] {
        &self.keys
    }

    /// Backend key for a domain id.
    pub fn key_of(&self, id: &K) -> Option<&str> {
        self.forward.get(id).map(String::as_str)
    }

    /// Domain id for a backend key.
    pub fn id_of(&self, key: &str) -> Option<&K> {
        self.inverse.get(key)
    }

    /// Iterate the distinct domain ids.
    pub fn ids(&self) -> impl Iterator<Item = &K> {
        self.forward.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> KeySpace {
        KeySpace::new("user", "v1")
    }

    #[test]
    fn test_key_format() {
        let key = space().key_for(&"alice".to_string());
        assert_eq!(key, "vireo_user_v1_alice");
    }

    #[test]
    fn test_key_is_deterministic() {
        let space = space();
        let id = 42u64;
        assert_eq!(space.key_for(&id), space.key_for(&id));
    }

    #[test]
    fn test_prefix_from_defaults() {
        let defaults = CacheDefaults {
            key_prefix: "vireo_stg".to_string(),
            ..CacheDefaults::default()
        };
        let space = KeySpace::with_defaults(&defaults, "channel", "v2");
        assert_eq!(space.key_for(&7u64), "vireo_stg_channel_v2_7");
    }

    #[test]
    fn test_long_key_gets_digested() {
        let space = space();
        let long_id = "x".repeat(300);
        let key = space.key_for(&long_id);

        assert!(key.len() <= MAX_KEY_BYTES);
        assert!(key.starts_with("vireo_user_v1_h_"));
        // Still deterministic.
        assert_eq!(key, space.key_for(&long_id));
    }

    #[test]
    fn test_digested_keys_differ_by_id() {
        let space = space();
        let a = space.key_for(&"a".repeat(300));
        let b = space.key_for(&"b".repeat(300));
        assert_ne!(a, b);
    }

    #[test]
    fn test_build_dedups_ids() {
        let ids = vec![1u64, 2, 1, 3, 2];
        let map = KeyMap::build(&space(), &ids);

        assert_eq!(map.len(), 3);
        assert_eq!(map.backend_keys().len(), 3);
    }

    #[test]
    fn test_forward_and_inverse_agree() {
        let ids: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let map = KeyMap::build(&space(), &ids);

        for id in &ids {
            let key = map.key_of(id).expect("id should have a key");
            assert_eq!(map.id_of(key), Some(id));
        }
    }

    #[test]
    fn test_empty_ids_yield_empty_map() {
        let map: KeyMap<u64> = KeyMap::build(&space(), &[]);
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_unknown_key_resolves_to_none() {
        let map = KeyMap::build(&space(), &[1u64]);
        assert!(map.id_of("vireo_user_v1_999").is_none());
        assert!(map.key_of(&999u64).is_none());
    }
}
