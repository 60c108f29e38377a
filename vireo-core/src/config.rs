//! Configuration types

use crate::{ConfigError, VireoResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide cache defaults.
///
/// Individual cache types choose their own namespace, version, and TTL;
/// these defaults supply the environment-level key prefix (so staging and
/// production never share keys on a common store) and the TTL used when a
/// plan does not specify one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheDefaults {
    /// Prefix prepended to every backend key.
    pub key_prefix: String,
    /// TTL applied when a plan does not set one.
    pub default_ttl: Duration,
}

impl Default for CacheDefaults {
    fn default() -> Self {
        Self {
            key_prefix: "vireo".to_string(),
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl CacheDefaults {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `VIREO_CACHE_KEY_PREFIX`: key prefix (default: "vireo")
    /// - `VIREO_CACHE_DEFAULT_TTL_SECS`: default TTL in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            key_prefix: std::env::var("VIREO_CACHE_KEY_PREFIX")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.key_prefix),
            default_ttl: std::env::var("VIREO_CACHE_DEFAULT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - key_prefix is non-empty and contains no whitespace
    /// - default_ttl is positive
    pub fn validate(&self) -> VireoResult<()> {
        if self.key_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "key_prefix".to_string(),
                value: self.key_prefix.clone(),
                reason: "key_prefix must not be empty".to_string(),
            }
            .into());
        }

        if self.key_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "key_prefix".to_string(),
                value: self.key_prefix.clone(),
                reason: "key_prefix must not contain whitespace".to_string(),
            }
            .into());
        }

        if self.default_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "default_ttl".to_string(),
                value: format!("{:?}", self.default_ttl),
                reason: "default_ttl must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
