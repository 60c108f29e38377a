//! Error types for Vireo cache operations

use thiserror::Error;

/// Key/value backend errors.
///
/// These are the failures the read path recovers from: a failed `multi_get`
/// degrades the affected ids to misses, a failed `set` is reported and
/// dropped. Callers only ever see them when a backend is used directly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Backend {op} failed: {reason}")]
    OperationFailed { op: &'static str, reason: String },

    #[error("Entry serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Backend lock poisoned")]
    LockPoisoned,
}

/// Source-of-truth loader errors.
///
/// A source failure is fatal to the whole fetch: no authoritative data
/// could be obtained, so there is nothing correct to return.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Source load failed: {reason}")]
    LoadFailed { reason: String },

    #[error("Source rejected batch of {count} ids: {reason}")]
    BatchRejected { count: usize, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No backend registered for {kind} ({consistency})")]
    ProviderNotRegistered { kind: String, consistency: String },
}

/// Master error type for all Vireo cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VireoError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Vireo cache operations.
pub type VireoResult<T> = Result<T, VireoError>;

// =============================================================================
// TESTS
// =============================================================================
