//! Vireo Core - Shared Contracts
//!
//! Error taxonomy, error-report collaborator, digest helpers, and cache
//! defaults. This crate contains no engine logic - the cache engine and
//! every backend implementation depend on it.

pub mod config;
pub mod error;
pub mod identity;
pub mod report;

pub use config::CacheDefaults;
pub use error::{BackendError, ConfigError, SourceError, VireoError, VireoResult};
pub use identity::{compute_content_hash, sha256_hex, ContentHash};
pub use report::{ErrorReporter, Severity, TracingReporter};
