//! Multi-key cache-aside retrieval engine for the Vireo backend.
//!
//! Nearly every "fetch many entities by id" path in the platform reads
//! through this engine: a per-fetch [`CachePlan`] names the ids, key space,
//! and TTL; the engine checks the key/value backend in bounded chunks,
//! loads misses from the cache type's [`SourceLoader`] in bounded
//! sub-batches, and repopulates the backend off the read path.
//!
//! # Design Philosophy
//!
//! A flaky cache must never make a feature unavailable. The failure policy
//! is asymmetric on purpose: backend read failures degrade to source loads
//! (latency, never an error), backend write failures are reported to the
//! error-log collaborator and dropped, and only a source-of-truth failure
//! fails the caller.
//!
//! # Example
//!
//! ```ignore
//! let backend = provider::shared(BackendKind::InProcess, Consistency::Eventual)?;
//! let plan = CachePlan::new(KeySpace::new("user", "v1"), user_ids);
//! let cache = MultiGetCache::new(plan, backend, user_loader)?;
//!
//! // One entry per requested id, defaults where the source has nothing.
//! let users = cache.fetch().await?;
//!
//! // After a relational write:
//! cache.clear().await?;
//! ```

pub mod coalesce;
pub mod keys;
pub mod memory_backend;
pub mod multi;
pub mod provider;
pub mod single;
pub mod traits;

pub use coalesce::FlightGroup;
pub use keys::{KeyMap, KeySpace, MAX_KEY_BYTES};
pub use memory_backend::MemoryBackend;
pub use multi::{CachePlan, MultiGetCache, READ_BATCH, SOURCE_BATCH};
pub use provider::{BackendKind, Consistency};
pub use single::SingleGetCache;
pub use traits::{CacheBackend, CacheEntry, CacheId, CacheStats, SourceLoader};
