//! Cache layer for observation tables.
//!
//! Backends implement [`CacheBackend`] over opaque string payloads.
//! [`CacheLayer`] sits on top, owns JSON (de)serialization and timeouts,
//! and turns every backend failure into a logged miss.
//!
//! Reads that reach the presentation layer are wrapped in [`DataRead`],
//! which records whether the cache answered.

pub mod freshness;
pub mod layer;
pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis_backend;
pub mod traits;

pub use freshness::{CacheStatus, DataRead, DataSource};
pub use layer::{CacheLayer, CacheOutcome, DEFAULT_CACHE_TIMEOUT};
pub use memory::InMemoryCacheBackend;
#[cfg(feature = "redis-backend")]
pub use redis_backend::RedisCacheBackend;
pub use traits::{CacheBackend, CacheStats};
