//! AQUADASH Storage - Record Store, Cache Layer and Refresh Orchestration
//!
//! Defines the record store abstraction, the fail-open cache layer with its
//! backends, and the orchestrator that decides between them per request.
//! The Postgres record store lives in aquadash-api.

pub mod cache;
pub mod refresh;
pub mod store;

pub use cache::{
    CacheBackend, CacheLayer, CacheOutcome, CacheStats, CacheStatus, DataRead, DataSource,
    InMemoryCacheBackend, DEFAULT_CACHE_TIMEOUT,
};
#[cfg(feature = "redis-backend")]
pub use cache::RedisCacheBackend;
pub use refresh::{DataRefreshOrchestrator, RefreshConfig, WATER_QUALITY_CACHE_KEY};
pub use store::RecordStore;
