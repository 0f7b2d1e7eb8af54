//! Cache backend trait and usage statistics.
//!
//! This module defines the seam every cache backend implements. Backends
//! deal in opaque string payloads; (de)serialization of observation tables
//! happens one level up in [`CacheLayer`](super::CacheLayer).

use std::time::Duration;

use aquadash_core::CacheError;
use async_trait::async_trait;

/// Cache backend trait for pluggable key/value stores.
///
/// Implementations must be thread-safe; concurrent requests share one
/// backend instance. Atomicity is only required at the key level.
///
/// Backends report failures honestly through `Err`. Deciding that a
/// failure is harmless is the caller's job, not the backend's.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the payload stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent or its TTL has elapsed.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key` if present.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (absent, expired or undecodable entries).
    pub misses: u64,
    /// Number of reads that failed at the backend and were treated as misses.
    pub read_errors: u64,
    /// Number of successful writes.
    pub writes: u64,
    /// Number of writes that failed and were dropped.
    pub write_errors: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0) over all lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.read_errors;
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
            misses: 15,
            read_errors: 5,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
