//! Fail-open cache layer over a [`CacheBackend`].
//!
//! The cache is a performance optimization only. Every backend failure
//! (error, timeout, undecodable payload) ends up as a miss here and is
//! logged; nothing from this module ever fails a request.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aquadash_core::{CacheError, ObservationTable};

use super::traits::{CacheBackend, CacheStats};

/// Result of a single cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheOutcome {
    /// An unexpired, decodable entry was found.
    Hit(ObservationTable),
    /// No usable entry: absent, expired, or corrupt.
    Miss,
    /// The backend failed or timed out. Treated exactly like a miss.
    Unavailable,
}

impl CacheOutcome {
    pub fn into_table(self) -> Option<ObservationTable> {
        match self {
            CacheOutcome::Hit(table) => Some(table),
            CacheOutcome::Miss | CacheOutcome::Unavailable => None,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    read_errors: AtomicU64,
    writes: AtomicU64,
    write_errors: AtomicU64,
}

/// Default bound on a single backend round trip.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(2);

/// Observation-table cache with an explicit fail-open contract.
#[derive(Clone)]
pub struct CacheLayer {
    backend: Arc<dyn CacheBackend>,
    timeout: Duration,
    counters: Arc<Counters>,
}

impl CacheLayer {
    /// Wrap `backend`, bounding every round trip by `timeout`.
    pub fn new(backend: Arc<dyn CacheBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_default_timeout(backend: Arc<dyn CacheBackend>) -> Self {
        Self::new(backend, DEFAULT_CACHE_TIMEOUT)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn round_trip<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                timeout: self.timeout,
            }),
        }
    }

    /// Look up `key`, classifying the result.
    pub async fn lookup(&self, key: &str) -> CacheOutcome {
        let payload = match self.round_trip(self.backend.get(key)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(backend = self.backend.name(), key, "Cache miss");
                return CacheOutcome::Miss;
            }
            Err(e) => {
                self.counters.read_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    backend = self.backend.name(),
                    key,
                    error = %e,
                    "Cache read failed; treating as miss"
                );
                return CacheOutcome::Unavailable;
            }
        };

        match serde_json::from_str::<ObservationTable>(&payload) {
            Ok(table) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    backend = self.backend.name(),
                    key,
                    rows = table.len(),
                    "Cache hit"
                );
                CacheOutcome::Hit(table)
            }
            Err(e) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    backend = self.backend.name(),
                    key,
                    error = %e,
                    "Discarding undecodable cache entry"
                );
                CacheOutcome::Miss
            }
        }
    }

    /// Cached table for `key`, or `None` for every kind of miss.
    pub async fn get(&self, key: &str) -> Option<ObservationTable> {
        self.lookup(key).await.into_table()
    }

    /// Serialize and store `table`. Failures are logged and dropped.
    ///
    /// Returns whether the write landed, for callers that want to report it.
    pub async fn set(&self, key: &str, table: &ObservationTable, ttl: Duration) -> bool {
        let payload = match serde_json::to_string(table) {
            Ok(payload) => payload,
            Err(e) => {
                self.counters.write_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key, error = %e, "Failed to serialize table for cache");
                return false;
            }
        };

        match self.round_trip(self.backend.set(key, &payload, ttl)).await {
            Ok(()) => {
                self.counters.writes.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    backend = self.backend.name(),
                    key,
                    rows = table.len(),
                    ttl_secs = ttl.as_secs(),
                    "Cache populated"
                );
                true
            }
            Err(e) => {
                self.counters.write_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    backend = self.backend.name(),
                    key,
                    error = %e,
                    "Cache write failed; continuing without cache"
                );
                false
            }
        }
    }

    /// Drop the entry for `key`. Failures are logged and dropped.
    pub async fn invalidate(&self, key: &str) -> bool {
        match self.round_trip(self.backend.delete(key)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    key,
                    error = %e,
                    "Cache invalidation failed"
                );
                false
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            read_errors: self.counters.read_errors.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            write_errors: self.counters.write_errors.load(Ordering::Relaxed),
        }
    }
}
