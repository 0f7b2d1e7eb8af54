//! Data refresh orchestration.
//!
//! Decides per request whether the observation table comes from the cache
//! or from the record store, and keeps the cache populated on the way out.
//! The store is authoritative: if it fails and the cache has nothing, the
//! request fails. There is no stale-cache fallback.

use std::sync::Arc;
use std::time::Duration;

use aquadash_core::{AquadashResult, ConfigError, ObservationTable, RetryConfig, StoreError};

use crate::cache::{CacheLayer, CacheOutcome, CacheStats, CacheStatus, DataRead};
use crate::store::RecordStore;

/// Cache key under which the full observation table is stored.
pub const WATER_QUALITY_CACHE_KEY: &str = "water_quality_data";

/// Configuration for the refresh orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfig {
    /// Whether the cache is consulted and populated at all.
    pub cache_enabled: bool,
    /// Lifetime of a cached table.
    pub cache_ttl: Duration,
    /// Bound on a single store fetch attempt.
    pub store_timeout: Duration,
    /// Retry policy around the store fetch.
    pub retry: RetryConfig,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::from_secs(600), // 10 minutes
            store_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl RefreshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> AquadashResult<()> {
        if self.cache_enabled && self.cache_ttl < Duration::from_secs(1) {
            return Err(ConfigError::InvalidValue {
                field: "cache_ttl".to_string(),
                value: format!("{:?}", self.cache_ttl),
                reason: "must be at least one second when the cache is enabled".to_string(),
            }
            .into());
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "store_timeout".to_string(),
                value: format!("{:?}", self.store_timeout),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        self.retry.validate()
    }
}

/// Cache-first reader for the observation table.
#[derive(Clone)]
pub struct DataRefreshOrchestrator {
    store: Arc<dyn RecordStore>,
    cache: Option<CacheLayer>,
    config: RefreshConfig,
}

impl DataRefreshOrchestrator {
    /// Create an orchestrator. `cache` is ignored when the config disables
    /// caching.
    pub fn new(
        store: Arc<dyn RecordStore>,
        cache: Option<CacheLayer>,
        config: RefreshConfig,
    ) -> Self {
        let cache = if config.cache_enabled { cache } else { None };
        Self {
            store,
            cache,
            config,
        }
    }

    /// Orchestrator that always reads the store.
    pub fn without_cache(store: Arc<dyn RecordStore>, config: RefreshConfig) -> Self {
        Self::new(store, None, config.with_cache_enabled(false))
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&CacheLayer> {
        self.cache.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(CacheLayer::stats)
    }

    /// Current observation table, from cache when possible.
    ///
    /// # Errors
    ///
    /// Store failures (after retries) and malformed rows. Cache failures
    /// never surface here.
    #[tracing::instrument(skip(self), fields(cache_status, rows))]
    pub async fn get_data(&self) -> AquadashResult<DataRead> {
        let cache_status = match &self.cache {
            None => CacheStatus::Disabled,
            Some(cache) => match cache.lookup(WATER_QUALITY_CACHE_KEY).await {
                CacheOutcome::Hit(table) => {
                    let span = tracing::Span::current();
                    span.record("cache_status", CacheStatus::Hit.as_str());
                    span.record("rows", table.len());
                    return Ok(DataRead::from_cache(table));
                }
                CacheOutcome::Miss => CacheStatus::Miss,
                CacheOutcome::Unavailable => CacheStatus::Unavailable,
            },
        };
        tracing::Span::current().record("cache_status", cache_status.as_str());

        let (table, attempts) = self.fetch_with_retry().await?;
        tracing::Span::current().record("rows", table.len());

        if let Some(cache) = &self.cache {
            cache
                .set(WATER_QUALITY_CACHE_KEY, &table, self.config.cache_ttl)
                .await;
        }

        Ok(DataRead::from_store(table, cache_status, attempts))
    }

    /// Drop the cached table so the next read goes to the store.
    ///
    /// Returns `false` if caching is disabled or the backend failed.
    pub async fn invalidate(&self) -> bool {
        match &self.cache {
            Some(cache) => cache.invalidate(WATER_QUALITY_CACHE_KEY).await,
            None => false,
        }
    }

    async fn fetch_once(&self) -> AquadashResult<ObservationTable> {
        let timeout = self.config.store_timeout;
        match tokio::time::timeout(timeout, self.store.fetch_all()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout { timeout }.into()),
        }
    }

    /// Fetch from the store, retrying transient failures with backoff.
    ///
    /// Returns the table and the number of attempts made.
    async fn fetch_with_retry(&self) -> AquadashResult<(ObservationTable, u32)> {
        let retry = &self.config.retry;
        let mut attempt: u32 = 0;
        loop {
            match self.fetch_once().await {
                Ok(table) => {
                    tracing::debug!(
                        store = self.store.name(),
                        attempt,
                        rows = table.len(),
                        "Fetched observations from record store"
                    );
                    return Ok((table, attempt + 1));
                }
                Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                    let delay = retry.backoff_for(attempt);
                    tracing::warn!(
                        store = self.store.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Record store fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        store = self.store.name(),
                        attempt,
                        error = %e,
                        "Record store fetch failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheBackend;
    use aquadash_core::{AquadashError, ObservationRow, QualityLabel};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingStore {
        table: ObservationTable,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn fetch_all(&self) -> AquadashResult<ObservationTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.table.clone())
        }
    }

    fn store() -> Arc<CountingStore> {
        Arc::new(CountingStore {
            table: ObservationTable::new(vec![ObservationRow {
                date_time: Utc::now(),
                city: "Pune".to_string(),
                ph: 7.0,
                turbidity: 1.0,
                hardness: 120.0,
                quality: QualityLabel::Safe,
            }]),
            calls: AtomicU32::new(0),
        })
    }

    fn memory_cache() -> CacheLayer {
        CacheLayer::with_default_timeout(Arc::new(InMemoryCacheBackend::new()))
    }

    #[test]
    fn test_default_config() {
        let config = RefreshConfig::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sub_second_ttl_rejected_only_when_enabled() {
        let config = RefreshConfig::new().with_cache_ttl(Duration::from_millis(500));
        assert!(matches!(
            config.validate(),
            Err(AquadashError::Config(ConfigError::InvalidValue { .. }))
        ));
        assert!(config.with_cache_enabled(false).validate().is_ok());
    }

    #[test]
    fn test_zero_store_timeout_rejected() {
        let config = RefreshConfig::new().with_store_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() -> AquadashResult<()> {
        let store = store();
        let orchestrator = DataRefreshOrchestrator::new(
            store.clone(),
            Some(memory_cache()),
            RefreshConfig::default(),
        );

        let first = orchestrator.get_data().await?;
        assert_eq!(first.cache_status(), CacheStatus::Miss);
        assert_eq!(first.attempts(), 1);

        let second = orchestrator.get_data().await?;
        assert!(second.was_cache_hit());
        assert_eq!(second.table(), first.table());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_config_drops_supplied_cache() -> AquadashResult<()> {
        let store = store();
        let orchestrator = DataRefreshOrchestrator::new(
            store.clone(),
            Some(memory_cache()),
            RefreshConfig::new().with_cache_enabled(false),
        );
        assert!(orchestrator.cache().is_none());

        orchestrator.get_data().await?;
        let read = orchestrator.get_data().await?;
        assert_eq!(read.cache_status(), CacheStatus::Disabled);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        assert!(!orchestrator.invalidate().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalidate_forces_store_read() -> AquadashResult<()> {
        let store = store();
        let orchestrator = DataRefreshOrchestrator::new(
            store.clone(),
            Some(memory_cache()),
            RefreshConfig::default(),
        );

        orchestrator.get_data().await?;
        assert!(orchestrator.invalidate().await);
        let read = orchestrator.get_data().await?;
        assert!(!read.was_cache_hit());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
