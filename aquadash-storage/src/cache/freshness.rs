//! Provenance metadata for observation-table reads.
//!
//! Every read handed to the presentation layer says where the table came
//! from and when it was read, so pages and logs never have to guess whether
//! they are showing cached data.

use std::fmt;

use aquadash_core::{ObservationTable, Timestamp};
use chrono::Utc;
use serde::Serialize;

/// What happened at the cache on the way to this read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Caching is switched off in configuration.
    Disabled,
    /// Served from cache.
    Hit,
    /// Cache had no usable entry.
    Miss,
    /// Cache failed or timed out and was bypassed.
    Unavailable,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Disabled => "disabled",
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the table was ultimately read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Cache,
    Store,
}

/// An observation table together with how it was obtained.
#[derive(Debug, Clone)]
pub struct DataRead {
    table: ObservationTable,
    cache_status: CacheStatus,
    fetched_at: Timestamp,
    attempts: u32,
}

impl DataRead {
    /// Read served from cache.
    pub fn from_cache(table: ObservationTable) -> Self {
        Self {
            table,
            cache_status: CacheStatus::Hit,
            fetched_at: Utc::now(),
            attempts: 0,
        }
    }

    /// Read served by the record store after `attempts` tries.
    ///
    /// `cache_status` records why the cache did not answer.
    pub fn from_store(table: ObservationTable, cache_status: CacheStatus, attempts: u32) -> Self {
        Self {
            table,
            cache_status,
            fetched_at: Utc::now(),
            attempts,
        }
    }

    pub fn source(&self) -> DataSource {
        match self.cache_status {
            CacheStatus::Hit => DataSource::Cache,
            _ => DataSource::Store,
        }
    }

    pub fn was_cache_hit(&self) -> bool {
        self.cache_status == CacheStatus::Hit
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }

    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    /// Store attempts made for this read. Zero for cache hits.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    pub fn into_table(self) -> ObservationTable {
        self.table
    }
}

impl AsRef<ObservationTable> for DataRead {
    fn as_ref(&self) -> &ObservationTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_read() {
        let read = DataRead::from_cache(ObservationTable::default());
        assert!(read.was_cache_hit());
        assert_eq!(read.source(), DataSource::Cache);
        assert_eq!(read.attempts(), 0);
    }

    #[test]
    fn test_store_read_keeps_cache_status() {
        for status in [CacheStatus::Disabled, CacheStatus::Miss, CacheStatus::Unavailable] {
            let read = DataRead::from_store(ObservationTable::default(), status, 1);
            assert!(!read.was_cache_hit());
            assert_eq!(read.source(), DataSource::Store);
            assert_eq!(read.cache_status(), status);
        }
    }

    #[test]
    fn test_fetched_at_is_stamped_on_creation() {
        let before = Utc::now();
        let read = DataRead::from_cache(ObservationTable::default());
        assert!(read.fetched_at() >= before);
        assert!(read.fetched_at() <= Utc::now());
    }

    #[test]
    fn test_cache_status_wire_names() {
        assert_eq!(CacheStatus::Unavailable.to_string(), "unavailable");
        assert_eq!(
            serde_json::to_string(&CacheStatus::Hit).ok(),
            Some("\"hit\"".to_string())
        );
    }
}
