//! AQUADASH Test Utilities
//!
//! Shared test infrastructure for the AQUADASH workspace:
//! - Fake record stores and cache backends with call counters
//! - Proptest generators for observation rows and tables
//! - Fixtures for the common dashboard scenarios
//! - Assertions for the error taxonomy

// Re-export core types for convenience
pub use aquadash_core::{
    AcceptableRange, AquadashError, AquadashResult, CacheError, DataError, Insights,
    Measurement, ObservationRow, ObservationTable, QualityLabel, RetryConfig, StoreError,
    Timestamp,
};
pub use aquadash_storage::{CacheBackend, RecordStore};

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// FAKE RECORD STORES
// ============================================================================

/// Record store that always returns the same table.
#[derive(Debug, Default)]
pub struct StaticRecordStore {
    table: Mutex<ObservationTable>,
    calls: AtomicU32,
}

impl StaticRecordStore {
    pub fn new(table: ObservationTable) -> Self {
        Self {
            table: Mutex::new(table),
            calls: AtomicU32::new(0),
        }
    }

    /// Replace the table returned by later fetches.
    pub fn replace(&self, table: ObservationTable) {
        if let Ok(mut guard) = self.table.lock() {
            *guard = table;
        }
    }

    /// Number of `fetch_all` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for StaticRecordStore {
    async fn fetch_all(&self) -> AquadashResult<ObservationTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .lock()
            .map(|t| t.clone())
            .map_err(|_| {
                StoreError::Unavailable {
                    reason: "fake store lock poisoned".to_string(),
                }
                .into()
            })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Record store that fails the first `failures` fetches with
/// `StoreError::Unavailable`, then serves its table.
///
/// `u32::MAX` failures gives a store that is permanently down.
#[derive(Debug)]
pub struct FlakyRecordStore {
    table: ObservationTable,
    failures: u32,
    calls: AtomicU32,
}

impl FlakyRecordStore {
    pub fn new(table: ObservationTable, failures: u32) -> Self {
        Self {
            table,
            failures,
            calls: AtomicU32::new(0),
        }
    }

    /// A store that never answers successfully.
    pub fn down() -> Self {
        Self::new(ObservationTable::default(), u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn fetch_all(&self) -> AquadashResult<ObservationTable> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(StoreError::Unavailable {
                reason: "connection refused".to_string(),
            }
            .into());
        }
        Ok(self.table.clone())
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Record store whose every fetch reports a malformed row.
#[derive(Debug, Default)]
pub struct MalformedRecordStore {
    calls: AtomicU32,
}

impl MalformedRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MalformedRecordStore {
    async fn fetch_all(&self) -> AquadashResult<ObservationTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DataError::malformed(0, "Quality", "unrecognized label 'Maybe'").into())
    }

    fn name(&self) -> &'static str {
        "malformed"
    }
}

/// Record store that sleeps before answering.
#[derive(Debug)]
pub struct SlowRecordStore {
    table: ObservationTable,
    delay: Duration,
    calls: AtomicU32,
}

impl SlowRecordStore {
    pub fn new(table: ObservationTable, delay: Duration) -> Self {
        Self {
            table,
            delay,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for SlowRecordStore {
    async fn fetch_all(&self) -> AquadashResult<ObservationTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.table.clone())
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

// ============================================================================
// FAKE CACHE BACKENDS
// ============================================================================

/// Cache backend whose every call fails, counting the attempts.
#[derive(Debug, Default)]
pub struct FailingCacheBackend {
    gets: AtomicU32,
    sets: AtomicU32,
}

impl FailingCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> u32 {
        self.sets.load(Ordering::SeqCst)
    }

    fn error() -> CacheError {
        CacheError::Unavailable {
            reason: "connection reset by peer".to_string(),
        }
    }
}

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(Self::error())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Err(Self::error())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(Self::error())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating observation data.

    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    /// Generate a Timestamp within 2020-2030, with sub-second precision.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
            chrono::DateTime::from_timestamp(secs, nanos).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a finite measurement value.
    ///
    /// Mostly full-precision draws from `low..high`, mixed with `REAL`
    /// values widened from f32 and arbitrary normal f64 values.
    pub fn arb_measurement(low: f64, high: f64) -> impl Strategy<Value = f64> {
        prop_oneof![
            6 => low..high,
            2 => prop::num::f32::NORMAL.prop_map(f64::from),
            1 => prop::num::f64::NORMAL,
            1 => Just(0.0),
        ]
    }

    /// Generate a city from a small fixed pool so group-by collisions happen.
    pub fn arb_city() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Mumbai".to_string()),
            Just("Delhi".to_string()),
            Just("Chennai".to_string()),
            Just("Kolkata".to_string()),
            Just("Bengaluru".to_string()),
        ]
    }

    /// Generate a QualityLabel variant.
    pub fn arb_quality() -> impl Strategy<Value = QualityLabel> {
        prop_oneof![Just(QualityLabel::Safe), Just(QualityLabel::Unsafe)]
    }

    /// Generate a well-formed row with values spanning both sides of every
    /// acceptable band.
    pub fn arb_row() -> impl Strategy<Value = ObservationRow> {
        (
            arb_timestamp(),
            arb_city(),
            arb_measurement(4.0, 10.0),
            arb_measurement(0.0, 10.0),
            arb_measurement(20.0, 400.0),
            arb_quality(),
        )
            .prop_map(|(date_time, city, ph, turbidity, hardness, quality)| ObservationRow {
                date_time,
                city,
                ph,
                turbidity,
                hardness,
                quality,
            })
    }

    /// Generate a table of up to `max_rows` rows.
    pub fn arb_table(max_rows: usize) -> impl Strategy<Value = ObservationTable> {
        prop::collection::vec(arb_row(), 0..=max_rows).prop_map(ObservationTable::new)
    }

    /// Generate a RetryConfig that passes validation.
    pub fn arb_retry_config() -> impl Strategy<Value = RetryConfig> {
        (0u32..5, 1u64..500, 1.0f32..4.0).prop_map(|(max_retries, initial_ms, multiplier)| {
            RetryConfig {
                max_retries,
                initial_backoff: Duration::from_millis(initial_ms),
                max_backoff: Duration::from_millis(initial_ms * 10),
                backoff_multiplier: multiplier,
            }
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built observations for common scenarios.

    use super::*;
    use chrono::{TimeZone, Utc};

    /// A mid-band row for `city` with the given label, timestamped
    /// `minutes` after a fixed epoch.
    pub fn row_at(city: &str, quality: QualityLabel, minutes: i64) -> ObservationRow {
        let base = Utc
            .with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        ObservationRow {
            date_time: base + chrono::Duration::minutes(minutes),
            city: city.to_string(),
            ph: 7.2,
            turbidity: 1.5,
            hardness: 150.0,
            quality,
        }
    }

    pub fn row(city: &str, quality: QualityLabel) -> ObservationRow {
        row_at(city, quality, 0)
    }

    /// The three-row scenario: A Unsafe, A Unsafe, B Safe.
    pub fn two_city_table() -> ObservationTable {
        ObservationTable::new(vec![
            row_at("A", QualityLabel::Unsafe, 0),
            row_at("A", QualityLabel::Unsafe, 10),
            row_at("B", QualityLabel::Safe, 20),
        ])
    }

    /// A small table across three cities with out-of-band readings.
    pub fn sample_table() -> ObservationTable {
        let mut rows = vec![
            row_at("Mumbai", QualityLabel::Safe, 0),
            row_at("Delhi", QualityLabel::Safe, 5),
            row_at("Chennai", QualityLabel::Safe, 10),
        ];

        let mut acidic = row_at("Mumbai", QualityLabel::Unsafe, 15);
        acidic.ph = 5.9;
        rows.push(acidic);

        let mut murky = row_at("Delhi", QualityLabel::Unsafe, 20);
        murky.turbidity = 7.8;
        rows.push(murky);

        let mut hard = row_at("Delhi", QualityLabel::Unsafe, 25);
        hard.hardness = 340.0;
        rows.push(hard);

        ObservationTable::new(rows)
    }

    /// JSON payload as the cache stores it.
    pub fn cached_payload(table: &ObservationTable) -> String {
        serde_json::to_string(table).unwrap_or_else(|_| "[]".to_string())
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for AQUADASH-specific validation.

    use super::*;

    /// Assert that a result is a store failure.
    #[track_caller]
    pub fn assert_store_unavailable<T: std::fmt::Debug>(result: &AquadashResult<T>) {
        assert!(
            matches!(result, Err(AquadashError::Store(_))),
            "Expected store error, got {:?}",
            result
        );
    }

    /// Assert that a result is a malformed-row failure.
    #[track_caller]
    pub fn assert_malformed_row<T: std::fmt::Debug>(result: &AquadashResult<T>) {
        assert!(
            matches!(
                result,
                Err(AquadashError::Data(DataError::MalformedRow { .. }))
            ),
            "Expected MalformedRow, got {:?}",
            result
        );
    }

    /// Assert the counting invariants every insight summary must satisfy.
    #[track_caller]
    pub fn assert_insights_consistent(insights: &Insights, table: &ObservationTable) {
        assert_eq!(
            insights.safe_count + insights.unsafe_count,
            table.len(),
            "safe + unsafe must equal row count"
        );
        assert!(
            insights.unsafe_by_city.values().all(|&n| n > 0),
            "unsafe_by_city must not contain zero entries: {:?}",
            insights.unsafe_by_city
        );
        assert_eq!(
            insights.unsafe_by_city.values().sum::<usize>(),
            insights.unsafe_count,
            "unsafe_by_city must sum to unsafe_count"
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
