//! AQUADASH Core - Observation Types and Insights
//!
//! Data model shared by every other crate: observation rows and tables,
//! quality labels, measurement ranges, the error taxonomy, retry policy,
//! and the pure insight aggregation over a table.

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod insights;

pub use config::RetryConfig;
pub use entities::{ObservationRow, ObservationTable, RawObservation};
pub use enums::{AcceptableRange, Measurement, QualityLabel, QualityLabelParseError};
pub use error::{
    AquadashError, AquadashResult, CacheError, ConfigError, DataError, StoreError,
};
pub use insights::{acceptable_ranges, summarize, Insights};
