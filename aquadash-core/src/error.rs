//! Error types for AQUADASH operations

use std::time::Duration;
use thiserror::Error;

/// Record store errors. Always fatal to the request that hit them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Record store fetch timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Cache backend errors. Never surfaced to a request; the cache layer
/// converts every one of these into a miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache round trip timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Cache payload could not be (de)serialized: {reason}")]
    Serialization { reason: String },
}

/// Data shape errors raised while decoding or aggregating observations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("Malformed row {row}: field {field}: {reason}")]
    MalformedRow {
        row: usize,
        field: String,
        reason: String,
    },
}

impl DataError {
    pub fn malformed(row: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        DataError::MalformedRow {
            row,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all AQUADASH errors.
#[derive(Debug, Clone, Error)]
pub enum AquadashError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl AquadashError {
    /// Store failures are transient and worth another attempt; malformed
    /// data will be malformed again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AquadashError::Store(_))
    }
}

/// Result type alias for AQUADASH operations.
pub type AquadashResult<T> = Result<T, AquadashError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_unavailable() {
        let err = StoreError::Unavailable {
            reason: "connection refused".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Record store unavailable"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_malformed_row_display() {
        let err = DataError::malformed(7, "Quality", "unrecognized label \"Maybe\"");
        let msg = format!("{}", err);
        assert!(msg.contains("row 7"));
        assert!(msg.contains("Quality"));
        assert!(msg.contains("Maybe"));
    }

    #[test]
    fn test_only_store_errors_are_retryable() {
        let store: AquadashError = StoreError::Timeout {
            timeout: Duration::from_secs(5),
        }
        .into();
        assert!(store.is_retryable());

        let data: AquadashError = DataError::malformed(0, "City", "missing").into();
        assert!(!data.is_retryable());

        let cache: AquadashError = CacheError::Unavailable {
            reason: "down".to_string(),
        }
        .into();
        assert!(!cache.is_retryable());
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "AQUADASH_CACHE_TTL_SECS".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("AQUADASH_CACHE_TTL_SECS"));
        assert!(msg.contains("must be at least 1"));
    }
}
