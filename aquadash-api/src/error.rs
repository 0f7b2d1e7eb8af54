//! Error Types for AQUADASH API
//!
//! This module defines error handling for the HTTP layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//! - Conversion from the domain error taxonomy
//!
//! JSON routes return errors as JSON bodies. The dashboard page renders
//! the same error as HTML via [`ApiError::into_html_response`].

use aquadash_core::{AquadashError, CacheError, ConfigError, DataError, StoreError};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::presentation::escape_html;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No route matches the request
    NotFound,

    /// The record store returned rows that do not match the schema
    BadUpstreamData,

    /// The record store could not be reached or timed out
    StoreUnavailable,

    /// Service configuration is invalid
    ConfigurationError,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadUpstreamData => StatusCode::BAD_GATEWAY,
            ErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ConfigurationError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "Not found",
            ErrorCode::BadUpstreamData => "The data source returned malformed observations",
            ErrorCode::StoreUnavailable => "Water quality data is temporarily unavailable",
            ErrorCode::ConfigurationError => "Service is misconfigured",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn store_unavailable() -> Self {
        Self::from_code(ErrorCode::StoreUnavailable)
    }

    pub fn bad_upstream_data(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadUpstreamData, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Render this error as a standalone HTML page with the same status.
    pub fn into_html_response(self) -> Response {
        let status = self.status_code();
        let body = format!(
            concat!(
                "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
                "<meta charset=\"utf-8\">\n<title>Water Quality Dashboard - {status}</title>\n",
                "</head>\n<body>\n<main class=\"error\">\n",
                "<h1>Water Quality Dashboard</h1>\n",
                "<p class=\"error-status\">{status}</p>\n",
                "<p class=\"error-message\">{message}</p>\n",
                "</main>\n</body>\n</html>\n"
            ),
            status = status,
            message = escape_html(&self.message),
        );
        (status, Html(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

/// Map the domain taxonomy onto HTTP errors.
///
/// Store and connection details are logged here and replaced with a generic
/// message; only the malformed-row location is passed on, since it points
/// at data, not infrastructure.
impl From<AquadashError> for ApiError {
    fn from(err: AquadashError) -> Self {
        match err {
            AquadashError::Store(e) => {
                match &e {
                    StoreError::Unavailable { reason } => {
                        tracing::error!(reason = %reason, "Record store unavailable");
                    }
                    StoreError::Timeout { timeout } => {
                        tracing::error!(
                            timeout_ms = timeout.as_millis() as u64,
                            "Record store timed out"
                        );
                    }
                }
                ApiError::store_unavailable()
            }
            AquadashError::Data(DataError::MalformedRow { row, field, reason }) => {
                tracing::error!(row, field = %field, reason = %reason, "Malformed observation row");
                ApiError::from_code(ErrorCode::BadUpstreamData).with_details(serde_json::json!({
                    "row": row,
                    "field": field,
                }))
            }
            AquadashError::Cache(e) => {
                // The cache layer swallows its own failures; reaching here is a bug.
                tracing::error!(error = %e, "Cache error escaped the cache layer");
                ApiError::internal_error("Internal server error")
            }
            AquadashError::Config(e) => e.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::configuration(err.to_string())
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::configuration(format!("Cache backend could not be configured: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const ALL_CODES: [ErrorCode; 5] = [
        ErrorCode::NotFound,
        ErrorCode::BadUpstreamData,
        ErrorCode::StoreUnavailable,
        ErrorCode::ConfigurationError,
        ErrorCode::InternalError,
    ];

    #[test]
    fn test_only_unknown_routes_are_client_errors() -> Result<(), serde_json::Error> {
        let names = ALL_CODES
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            names,
            vec![
                "NOT_FOUND",
                "BAD_UPSTREAM_DATA",
                "STORE_UNAVAILABLE",
                "CONFIGURATION_ERROR",
                "INTERNAL_ERROR"
            ]
        );
        for code in ALL_CODES {
            let status = code.status_code();
            assert!(
                !status.is_client_error() || status == StatusCode::NOT_FOUND,
                "{} maps to {}",
                code,
                status
            );
        }
        assert!(serde_json::from_str::<ErrorCode>("\"INVALID_INPUT\"").is_err());
        Ok(())
    }

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::BadUpstreamData.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::StoreUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_errors_map_to_503_without_leaking() {
        let err: ApiError = AquadashError::from(StoreError::Unavailable {
            reason: "password authentication failed for user postgres".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message.contains("password"));

        let err: ApiError = AquadashError::from(StoreError::Timeout {
            timeout: Duration::from_secs(5),
        })
        .into();
        assert_eq!(err.code, ErrorCode::StoreUnavailable);
    }

    #[test]
    fn test_malformed_row_maps_to_502_with_location() {
        let err: ApiError =
            AquadashError::from(DataError::malformed(4, "Quality", "unknown label")).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.details,
            Some(serde_json::json!({ "row": 4, "field": "Quality" }))
        );
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::store_unavailable();
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("STORE_UNAVAILABLE"));
        assert!(!json.contains("details"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);
        Ok(())
    }

    #[test]
    fn test_html_response_keeps_status() {
        let response = ApiError::bad_upstream_data("<bad>").into_html_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::internal_error("boom");
        assert_eq!(format!("{}", err), "InternalError: boom");
    }
}
