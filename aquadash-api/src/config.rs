//! API Configuration Module
//!
//! Listener, cache and retry settings for the dashboard service. Values
//! come from environment variables with defaults suitable for local
//! development. Database settings live in [`crate::db::DbConfig`] and
//! logging settings in [`crate::telemetry::TelemetryConfig`].

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use aquadash_core::{ConfigError, RetryConfig};
use aquadash_storage::RefreshConfig;

// ============================================================================
// ENV PARSING HELPERS
// ============================================================================

/// Parse an optional variable, falling back to `default` when unset.
///
/// A set but unparsable value is a configuration error rather than a
/// silent fallback.
pub(crate) fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            field: key.to_string(),
            value: raw.clone(),
            reason: format!("expected {}", std::any::type_name::<T>()),
        }),
    }
}

pub(crate) fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(s) if s.is_empty() => Ok(default),
        Some(s) => match s.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                field: key.to_string(),
                value: s,
                reason: "expected true or false".to_string(),
            }),
        },
    }
}

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

// ============================================================================
// CACHE SETTINGS
// ============================================================================

/// Cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Whether the cache is consulted at all.
    pub enabled: bool,
    /// Redis URL (`rediss://` for TLS). `None` selects the in-memory backend.
    pub url: Option<String>,
    /// Entry lifetime.
    pub ttl: Duration,
    /// Bound on a single cache round trip.
    pub timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            ttl: Duration::from_secs(600),
            timeout: Duration::from_millis(2000),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Listener host.
    pub bind: String,
    /// Listener port.
    pub port: u16,
    /// Cache settings.
    pub cache: CacheSettings,
    /// Retry policy around the record store fetch.
    pub retry: RetryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            cache: CacheSettings::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AQUADASH_BIND`: listener host (default: 0.0.0.0)
    /// - `PORT` or `AQUADASH_PORT`: listener port (default: 3000)
    /// - `AQUADASH_CACHE_ENABLED`: "true" or "false" (default: true)
    /// - `AQUADASH_CACHE_URL`: Redis URL; unset selects the in-memory cache
    /// - `AQUADASH_CACHE_TTL_SECS`: entry TTL (default: 600)
    /// - `AQUADASH_CACHE_TIMEOUT_MS`: cache round-trip timeout (default: 2000)
    /// - `AQUADASH_STORE_MAX_RETRIES`: store retry bound (default: 2)
    /// - `AQUADASH_STORE_RETRY_BACKOFF_MS`: initial retry backoff (default: 200)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind = lookup("AQUADASH_BIND")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.bind);
        let port = match lookup("PORT").filter(|s| !s.trim().is_empty()) {
            Some(_) => parse_var(&lookup, "PORT", defaults.port)?,
            None => parse_var(&lookup, "AQUADASH_PORT", defaults.port)?,
        };

        let cache = CacheSettings {
            enabled: parse_bool(&lookup, "AQUADASH_CACHE_ENABLED", defaults.cache.enabled)?,
            url: lookup("AQUADASH_CACHE_URL").filter(|s| !s.trim().is_empty()),
            ttl: Duration::from_secs(parse_var(
                &lookup,
                "AQUADASH_CACHE_TTL_SECS",
                defaults.cache.ttl.as_secs(),
            )?),
            timeout: Duration::from_millis(parse_var(
                &lookup,
                "AQUADASH_CACHE_TIMEOUT_MS",
                defaults.cache.timeout.as_millis() as u64,
            )?),
        };

        let initial_backoff = Duration::from_millis(parse_var(
            &lookup,
            "AQUADASH_STORE_RETRY_BACKOFF_MS",
            defaults.retry.initial_backoff.as_millis() as u64,
        )?);
        let retry = RetryConfig {
            max_retries: parse_var(
                &lookup,
                "AQUADASH_STORE_MAX_RETRIES",
                defaults.retry.max_retries,
            )?,
            initial_backoff,
            max_backoff: defaults.retry.max_backoff.max(initial_backoff),
            backoff_multiplier: defaults.retry.backoff_multiplier,
        };

        let config = Self {
            bind,
            port,
            cache,
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.enabled && self.cache.ttl < Duration::from_secs(1) {
            return Err(ConfigError::InvalidValue {
                field: "AQUADASH_CACHE_TTL_SECS".to_string(),
                value: self.cache.ttl.as_secs().to_string(),
                reason: "must be at least 1 when the cache is enabled".to_string(),
            });
        }
        if self.cache.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "AQUADASH_CACHE_TIMEOUT_MS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Listener address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "AQUADASH_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }

    /// Orchestrator settings, with the store timeout taken from the
    /// database configuration.
    pub fn refresh_config(&self, store_timeout: Duration) -> RefreshConfig {
        RefreshConfig::new()
            .with_cache_enabled(self.cache.enabled)
            .with_cache_ttl(self.cache.ttl)
            .with_store_timeout(store_timeout)
            .with_retry(self.retry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup_from(&[]))?;
        assert_eq!(config, ApiConfig::default());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl, Duration::from_secs(600));
        assert_eq!(config.cache.url, None);
        assert_eq!(config.retry.max_retries, 2);
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("AQUADASH_BIND", "127.0.0.1"),
            ("PORT", "8080"),
            ("AQUADASH_CACHE_ENABLED", "false"),
            ("AQUADASH_CACHE_URL", "rediss://cache.internal:6380"),
            ("AQUADASH_CACHE_TTL_SECS", "30"),
            ("AQUADASH_STORE_MAX_RETRIES", "0"),
        ]))?;
        assert_eq!(config.socket_addr()?.to_string(), "127.0.0.1:8080");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.url.as_deref(), Some("rediss://cache.internal:6380"));
        assert_eq!(config.cache.ttl, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 0);
        Ok(())
    }

    #[test]
    fn test_port_falls_back_to_prefixed_var() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup_from(&[("AQUADASH_PORT", "9000")]))?;
        assert_eq!(config.port, 9000);
        Ok(())
    }

    #[test]
    fn test_zero_ttl_rejected_when_enabled() {
        let result = ApiConfig::from_lookup(lookup_from(&[("AQUADASH_CACHE_TTL_SECS", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let disabled = ApiConfig::from_lookup(lookup_from(&[
            ("AQUADASH_CACHE_TTL_SECS", "0"),
            ("AQUADASH_CACHE_ENABLED", "false"),
        ]));
        assert!(disabled.is_ok());
    }

    #[test]
    fn test_garbage_values_rejected() {
        assert!(ApiConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
        assert!(
            ApiConfig::from_lookup(lookup_from(&[("AQUADASH_CACHE_ENABLED", "maybe")])).is_err()
        );
    }

    #[test]
    fn test_refresh_config_carries_settings() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup_from(&[("AQUADASH_CACHE_TTL_SECS", "42")]))?;
        let refresh = config.refresh_config(Duration::from_secs(5));
        assert_eq!(refresh.cache_ttl, Duration::from_secs(42));
        assert_eq!(refresh.store_timeout, Duration::from_secs(5));
        assert!(refresh.validate().is_ok());
        Ok(())
    }
}
