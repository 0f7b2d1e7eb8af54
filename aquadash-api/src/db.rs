//! Postgres Record Store
//!
//! The production [`RecordStore`]: a full-table read of `water_quality`
//! over tokio-postgres. Every fetch opens its own connection and closes it
//! when done; there is no pool.
//!
//! Column types are read leniently (TIMESTAMPTZ, TIMESTAMP or text for the
//! timestamp; DOUBLE, REAL, NUMERIC, any integer width or text for
//! measurements) and handed to [`RawObservation::into_row`], which rejects
//! anything missing.
//!
//! Connections use TLS through rustls unless `AQUADASH_DB_SSLMODE` is
//! `disable`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aquadash_core::{
    AquadashResult, ConfigError, DataError, ObservationRow, ObservationTable, RawObservation,
    StoreError, Timestamp,
};
use aquadash_storage::RecordStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, NoTls, Row};
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::config::{env_lookup, parse_var};
use crate::telemetry::METRICS;

/// Full-table read. Always the whole table; no filtering or paging.
pub const FETCH_ALL_SQL: &str = "SELECT * FROM water_quality";

// ============================================================================
// CONNECTION CONFIGURATION
// ============================================================================

/// Transport security for store connections, named after libpq's `sslmode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbSslMode {
    /// Plain TCP only.
    Disable,
    /// TLS when the server offers it, plain TCP otherwise.
    #[default]
    Prefer,
    /// TLS with certificate verification, or no connection.
    Require,
}

impl DbSslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Prefer => "prefer",
            Self::Require => "require",
        }
    }

    fn pg_mode(&self) -> SslMode {
        match self {
            Self::Disable => SslMode::Disable,
            Self::Prefer => SslMode::Prefer,
            Self::Require => SslMode::Require,
        }
    }
}

impl fmt::Display for DbSslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbSslMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "prefer" | "allow" => Ok(Self::Prefer),
            "require" | "verify-ca" | "verify-full" => Ok(Self::Require),
            other => Err(format!("unknown sslmode {:?}", other)),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Connect timeout, also the bound on one whole fetch
    pub timeout: Duration,
    /// Transport security
    pub sslmode: DbSslMode,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "water_quality_management".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            timeout: Duration::from_secs(5),
            sslmode: DbSslMode::default(),
        }
    }
}

impl DbConfig {
    /// Create a database configuration from `AQUADASH_DB_*` variables.
    ///
    /// `AQUADASH_DB_SSLMODE` takes `disable`, `prefer` (default) or
    /// `require`; `allow`, `verify-ca` and `verify-full` are accepted as
    /// their nearest equivalents.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_secs = parse_var(
            &lookup,
            "AQUADASH_DB_TIMEOUT_SECS",
            defaults.timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "AQUADASH_DB_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            host: lookup("AQUADASH_DB_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "AQUADASH_DB_PORT", defaults.port)?,
            dbname: lookup("AQUADASH_DB_NAME").unwrap_or(defaults.dbname),
            user: lookup("AQUADASH_DB_USER").unwrap_or(defaults.user),
            password: lookup("AQUADASH_DB_PASSWORD").unwrap_or(defaults.password),
            timeout: Duration::from_secs(timeout_secs),
            sslmode: parse_var(&lookup, "AQUADASH_DB_SSLMODE", defaults.sslmode)?,
        })
    }

    fn pg_config(&self) -> tokio_postgres::Config {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .connect_timeout(self.timeout)
            .ssl_mode(self.sslmode.pg_mode())
            .application_name("aquadash");
        if !self.password.is_empty() {
            cfg.password(&self.password);
        }
        cfg
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// rustls connector trusting the webpki root set.
fn tls_connector() -> Result<MakeRustlsConnect, ConfigError> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let tls_config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ConfigError::InvalidValue {
            field: "AQUADASH_DB_SSLMODE".to_string(),
            value: "tls".to_string(),
            reason: format!("TLS setup failed: {}", e),
        })?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(tls_config))
}

/// Drive a connection until its client drops.
fn spawn_connection<C>(connection: C)
where
    C: std::future::Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(error = %e, "Postgres connection closed with error");
        }
    });
}

/// Postgres-backed record store with a connection per fetch.
#[derive(Clone)]
pub struct PgRecordStore {
    config: tokio_postgres::Config,
    tls: Option<MakeRustlsConnect>,
    target: String,
}

impl PgRecordStore {
    /// Build a store for `config`. Fails only if TLS cannot be set up.
    pub fn new(config: &DbConfig) -> Result<Self, ConfigError> {
        let tls = match config.sslmode {
            DbSslMode::Disable => None,
            DbSslMode::Prefer | DbSslMode::Require => Some(tls_connector()?),
        };
        Ok(Self {
            config: config.pg_config(),
            tls,
            target: format!("{}:{}/{}", config.host, config.port, config.dbname),
        })
    }

    /// Whether connections negotiate TLS.
    pub fn uses_tls(&self) -> bool {
        self.tls.is_some()
    }

    async fn connect(&self) -> Result<Client, StoreError> {
        let connected = match &self.tls {
            Some(tls) => self.config.connect(tls.clone()).await.map(|(client, connection)| {
                spawn_connection(connection);
                client
            }),
            None => self.config.connect(NoTls).await.map(|(client, connection)| {
                spawn_connection(connection);
                client
            }),
        };

        connected.map_err(|e| StoreError::Unavailable {
            reason: format!("connect to {} failed: {}", self.target, e),
        })
    }

    async fn query_all(&self) -> AquadashResult<ObservationTable> {
        let client = self.connect().await?;
        let rows = client
            .query(FETCH_ALL_SQL, &[])
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: format!("query failed: {}", e),
            })?;

        let observations = rows
            .iter()
            .enumerate()
            .map(|(index, row)| decode_row(index, row))
            .collect::<Result<Vec<ObservationRow>, DataError>>()?;

        Ok(ObservationTable::new(observations))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn fetch_all(&self) -> AquadashResult<ObservationTable> {
        let start = Instant::now();
        let result = self.query_all().await;
        let elapsed = start.elapsed().as_secs_f64();

        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_store_fetch(result.is_ok(), elapsed);
        }
        match &result {
            Ok(table) => tracing::debug!(
                rows = table.len(),
                elapsed_ms = (elapsed * 1000.0) as u64,
                "Fetched water_quality"
            ),
            Err(e) => tracing::warn!(error = %e, "Fetching water_quality failed"),
        }
        result
    }

    async fn health_check(&self) -> AquadashResult<()> {
        let client = self.connect().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: format!("health probe failed: {}", e),
            })?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

// ============================================================================
// ROW DECODING
// ============================================================================

fn decode_row(index: usize, row: &Row) -> Result<ObservationRow, DataError> {
    RawObservation {
        date_time: get_timestamp(index, row, "Date_Time")?,
        city: get_text(index, row, "City")?,
        ph: get_number(index, row, "pH")?,
        turbidity: get_number(index, row, "Turbidity")?,
        hardness: get_number(index, row, "Hardness")?,
        quality: get_text(index, row, "Quality")?,
    }
    .into_row(index)
}

fn get_text(index: usize, row: &Row, column: &str) -> Result<Option<String>, DataError> {
    row.try_get::<_, Option<String>>(column)
        .map_err(|e| DataError::malformed(index, column, e.to_string()))
}

fn get_number(index: usize, row: &Row, column: &str) -> Result<Option<f64>, DataError> {
    if let Ok(value) = row.try_get::<_, Option<f64>>(column) {
        return Ok(value);
    }
    if let Ok(value) = row.try_get::<_, Option<f32>>(column) {
        return Ok(value.map(f64::from));
    }
    if let Ok(value) = row.try_get::<_, Option<Decimal>>(column) {
        return match value {
            Some(decimal) => decimal_to_f64(decimal).map(Some).ok_or_else(|| {
                DataError::malformed(index, column, format!("NUMERIC out of range: {}", decimal))
            }),
            None => Ok(None),
        };
    }
    if let Ok(value) = row.try_get::<_, Option<i32>>(column) {
        return Ok(value.map(f64::from));
    }
    if let Ok(value) = row.try_get::<_, Option<i64>>(column) {
        return Ok(value.map(|v| v as f64));
    }
    if let Ok(value) = row.try_get::<_, Option<i16>>(column) {
        return Ok(value.map(f64::from));
    }
    match row.try_get::<_, Option<String>>(column) {
        Ok(Some(text)) => parse_number_text(&text).map(Some).ok_or_else(|| {
            DataError::malformed(index, column, format!("not a number: {:?}", text))
        }),
        Ok(None) => Ok(None),
        Err(e) => Err(DataError::malformed(index, column, e.to_string())),
    }
}

/// Nearest f64 to a NUMERIC value, rounded from its exact decimal text.
pub(crate) fn decimal_to_f64(value: Decimal) -> Option<f64> {
    parse_number_text(&value.to_string())
}

fn get_timestamp(
    index: usize,
    row: &Row,
    column: &str,
) -> Result<Option<Timestamp>, DataError> {
    if let Ok(value) = row.try_get::<_, Option<DateTime<Utc>>>(column) {
        return Ok(value);
    }
    if let Ok(value) = row.try_get::<_, Option<NaiveDateTime>>(column) {
        return Ok(value.map(|naive| naive.and_utc()));
    }
    match row.try_get::<_, Option<String>>(column) {
        Ok(Some(text)) => parse_timestamp_text(&text).map(Some).ok_or_else(|| {
            DataError::malformed(index, column, format!("not a timestamp: {:?}", text))
        }),
        Ok(None) => Ok(None),
        Err(e) => Err(DataError::malformed(index, column, e.to_string())),
    }
}

pub(crate) fn parse_number_text(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts RFC 3339 and the common `YYYY-MM-DD HH:MM:SS` form (read as UTC).
pub(crate) fn parse_timestamp_text(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_db_config_defaults() -> Result<(), ConfigError> {
        let config = DbConfig::from_lookup(lookup_from(&[]))?;
        assert_eq!(config, DbConfig::default());
        assert_eq!(config.dbname, "water_quality_management");
        assert_eq!(config.timeout, Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn test_db_config_overrides() -> Result<(), ConfigError> {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("AQUADASH_DB_HOST", "db.internal"),
            ("AQUADASH_DB_PORT", "6543"),
            ("AQUADASH_DB_PASSWORD", "secret"),
            ("AQUADASH_DB_TIMEOUT_SECS", "9"),
        ]))?;
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.password, "secret");
        assert_eq!(config.timeout, Duration::from_secs(9));
        Ok(())
    }

    #[test]
    fn test_db_config_rejects_bad_values() {
        assert!(DbConfig::from_lookup(lookup_from(&[("AQUADASH_DB_PORT", "x")])).is_err());
        assert!(
            DbConfig::from_lookup(lookup_from(&[("AQUADASH_DB_TIMEOUT_SECS", "0")])).is_err()
        );
        assert!(
            DbConfig::from_lookup(lookup_from(&[("AQUADASH_DB_SSLMODE", "sometimes")])).is_err()
        );
    }

    #[test]
    fn test_sslmode_parsing() -> Result<(), ConfigError> {
        assert_eq!(DbConfig::from_lookup(lookup_from(&[]))?.sslmode, DbSslMode::Prefer);

        let cases = [
            ("disable", DbSslMode::Disable),
            ("Prefer", DbSslMode::Prefer),
            ("allow", DbSslMode::Prefer),
            (" require ", DbSslMode::Require),
            ("verify-full", DbSslMode::Require),
        ];
        for (raw, expected) in cases {
            let config = DbConfig::from_lookup(lookup_from(&[("AQUADASH_DB_SSLMODE", raw)]))?;
            assert_eq!(config.sslmode, expected, "sslmode {:?}", raw);
        }
        assert_eq!(DbSslMode::Require.to_string(), "require");
        Ok(())
    }

    #[test]
    fn test_tls_follows_sslmode() -> Result<(), ConfigError> {
        let plain = DbConfig {
            sslmode: DbSslMode::Disable,
            ..DbConfig::default()
        };
        assert!(!PgRecordStore::new(&plain)?.uses_tls());

        let encrypted = DbConfig {
            sslmode: DbSslMode::Require,
            ..DbConfig::default()
        };
        assert!(PgRecordStore::new(&encrypted)?.uses_tls());
        Ok(())
    }

    #[test]
    fn test_decimal_to_f64() {
        let exact = |text: &str| text.parse::<Decimal>().ok().and_then(decimal_to_f64);
        assert_eq!(exact("7.25"), Some(7.25));
        assert_eq!(exact("-0.5"), Some(-0.5));
        assert_eq!(exact("361.11353072794293"), Some(361.11353072794293));
        assert_eq!(exact("300"), Some(300.0));
    }

    #[test]
    fn test_parse_timestamp_text() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).single();
        assert_eq!(parse_timestamp_text("2024-03-01 08:30:00"), expected);
        assert_eq!(parse_timestamp_text("2024-03-01T08:30:00Z"), expected);
        assert_eq!(parse_timestamp_text("2024-03-01T10:30:00+02:00"), expected);
        assert_eq!(parse_timestamp_text("yesterday"), None);
    }

    #[test]
    fn test_parse_number_text() {
        assert_eq!(parse_number_text(" 7.25 "), Some(7.25));
        assert_eq!(parse_number_text("NaN"), None);
        assert_eq!(parse_number_text("seven"), None);
    }

    #[tokio::test]
    async fn test_unreachable_database_is_store_unavailable() {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout: Duration::from_secs(1),
            ..DbConfig::default()
        };
        let store = match PgRecordStore::new(&config) {
            Ok(store) => store,
            Err(e) => panic!("store setup failed: {}", e),
        };
        match store.fetch_all().await {
            Err(aquadash_core::AquadashError::Store(StoreError::Unavailable { .. })) => {}
            other => panic!("expected StoreUnavailable, got {:?}", other.map(|t| t.len())),
        }
    }

    #[tokio::test]
    #[cfg(feature = "db-tests")]
    async fn test_fetch_all_against_live_database() -> AquadashResult<()> {
        let config = DbConfig::from_env()?;
        let store = PgRecordStore::new(&config)?;
        store.health_check().await?;
        let table = store.fetch_all().await?;
        for (index, row) in table.iter().enumerate() {
            row.validate(index)?;
        }
        Ok(())
    }

    #[tokio::test]
    #[cfg(feature = "db-tests")]
    async fn test_numeric_and_integer_columns_decode() -> AquadashResult<()> {
        let store = PgRecordStore::new(&DbConfig::from_env()?)?;
        let client = store.connect().await?;
        let row = client
            .query_one(
                "SELECT 7.25::numeric(4,2) AS \"pH\", 3::int2 AS \"Turbidity\", \
                 120::int8 AS \"Hardness\", NULL::numeric AS \"Missing\"",
                &[],
            )
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: e.to_string(),
            })?;

        assert_eq!(get_number(0, &row, "pH")?, Some(7.25));
        assert_eq!(get_number(0, &row, "Turbidity")?, Some(3.0));
        assert_eq!(get_number(0, &row, "Hardness")?, Some(120.0));
        assert_eq!(get_number(0, &row, "Missing")?, None);
        Ok(())
    }
}
