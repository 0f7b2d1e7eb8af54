//! Redis-backed cache implementation.
//!
//! Uses a multiplexed async connection from the `redis` crate. TLS is
//! selected by the URL scheme (`rediss://`). The connection is opened
//! lazily on first use and dropped after any command error so the next
//! request reconnects; a Redis outage therefore never blocks startup.
//!
//! Expiry is delegated to the server (`SET key value EX ttl`).

use std::time::Duration;

use aquadash_core::CacheError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex;

use super::traits::CacheBackend;

/// Redis cache backend.
pub struct RedisCacheBackend {
    client: Client,
    connection: Mutex<Option<MultiplexedConnection>>,
}

fn unavailable(err: redis::RedisError) -> CacheError {
    CacheError::Unavailable {
        reason: err.to_string(),
    }
}

impl RedisCacheBackend {
    /// Create a backend for `url` without connecting yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(unavailable)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self) {
        *self.connection.lock().await = None;
    }

    async fn on_error<T>(&self, err: redis::RedisError) -> Result<T, CacheError> {
        self.reset().await;
        Err(unavailable(err))
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => Ok(value),
            Err(e) => self.on_error(e).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // Redis rejects EX 0; sub-second TTLs round up to the smallest unit.
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.connection().await?;
        match conn.set_ex::<_, _, ()>(key, value, seconds).await {
            Ok(()) => Ok(()),
            Err(e) => self.on_error(e).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        match conn.del::<_, ()>(key).await {
            Ok(()) => Ok(()),
            Err(e) => self.on_error(e).await,
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(RedisCacheBackend::new("not a url").is_err());
    }

    #[test]
    fn test_tls_url_is_accepted() {
        assert!(RedisCacheBackend::new("rediss://cache.example.net:6380").is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_unavailable() {
        // Port 1 on localhost is reserved and refuses connections.
        let backend = match RedisCacheBackend::new("redis://127.0.0.1:1/") {
            Ok(backend) => backend,
            Err(e) => panic!("URL should parse: {}", e),
        };
        match backend.get("water_quality_data").await {
            Err(CacheError::Unavailable { .. }) => {}
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    #[cfg(feature = "redis-tests")]
    async fn test_live_round_trip() -> Result<(), CacheError> {
        let url = std::env::var("AQUADASH_CACHE_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string());
        let backend = RedisCacheBackend::new(&url)?;
        backend
            .set("aquadash:test:key", "payload", Duration::from_secs(5))
            .await?;
        assert_eq!(
            backend.get("aquadash:test:key").await?,
            Some("payload".to_string())
        );
        backend.delete("aquadash:test:key").await?;
        assert_eq!(backend.get("aquadash:test:key").await?, None);
        Ok(())
    }
}
