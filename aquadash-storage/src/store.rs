//! Record store abstraction.
//!
//! The authoritative source of observations. The production implementation
//! talks to Postgres and lives in `aquadash-api`; tests substitute fakes.

use async_trait::async_trait;
use aquadash_core::{AquadashResult, ObservationTable};

/// Read-only access to the full observation table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every observation row.
    ///
    /// Fails with `StoreError::Unavailable` when the store cannot be reached
    /// or the query fails, and with `DataError::MalformedRow` when a row does
    /// not match the expected schema. Each call is independent; no session
    /// state carries over between calls.
    async fn fetch_all(&self) -> AquadashResult<ObservationTable>;

    /// Cheap reachability probe used by readiness checks.
    ///
    /// The default performs a full fetch; implementations with a cheaper
    /// query should override it.
    async fn health_check(&self) -> AquadashResult<()> {
        self.fetch_all().await.map(|_| ())
    }

    /// Short name for logs.
    fn name(&self) -> &'static str {
        "record-store"
    }
}
