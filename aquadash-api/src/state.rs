//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use aquadash_storage::{DataRefreshOrchestrator, RecordStore};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Cache-first reader every data route goes through.
    pub orchestrator: DataRefreshOrchestrator,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: DataRefreshOrchestrator) -> Self {
        Self {
            orchestrator,
            start_time: Instant::now(),
        }
    }

    /// Record store behind the orchestrator, for readiness probes.
    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(self.orchestrator.store())
    }
}

crate::impl_from_ref!(DataRefreshOrchestrator, orchestrator);
crate::impl_from_ref!(Instant, start_time);
