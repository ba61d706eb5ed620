use std::sync::Arc;

use crate::services::{job_store::JobStore, orchestrator::Orchestrator};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(store: Arc<JobStore>, orchestrator: Orchestrator) -> Self {
        Self {
            store,
            orchestrator: Arc::new(orchestrator),
        }
    }
}
