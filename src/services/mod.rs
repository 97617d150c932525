//! Service layer and shared application state

pub mod ingestion;
pub mod storage;

use crate::auth::TokenVerifier;
use crate::generation::Orchestrator;
use ingestion::IngestionService;
use std::sync::Arc;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub orchestrator: Arc<Orchestrator>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(
        ingestion: Arc<IngestionService>,
        orchestrator: Arc<Orchestrator>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            ingestion,
            orchestrator,
            verifier,
        }
    }
}
