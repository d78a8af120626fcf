use crate::config::ServerConfig;
use normalize::Normalizer;
use photomod::Orchestrator;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Pipeline entry point (shared across requests)
    pub orchestrator: Orchestrator,
}

impl ServerState {
    /// Create new server state with real collaborators
    pub fn new(config: ServerConfig) -> Self {
        let orchestrator = Orchestrator::new(config.pipeline.clone());
        Self::with_orchestrator(config, orchestrator)
    }

    /// Create state around a pre-built orchestrator
    pub fn with_orchestrator(config: ServerConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        self.orchestrator.normalizer()
    }

    pub fn max_image_bytes(&self) -> usize {
        self.orchestrator.config().max_image_bytes
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
