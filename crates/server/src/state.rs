use crate::config::ServerConfig;
use crate::error::ServerResult;
use matcher::SearchService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Search pipeline (shared across requests)
    pub service: Arc<SearchService>,

    /// Prometheus render handle; `None` when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl ServerState {
    /// Wrap an already constructed service.
    pub fn new(config: ServerConfig, service: Arc<SearchService>) -> Self {
        Self {
            config: Arc::new(config),
            service,
            metrics_handle: None,
        }
    }

    /// Load the snapshot and build the encoder described by `config`.
    pub async fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let service = SearchService::from_config(&config.service_config()).await?;
        Ok(Self::new(config, Arc::new(service)))
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

/// Server metadata for service info and readiness
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
