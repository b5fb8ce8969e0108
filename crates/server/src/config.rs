use matcher::{SearchConfig, ServiceConfig};
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,

    /// Enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log filter directive (`RUST_LOG` syntax)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Serve Prometheus metrics on `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Embedding snapshot loaded at startup
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Query encoder settings
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Ranking and expansion settings
    #[serde(default)]
    pub search: SearchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_kb: default_max_body_size_kb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            snapshot_path: default_snapshot_path(),
            semantic: SemanticConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.{toml,yaml,json}` file and
    /// `NCO_SERVER__*` environment variables (nested keys use `__`, e.g.
    /// `NCO_SERVER__SEMANTIC__MODE=fast`).
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("NCO_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.search.validate()?;
        config.semantic.validate()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }

    /// The search service part of the configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            snapshot_path: self.snapshot_path.clone(),
            semantic: self.semantic.clone(),
            search: self.search.clone(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_kb() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_snapshot_path() -> PathBuf {
    ServiceConfig::default().snapshot_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_size(), 64 * 1024);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.search.default_top_k, 5);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_nested_sections_from_json() {
        let cfg: ServerConfig = serde_json::from_str(
            r#"{
                "port": 8081,
                "snapshot_path": "data/test.json",
                "semantic": {"mode": "fast", "tier": "fast"},
                "search": {"max_top_k": 25}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.semantic.mode, "fast");
        assert_eq!(cfg.search.max_top_k, 25);
        assert_eq!(cfg.search.boost_factor, 1.2);

        let service = cfg.service_config();
        assert_eq!(service.snapshot_path, PathBuf::from("data/test.json"));
        assert_eq!(service.search.max_top_k, 25);
    }
}
