//! NCO Server - HTTP API for semantic occupation search
//!
//! This crate exposes [`matcher::SearchService`] over HTTP. It loads an embedding snapshot at
//! startup, builds the configured query encoder, and answers free-text job descriptions with
//! ranked occupations.
//!
//! # Features
//!
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging, timeouts
//! - **Configuration**: `server.{toml,yaml,json}` file plus `NCO_SERVER__*` environment variables
//! - **Metrics**: Prometheus exposition of search latency, hit counts and failures
//! - **Graceful Shutdown**: SIGTERM and Ctrl+C
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /search` - `{"query": "...", "top_k": 5}` → `{"query", "results": [{"name", "confidence", "full_description"}]}`
//! - `GET /` - Service information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe with snapshot and encoder details
//! - `GET /metrics` - Prometheus metrics
//!
//! Errors are returned as `{"error": "...", "code": "..."}`. An empty query yields
//! `400 {"error": "No query provided"}`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
