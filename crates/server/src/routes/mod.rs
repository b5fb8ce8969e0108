//! API route handlers
//!
//! - `search`: occupation search
//! - `health`: liveness, readiness and metrics

pub mod health;
pub mod search;

use crate::error::ServerError;
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Service info (`GET /`).
///
/// ```json
/// {
///   "name": "NCO Search",
///   "version": "0.1.0",
///   "occupations": 3600,
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let metadata = ServerMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: health::uptime_seconds(),
    };

    Json(json!({
        "name": "NCO Search",
        "version": metadata.version,
        "uptime_seconds": metadata.uptime_seconds,
        "occupations": state.service.store().len(),
        "endpoints": [
            "POST /search",
            "/health",
            "/ready",
            "/metrics"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
