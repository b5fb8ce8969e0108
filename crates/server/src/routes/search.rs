use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use matcher::RankedResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Missing and `null` are both treated as an empty query.
    #[serde(default)]
    pub query: Option<String>,
    /// Falls back to the configured `default_top_k`.
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// One ranked occupation as returned to clients.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Truncated display text.
    pub name: String,
    /// Percentage with two decimals.
    pub confidence: f64,
    pub full_description: String,
}

impl From<&RankedResult<'_>> for SearchHit {
    fn from(result: &RankedResult<'_>) -> Self {
        Self {
            name: result.occupation.display_text.clone(),
            confidence: result.confidence_percent,
            full_description: result.occupation.full_text.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// `POST /search`
///
/// ```json
/// {"query": "sewing machine operator", "top_k": 5}
/// ```
///
/// Whitespace-only queries are rejected as empty, like missing or `null` ones.
pub async fn search(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ServerResult<Json<SearchResponse>> {
    let Json(request) = payload.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;

    let query = match request.query {
        Some(query) if !query.trim().is_empty() => query,
        _ => return Err(ServerError::EmptyQuery),
    };

    let top_k = state.service.config().validate_top_k(request.top_k)?;
    let results = state.service.search(&query, top_k).await?;

    tracing::debug!(top_k, hits = results.len(), "search served");

    Ok(Json(SearchResponse {
        results: results.iter().map(SearchHit::from).collect(),
        query,
    }))
}
