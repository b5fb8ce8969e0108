use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use matcher::SearchError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The request carried no usable query text.
    #[error("No query provided")]
    EmptyQuery,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Search(#[from] SearchError),

    #[error("Metrics are disabled")]
    MetricsDisabled,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// API error response body: `{"error": "...", "code": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::EmptyQuery | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Search(SearchError::InvalidTopK { .. }) => StatusCode::BAD_REQUEST,
            ServerError::Search(SearchError::Encoding(_)) => StatusCode::BAD_GATEWAY,
            ServerError::Search(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::MetricsDisabled | ServerError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::EmptyQuery => "EMPTY_QUERY",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Search(SearchError::InvalidTopK { .. }) => "INVALID_TOP_K",
            ServerError::Search(SearchError::Encoding(_)) => "ENCODING_ERROR",
            ServerError::Search(_) => "SEARCH_ERROR",
            ServerError::MetricsDisabled => "METRICS_DISABLED",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
