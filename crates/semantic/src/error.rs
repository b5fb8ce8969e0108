use std::io;
use thiserror::Error;

/// Errors surfaced while building an encoder or encoding text.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model could not be located locally and no fallback URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// Unable to download remote assets.
    #[error("download failed: {0}")]
    Download(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime, tokenizer, or output-shape errors.
    #[error("inference failure: {0}")]
    Inference(String),
    /// The remote embedding endpoint failed or returned an unusable body.
    #[error("embedding api failure: {0}")]
    Api(String),
    /// The circuit breaker is rejecting calls to the named provider.
    #[error("circuit breaker is open for provider '{0}'")]
    CircuitOpen(String),
    /// The inference worker thread has stopped.
    #[error("encoder worker unavailable")]
    WorkerUnavailable,
}

impl SemanticError {
    /// Short machine-readable kind, used for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            SemanticError::ModelNotFound(_) => "model_not_found",
            SemanticError::TokenizerMissing(_) => "tokenizer_missing",
            SemanticError::InvalidConfig(_) => "invalid_config",
            SemanticError::Download(_) => "download",
            SemanticError::Io(_) => "io",
            SemanticError::Inference(_) => "inference",
            SemanticError::Api(_) => "api",
            SemanticError::CircuitOpen(_) => "circuit_open",
            SemanticError::WorkerUnavailable => "worker_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_model_not_found() {
        let err = SemanticError::ModelNotFound("/path/to/model.onnx".into());
        assert!(err.to_string().contains("model file not found"));
        assert!(err.to_string().contains("/path/to/model.onnx"));
        assert_eq!(err.kind(), "model_not_found");
    }

    #[test]
    fn error_circuit_open_names_provider() {
        let err = SemanticError::CircuitOpen("hf".into());
        assert_eq!(err.to_string(), "circuit breaker is open for provider 'hf'");
    }

    #[test]
    fn error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SemanticError = io_err.into();
        assert!(matches!(err, SemanticError::Io(_)));
        assert_eq!(err.kind(), "io");
    }
}
