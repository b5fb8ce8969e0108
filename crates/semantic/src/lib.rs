//! Text encoders for occupation search.
//!
//! Everything here turns text into dense vectors. The rest of the workspace only sees the
//! [`Encoder`] trait, so the backing model can be swapped by configuration:
//!
//! - **ONNX mode** (`"onnx"`) - runs a sentence-transformer export locally. The model is loaded
//!   once, up front, on a dedicated inference thread.
//! - **API mode** (`"api"`) - calls a remote feature-extraction endpoint (Hugging Face,
//!   OpenAI-compatible or a custom JSON shape) with retry and a circuit breaker.
//! - **Fast mode** (`"fast"`) - deterministic feature hashing. No files, no network. Good for
//!   tests and for smoke-testing a snapshot.
//!
//! Unlike a best-effort embedder there is no silent fallback: if the model files are missing the
//! encoder fails to build. A search index built with one model is meaningless when queried with
//! another.
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{build_encoder, SemanticConfig};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), semantic::SemanticError> {
//!     let cfg = SemanticConfig {
//!         model_path: PathBuf::from("models/all-mpnet-base-v2/onnx/model.onnx"),
//!         tokenizer_path: Some(PathBuf::from("models/all-mpnet-base-v2/tokenizer.json")),
//!         ..Default::default()
//!     };
//!
//!     let encoder = build_encoder(&cfg).await?;
//!     let vectors = encoder.encode(&["software engineer".to_string()]).await?;
//!     assert_eq!(Some(vectors[0].len()), encoder.dimension());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod resilience;
mod serde_millis;

mod api;
mod assets;
mod normalize;
mod onnx;
mod stub;

use async_trait::async_trait;
use std::sync::Arc;

pub use crate::api::ApiEncoder;
pub use crate::config::SemanticConfig;
pub use crate::error::SemanticError;
pub use crate::onnx::OnnxEncoder;
pub use crate::resilience::{CircuitBreakerConfig, RetryConfig};
pub use crate::stub::StubEncoder;

/// Maps a batch of texts to embedding vectors.
///
/// Implementations return exactly one vector per input, in input order, and are deterministic
/// for a fixed model. They are shared across request handlers, hence `Send + Sync`.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Identifier of the model producing the vectors.
    fn model_name(&self) -> &str;

    /// Vector length, when known without encoding anything.
    fn dimension(&self) -> Option<usize>;

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError>;
}

/// Builds the encoder selected by `cfg.mode`.
///
/// ONNX encoders load their model before returning; API encoders probe the endpoint once when no
/// `api_dimension` is configured.
pub async fn build_encoder(cfg: &SemanticConfig) -> Result<Arc<dyn Encoder>, SemanticError> {
    cfg.validate()?;
    let encoder: Arc<dyn Encoder> = match cfg.mode.as_str() {
        "fast" => Arc::new(StubEncoder::new(cfg)),
        "onnx" => Arc::new(OnnxEncoder::load(cfg).await?),
        "api" => Arc::new(ApiEncoder::connect(cfg).await?),
        other => {
            return Err(SemanticError::InvalidConfig(format!(
                "unknown encoder mode '{other}' (expected onnx, api or fast)"
            )))
        }
    };

    tracing::info!(
        mode = %cfg.mode,
        model = encoder.model_name(),
        dimension = ?encoder.dimension(),
        "encoder ready"
    );
    Ok(encoder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_fast_encoder() {
        let encoder = build_encoder(&SemanticConfig::stub("fast")).await.unwrap();
        assert_eq!(encoder.model_name(), "stub-fast");
        assert_eq!(encoder.dimension(), Some(384));

        let texts = vec!["nurse".to_string(), "electrician".to_string()];
        let vectors = encoder.encode(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 384));
    }

    #[tokio::test]
    async fn build_rejects_unknown_mode() {
        let cfg = SemanticConfig {
            mode: "gpu".into(),
            ..SemanticConfig::default()
        };
        match build_encoder(&cfg).await {
            Err(SemanticError::InvalidConfig(msg)) => assert!(msg.contains("gpu")),
            other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn build_onnx_without_model_fails() {
        let cfg = SemanticConfig {
            model_path: "./missing/model.onnx".into(),
            ..SemanticConfig::default()
        };
        assert!(matches!(
            build_encoder(&cfg).await,
            Err(SemanticError::ModelNotFound(_))
        ));
    }

    #[tokio::test]
    async fn build_api_with_known_dimension_skips_probe() {
        let cfg = SemanticConfig {
            mode: "api".into(),
            api_url: Some("http://127.0.0.1:9/embed".into()),
            api_dimension: Some(768),
            ..SemanticConfig::default()
        };
        let encoder = build_encoder(&cfg).await.unwrap();
        assert_eq!(encoder.dimension(), Some(768));
    }

    #[tokio::test]
    async fn trait_objects_are_shareable() {
        let encoder: Arc<dyn Encoder> = Arc::new(StubEncoder::with_dimension(8));
        let cloned = Arc::clone(&encoder);
        let handle = tokio::spawn(async move {
            cloned.encode(&["chef".to_string()]).await.map(|v| v.len())
        });
        assert_eq!(handle.await.unwrap().unwrap(), 1);
    }
}
