use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resilience::{CircuitBreakerConfig, RetryConfig};

/// Runtime configuration describing which encoder to build and how to post-process vectors.
///
/// # Example
/// ```no_run
/// use semantic::{build_encoder, SemanticConfig};
///
/// # async fn run() -> Result<(), semantic::SemanticError> {
/// let cfg = SemanticConfig {
///     mode: "api".into(),
///     api_url: Some("https://router.huggingface.co/hf-inference/models/sentence-transformers/all-mpnet-base-v2/pipeline/feature-extraction".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     ..Default::default()
/// };
///
/// let encoder = build_encoder(&cfg).await?;
/// let vectors = encoder.encode(&["registered nurse".to_string()]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Encoder selector: `"onnx"` (local), `"api"` (remote HTTP), or `"fast"` (hashing stub).
    pub mode: String,
    /// Size class for the stub encoder: `"fast"` (384), `"balanced"` (768), `"accurate"` (1024).
    pub tier: String,
    /// Friendly label surfaced by [`Encoder::model_name`](crate::Encoder::model_name).
    pub model_name: String,
    /// Local path where the ONNX file should live (also used as the download target when
    /// [`model_url`](Self::model_url) is provided).
    pub model_path: PathBuf,
    /// Optional HTTPS URL that will be downloaded when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`. When absent and [`tokenizer_url`](Self::tokenizer_url) is provided we
    /// infer the filename from the URL and place it next to the model file.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional HTTPS URL for fetching the tokenizer on-demand.
    pub tokenizer_url: Option<String>,
    /// Tokens beyond this length are truncated before inference.
    pub max_sequence_length: usize,
    /// How token embeddings are reduced to one vector: `"mean"` (default) or `"cls"`.
    pub pooling_strategy: String,
    /// API inference endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Expected vector length for API mode. When unset the encoder probes the endpoint once.
    pub api_dimension: Option<usize>,
    /// Normalize the resulting vector to unit-length.
    pub normalize: bool,
    /// Number of texts sent to the model per call when encoding large collections.
    pub batch_size: usize,
    /// Retry configuration for API calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    /// Circuit breaker configuration for API calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
    /// Whether API calls go through retry and the circuit breaker.
    pub enable_resilience: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "onnx".into(),
            tier: "balanced".into(),
            model_name: "all-mpnet-base-v2".into(),
            model_path: PathBuf::from("./models/all-mpnet-base-v2/onnx/model.onnx"),
            model_url: None,
            tokenizer_path: Some(PathBuf::from("./models/all-mpnet-base-v2/tokenizer.json")),
            tokenizer_url: None,
            max_sequence_length: 384,
            pooling_strategy: "mean".into(),
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            api_dimension: None,
            normalize: true,
            batch_size: 16,
            retry_config: None,
            circuit_breaker_config: None,
            enable_resilience: true,
        }
    }
}

impl SemanticConfig {
    /// Config for the deterministic hashing encoder at the given tier.
    pub fn stub(tier: &str) -> Self {
        Self {
            mode: "fast".into(),
            tier: tier.into(),
            model_name: format!("stub-{tier}"),
            ..Self::default()
        }
    }

    /// Switches the encoder mode and keeps `model_name` consistent with it.
    ///
    /// Moving to `"fast"` labels the encoder `stub-<tier>`; moving away from it restores the
    /// default model label. Other fields are kept as configured.
    pub fn with_mode(mut self, mode: &str) -> Self {
        if self.mode == mode {
            return self;
        }
        if mode == "fast" {
            self.model_name = format!("stub-{}", self.tier);
        } else if self.mode == "fast" {
            self.model_name = Self::default().model_name;
        }
        self.mode = mode.into();
        self
    }

    /// Checks the combinations that cannot work regardless of mode.
    pub fn validate(&self) -> Result<(), crate::SemanticError> {
        if self.batch_size == 0 {
            return Err(crate::SemanticError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.mode == "api" && self.api_url.is_none() {
            return Err(crate::SemanticError::InvalidConfig(
                "api_url is required for api mode".into(),
            ));
        }
        if self.mode == "onnx" && self.max_sequence_length == 0 {
            return Err(crate::SemanticError::InvalidConfig(
                "max_sequence_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
