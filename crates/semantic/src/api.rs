use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::normalize::normalize_all;
use crate::resilience::{
    execute_with_retry_async, is_retryable_error, CircuitBreaker, RetryConfig,
};
use crate::{Encoder, SemanticConfig, SemanticError};

const PROBE_TEXT: &str = "dimension probe";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

impl ApiProviderKind {
    fn from_config(cfg: &SemanticConfig) -> Self {
        match provider_name(cfg).as_str() {
            "hf" | "huggingface" => Self::HuggingFace,
            "openai" | "gpt" => Self::OpenAI,
            _ => Self::Custom,
        }
    }
}

fn provider_name(cfg: &SemanticConfig) -> String {
    cfg.api_provider
        .as_deref()
        .unwrap_or("custom")
        .to_ascii_lowercase()
}

/// Encoder backed by a remote feature-extraction endpoint.
///
/// Every call to [`Encoder::encode`] is one HTTP request carrying the whole batch. With
/// `enable_resilience` the request is retried with exponential backoff on transient failures and
/// guarded by a circuit breaker that fails fast while the endpoint is down.
#[derive(Debug)]
pub struct ApiEncoder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProviderKind,
    provider_name: String,
    model_name: String,
    normalize: bool,
    dimension: Option<usize>,
    retry: Option<RetryConfig>,
    breaker: Option<CircuitBreaker>,
}

impl ApiEncoder {
    /// Builds the encoder without contacting the endpoint. The dimension is only known when
    /// `api_dimension` is configured.
    pub fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32);
        if let Some(secs) = cfg.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;

        let (retry, breaker) = if cfg.enable_resilience {
            (
                Some(cfg.retry_config.unwrap_or_default()),
                Some(CircuitBreaker::new(
                    cfg.circuit_breaker_config.unwrap_or_default(),
                )),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            client,
            url,
            auth_header: cfg.api_auth_header.clone(),
            provider: ApiProviderKind::from_config(cfg),
            provider_name: provider_name(cfg),
            model_name: cfg.model_name.clone(),
            normalize: cfg.normalize,
            dimension: cfg.api_dimension,
            retry,
            breaker,
        })
    }

    /// Builds the encoder and, when no dimension is configured, learns it from one probe call.
    pub async fn connect(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        let mut encoder = Self::new(cfg)?;
        if encoder.dimension.is_none() {
            let probe = encoder.encode(&[PROBE_TEXT.to_string()]).await?;
            let dimension = probe.first().map(Vec::len).unwrap_or(0);
            if dimension == 0 {
                return Err(SemanticError::Api(
                    "endpoint returned an empty probe embedding".into(),
                ));
            }
            tracing::info!(
                provider = %encoder.provider_name,
                dimension,
                "probed api encoder dimension"
            );
            encoder.dimension = Some(dimension);
        }
        Ok(encoder)
    }

    async fn send(&self, payload: &Value) -> Result<Value, SemanticError> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SemanticError::Api(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Api(format!("HTTP {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SemanticError::Api(format!("invalid JSON response: {e}")))
    }

    async fn send_with_retry(&self, payload: &Value) -> Result<Value, SemanticError> {
        let Some(retry) = &self.retry else {
            return self.send(payload).await;
        };

        let outcome = execute_with_retry_async(
            retry,
            |err: &SemanticError| {
                matches!(err, SemanticError::Api(_)) && is_retryable_error(&err.to_string())
            },
            |_attempt| self.send(payload),
        )
        .await;

        if outcome.attempts > 1 {
            tracing::debug!(
                provider = %self.provider_name,
                attempts = outcome.attempts,
                elapsed_ms = outcome.total_duration.as_millis() as u64,
                "api encoder request finished after retries"
            );
        }
        outcome.into_result()
    }
}

#[async_trait]
impl Encoder for ApiEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(breaker) = &self.breaker {
            if !breaker.allow_request() {
                return Err(SemanticError::CircuitOpen(self.provider_name.clone()));
            }
        }

        let payload = build_api_payload(self.provider, texts, &self.model_name);
        let result = self
            .send_with_retry(&payload)
            .await
            .and_then(parse_embeddings_from_value);

        if let Some(breaker) = &self.breaker {
            match &result {
                Ok(_) => breaker.record_success(),
                Err(_) => breaker.record_failure(),
            }
        }

        let mut vectors = result?;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Api(format!(
                "endpoint returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        normalize_all(&mut vectors, self.normalize);
        Ok(vectors)
    }
}

fn build_api_payload(provider: ApiProviderKind, texts: &[String], model_name: &str) -> Value {
    match provider {
        ApiProviderKind::HuggingFace => json!({ "inputs": texts }),
        ApiProviderKind::OpenAI => json!({ "input": texts, "model": model_name }),
        ApiProviderKind::Custom => json!({ "texts": texts }),
    }
}

/// Accepts `[[..], ..]`, a bare `[..]`, `{"embeddings": ..}` and OpenAI's `{"data": [{"embedding": ..}]}`.
fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::Api("missing `embedding` field in data item".into())
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(SemanticError::Api(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }

            Err(SemanticError::Api("unsupported API response shape".into()))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Api("non-finite embedding value".into())),
                other => Err(SemanticError::Api(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Api(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}
