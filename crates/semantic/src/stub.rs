use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::{Encoder, SemanticConfig, SemanticError};

/// Vector length used by the stub for each tier name.
pub(crate) fn tier_dimension(tier: &str) -> usize {
    match tier {
        "fast" => 384,
        "accurate" => 1024,
        _ => 768,
    }
}

/// Deterministic feature-hashing encoder used when `mode` is `"fast"`.
///
/// Every lowercased alphanumeric word is hashed into one bucket of the output vector, so texts
/// that share words get a positive cosine similarity and unrelated texts land near zero. No
/// model files are needed, which makes it the encoder of choice for tests and smoke runs.
#[derive(Debug, Clone)]
pub struct StubEncoder {
    model_name: String,
    dimension: usize,
    normalize: bool,
}

impl StubEncoder {
    pub fn new(cfg: &SemanticConfig) -> Self {
        Self {
            model_name: cfg.model_name.clone(),
            dimension: tier_dimension(&cfg.tier),
            normalize: cfg.normalize,
        }
    }

    /// Stub with an explicit vector length (at least 1).
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            model_name: format!("stub-{dimension}"),
            dimension: dimension.max(1),
            normalize: true,
        }
    }

    /// Encodes a single text. The empty string maps to the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (hash64(token.as_bytes()) % self.dimension as u64) as usize;
            v[bucket] += 1.0;
        }
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        v
    }
}

#[async_trait]
impl Encoder for StubEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}
