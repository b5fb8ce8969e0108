use std::sync::Arc;
use std::time::Instant;

use index::{EmbeddingStore, LoadError};
use semantic::{build_encoder, Encoder, SemanticError};

use crate::expand::QueryExpander;
use crate::metrics::metrics_recorder;
use crate::rank::{RankedResult, SimilarityRanker};
use crate::types::{SearchConfig, SearchError, ServiceConfig};

#[cfg(test)]
mod tests;

/// Query expansion, encoding and ranking over one embedding store.
///
/// The store and encoder are fixed at construction and only read afterwards, so a service can be
/// shared behind an `Arc` and searched concurrently.
pub struct SearchService {
    store: Arc<EmbeddingStore>,
    encoder: Arc<dyn Encoder>,
    expander: QueryExpander,
    ranker: SimilarityRanker,
    config: SearchConfig,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("occupations", &self.store.len())
            .field("dimension", &self.store.dimension())
            .field("model", &self.encoder.model_name())
            .field("config", &self.config)
            .finish()
    }
}

impl SearchService {
    /// Wires an already loaded store and encoder together.
    ///
    /// Fails when the config is invalid or when the encoder reports a dimension different from
    /// the store's (the mismatch is reported against the first stored embedding).
    pub fn new(
        store: Arc<EmbeddingStore>,
        encoder: Arc<dyn Encoder>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        if let Some(dimension) = encoder.dimension() {
            if dimension != store.dimension() {
                return Err(SearchError::Load(LoadError::DimensionMismatch {
                    index: 0,
                    expected: dimension,
                    found: store.dimension(),
                }));
            }
        }

        if let Some(snapshot_model) = store.model_name() {
            if snapshot_model != encoder.model_name() {
                tracing::warn!(
                    snapshot_model,
                    encoder_model = encoder.model_name(),
                    "snapshot was built with a different model than the query encoder"
                );
            }
        }

        Ok(Self {
            expander: config.expander(),
            ranker: SimilarityRanker::new(config.boost_factor),
            store,
            encoder,
            config,
        })
    }

    /// Loads the snapshot and builds the configured encoder. Nothing is initialized lazily.
    pub async fn from_config(cfg: &ServiceConfig) -> Result<Self, SearchError> {
        let store = EmbeddingStore::load(&cfg.snapshot_path)?;
        let encoder = build_encoder(&cfg.semantic).await?;
        Self::new(Arc::new(store), encoder, cfg.search.clone())
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn expander(&self) -> &QueryExpander {
        &self.expander
    }

    /// Searches with [`SearchConfig::default_top_k`].
    pub async fn search_default(&self, query: &str) -> Result<Vec<RankedResult<'_>>, SearchError> {
        self.search(query, self.config.default_top_k).await
    }

    /// The `top_k` best matching occupations for `query`, highest confidence first.
    ///
    /// Any encoder failure fails the whole search; there are no partial results. `top_k` is not
    /// bounded here, see [`SearchConfig::validate_top_k`] for the caller-facing limit.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RankedResult<'_>>, SearchError> {
        let start = Instant::now();
        let outcome = self.run(query, top_k).await;
        let latency = start.elapsed();

        match &outcome {
            Ok((variant_count, hits)) => {
                tracing::debug!(
                    query,
                    variants = variant_count,
                    hits = hits.len(),
                    top_confidence = hits.first().map(|hit| hit.confidence),
                    latency_ms = latency.as_secs_f64() * 1000.0,
                    "search completed"
                );
                if let Some(recorder) = metrics_recorder() {
                    recorder.record_search(*variant_count, latency, hits.len());
                }
            }
            Err(err) => {
                tracing::warn!(query, error = %err, kind = err.kind(), "search failed");
                if let Some(recorder) = metrics_recorder() {
                    recorder.record_failure(err.kind());
                }
            }
        }

        outcome.map(|(_, hits)| hits)
    }

    async fn run(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<(usize, Vec<RankedResult<'_>>), SearchError> {
        if top_k == 0 {
            return Ok((0, Vec::new()));
        }

        let variants = self.expander.expand(query);
        let vectors = self.encoder.encode(&variants).await?;

        if vectors.len() != variants.len() {
            return Err(SearchError::Encoding(SemanticError::Inference(format!(
                "encoder returned {} vectors for {} query variants",
                vectors.len(),
                variants.len()
            ))));
        }
        let expected = self.store.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(SearchError::Encoding(SemanticError::Inference(format!(
                "encoder returned a {}-dimensional vector, store expects {expected}",
                bad.len()
            ))));
        }

        let hits = self.ranker.rank(&vectors, &self.store, top_k);
        Ok((variants.len(), hits))
    }
}
