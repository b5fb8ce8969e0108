use std::path::PathBuf;

use index::LoadError;
use semantic::{SemanticConfig, SemanticError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expand::{QueryExpander, SynonymEntry, SynonymTable};
use crate::rank::DEFAULT_BOOST_FACTOR;

/// Tuning knobs for [`SearchService`](crate::SearchService).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Multiplier applied to fused similarities before clamping to `[0, 1]`.
    pub boost_factor: f32,
    /// `top_k` used by [`SearchService::search_default`](crate::SearchService::search_default).
    pub default_top_k: usize,
    /// Largest `top_k` accepted by [`SearchConfig::validate_top_k`].
    pub max_top_k: usize,
    /// When false, only the verbatim query is encoded.
    pub expand_queries: bool,
    /// Replaces the built-in synonym table when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<SynonymEntry>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            boost_factor: DEFAULT_BOOST_FACTOR,
            default_top_k: 5,
            max_top_k: 100,
            expand_queries: true,
            synonyms: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.boost_factor.is_finite() || self.boost_factor <= 0.0 {
            return Err(SearchError::InvalidConfig(
                "boost_factor must be a positive finite number".into(),
            ));
        }
        if self.default_top_k == 0 {
            return Err(SearchError::InvalidConfig(
                "default_top_k must be greater than zero".into(),
            ));
        }
        if self.max_top_k < self.default_top_k {
            return Err(SearchError::InvalidConfig(
                "max_top_k must be >= default_top_k".into(),
            ));
        }
        Ok(())
    }

    /// Resolves a caller-supplied `top_k`: `None` means the default; zero or anything above
    /// `max_top_k` is rejected.
    pub fn validate_top_k(&self, requested: Option<usize>) -> Result<usize, SearchError> {
        let top_k = requested.unwrap_or(self.default_top_k);
        if top_k == 0 || top_k > self.max_top_k {
            return Err(SearchError::InvalidTopK {
                requested: top_k,
                max: self.max_top_k,
            });
        }
        Ok(top_k)
    }

    pub(crate) fn expander(&self) -> QueryExpander {
        if !self.expand_queries {
            return QueryExpander::disabled();
        }
        match &self.synonyms {
            Some(entries) => QueryExpander::new(SynonymTable::new(entries.iter().cloned())),
            None => QueryExpander::default(),
        }
    }
}

/// Everything needed to build a [`SearchService`](crate::SearchService) from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Snapshot file (`.json`, or bincode+zstd for any other extension).
    pub snapshot_path: PathBuf,
    pub semantic: SemanticConfig,
    pub search: SearchConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/nco_embeddings.snap"),
            semantic: SemanticConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("snapshot load failed: {0}")]
    Load(#[from] LoadError),
    #[error("encoding failed: {0}")]
    Encoding(#[from] SemanticError),
    #[error("invalid search config: {0}")]
    InvalidConfig(String),
    #[error("top_k must be between 1 and {max}, got {requested}")]
    InvalidTopK { requested: usize, max: usize },
}

impl SearchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Load(_) => "load",
            SearchError::Encoding(_) => "encoding",
            SearchError::InvalidConfig(_) => "invalid_config",
            SearchError::InvalidTopK { .. } => "invalid_top_k",
        }
    }
}
