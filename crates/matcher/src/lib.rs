//! # Occupation matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` turns a free-text job description into a ranked list of occupations. It sits
//! between the encoders (`semantic`) and the embedding store (`index`):
//!
//! 1. [`QueryExpander`] produces query variants: the query itself, synonyms of the first
//!    matching synonym key, and for multi-word queries each lowercased word.
//! 2. The configured [`Encoder`](semantic::Encoder) embeds every variant.
//! 3. [`SimilarityRanker`] takes, per occupation, the best cosine similarity over all
//!    variants, multiplies it by the boost factor, clamps to `[0, 1]` and keeps the top `k`.
//!
//! ## Core Types
//!
//! - [`SearchService`]: the composed pipeline; shareable across tasks.
//! - [`SearchConfig`]: boost factor, default/maximum `top_k`, expansion switch, synonyms.
//! - [`ServiceConfig`]: snapshot path plus encoder and search settings, for
//!   [`SearchService::from_config`].
//! - [`RankedResult`]: occupation reference with `confidence` and `confidence_percent`.
//! - [`SearchError`]: load, encoding and configuration failures.
//!
//! ## Example Usage
//!
//! ```no_run
//! use matcher::{SearchService, ServiceConfig};
//!
//! # async fn run() -> Result<(), matcher::SearchError> {
//! let cfg = ServiceConfig {
//!     snapshot_path: "data/nco_embeddings.snap".into(),
//!     ..ServiceConfig::default()
//! };
//! let service = SearchService::from_config(&cfg).await?;
//!
//! for hit in service.search("sewing machine operator", 5).await? {
//!     println!("{:>6.2}%  {}", hit.confidence_percent, hit.occupation.display_text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Install a [`SearchMetrics`] implementation via [`set_search_metrics`] to record
//! per-search latency, variant and hit counts, and failure kinds. This is typically done once
//! during service startup.

pub mod build;
pub mod expand;
pub mod metrics;
pub mod rank;
pub mod service;
pub mod types;

pub use crate::build::{build_snapshot, parse_occupations};
pub use crate::expand::{QueryExpander, SynonymEntry, SynonymTable};
pub use crate::metrics::{set_search_metrics, SearchMetrics};
pub use crate::rank::{cosine_similarity, RankedResult, SimilarityRanker, DEFAULT_BOOST_FACTOR};
pub use crate::service::SearchService;
pub use crate::types::{SearchConfig, SearchError, ServiceConfig};
