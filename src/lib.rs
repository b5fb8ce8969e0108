//! Workspace umbrella crate for semantic occupation search.
//!
//! This crate stitches the encoder (`semantic`), the embedding store (`index`) and the
//! search pipeline (`matcher`) together so callers can build a snapshot from an occupation
//! list and search it through a single API entry point.

pub mod config;

pub use config::{BuildYamlConfig, ConfigLoadError, NcoConfig};
pub use index::{
    display_text, EmbeddingSnapshot, EmbeddingStore, LoadError, OccupationEntry,
    SnapshotFormat, DISPLAY_CHAR_LIMIT,
};
pub use matcher::{
    build_snapshot, cosine_similarity, parse_occupations, set_search_metrics, QueryExpander,
    RankedResult, SearchConfig, SearchError, SearchMetrics, SearchService, ServiceConfig,
    SimilarityRanker, SynonymEntry, SynonymTable, DEFAULT_BOOST_FACTOR,
};
pub use semantic::{build_encoder, Encoder, SemanticConfig, SemanticError, StubEncoder};

#[cfg(feature = "server")]
pub use server::{build_router, start_server, ServerConfig, ServerError, ServerState};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the file-level helpers of this crate.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no occupations found in {0}")]
    NoOccupations(PathBuf),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// What [`build_snapshot_file`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub occupations: usize,
    pub dimension: usize,
    pub model_name: String,
    pub output: PathBuf,
}

/// Reads an occupation list, encodes it with the configured encoder and writes a validated
/// snapshot to `output` (JSON for `.json`, compressed binary otherwise).
pub async fn build_snapshot_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    semantic: &SemanticConfig,
    batch_size: usize,
) -> Result<BuildSummary, PipelineError> {
    let input = input.as_ref();
    let output = output.as_ref();

    let text = fs::read_to_string(input).map_err(|source| PipelineError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let occupations = parse_occupations(&text);
    if occupations.is_empty() {
        return Err(PipelineError::NoOccupations(input.to_path_buf()));
    }
    tracing::info!(
        occupations = occupations.len(),
        input = %input.display(),
        "parsed occupation list"
    );

    let encoder = build_encoder(semantic).await?;
    let snapshot = build_snapshot(encoder.as_ref(), occupations, batch_size).await?;

    // Round-trip through the store so an inconsistent encoder never produces a file.
    let store = EmbeddingStore::from_snapshot(snapshot)?;
    store.save(output)?;

    tracing::info!(
        occupations = store.len(),
        dimension = store.dimension(),
        output = %output.display(),
        "snapshot written"
    );

    Ok(BuildSummary {
        occupations: store.len(),
        dimension: store.dimension(),
        model_name: encoder.model_name().to_string(),
        output: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_snapshot_from_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("occupations.txt");
        let output = dir.path().join("out").join("nco.snap");
        fs::write(
            &input,
            "Occupation_1: Software Developer; designs and writes programs\n\n\
             Occupation_2: Gardener, tends gardens and public parks\n\n\
             short\n",
        )
        .unwrap();

        let summary = build_snapshot_file(&input, &output, &SemanticConfig::stub("fast"), 1)
            .await
            .unwrap();
        assert_eq!(summary.occupations, 2);
        assert_eq!(summary.dimension, 384);
        assert_eq!(summary.model_name, "stub-fast");

        let store = EmbeddingStore::load(&output).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.model_name(), Some("stub-fast"));
    }

    #[tokio::test]
    async fn snapshot_label_follows_overridden_mode() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("occupations.txt");
        let output = dir.path().join("nco.json");
        fs::write(&input, "Occupation_1: Registered Nurse, cares for patients\n").unwrap();

        let semantic = SemanticConfig::default().with_mode("fast");
        let encoder = build_encoder(&semantic).await.unwrap();
        let summary = build_snapshot_file(&input, &output, &semantic, 4)
            .await
            .unwrap();

        assert_eq!(summary.model_name, encoder.model_name());
        assert_eq!(summary.model_name, "stub-balanced");
        assert_eq!(Some(summary.dimension), encoder.dimension());
        let store = EmbeddingStore::load(&output).unwrap();
        assert_eq!(store.model_name(), Some(encoder.model_name()));
    }

    #[tokio::test]
    async fn missing_input_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_snapshot_file(
            dir.path().join("missing.txt"),
            dir.path().join("out.json"),
            &SemanticConfig::stub("fast"),
            16,
        )
        .await;
        assert!(matches!(result, Err(PipelineError::Read { .. })));
    }

    #[tokio::test]
    async fn list_without_entries_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("occupations.txt");
        fs::write(&input, "a\n\nb\n\n").unwrap();

        let result = build_snapshot_file(
            &input,
            dir.path().join("out.json"),
            &SemanticConfig::stub("fast"),
            16,
        )
        .await;
        assert!(matches!(result, Err(PipelineError::NoOccupations(_))));
    }
}
