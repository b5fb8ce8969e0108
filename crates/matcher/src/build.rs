//! Offline snapshot construction: occupation text in, encoded [`EmbeddingSnapshot`] out.

use index::EmbeddingSnapshot;
use semantic::{Encoder, SemanticError};

use crate::types::SearchError;

/// Entries of this many characters or fewer are headings or extraction noise and are skipped.
pub const MIN_OCCUPATION_CHARS: usize = 20;

const ENTRY_PREFIX: &str = "Occupation_";

/// Splits an occupations text dump into entries.
///
/// Entries are separated by blank lines. A leading `Occupation_<n>:` label is removed, and
/// entries that are [`MIN_OCCUPATION_CHARS`] characters or shorter after trimming are dropped.
pub fn parse_occupations(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(strip_entry_label)
        .filter(|entry| entry.chars().count() > MIN_OCCUPATION_CHARS)
        .map(str::to_string)
        .collect()
}

fn strip_entry_label(entry: &str) -> &str {
    if entry.starts_with(ENTRY_PREFIX) {
        if let Some((_, rest)) = entry.split_once(':') {
            return rest.trim();
        }
    }
    entry
}

/// Encodes `occupations` in chunks of `batch_size` and assembles a snapshot tagged with the
/// encoder's model name.
pub async fn build_snapshot(
    encoder: &dyn Encoder,
    occupations: Vec<String>,
    batch_size: usize,
) -> Result<EmbeddingSnapshot, SearchError> {
    if batch_size == 0 {
        return Err(SearchError::InvalidConfig(
            "batch_size must be greater than zero".into(),
        ));
    }

    let mut embeddings = Vec::with_capacity(occupations.len());
    for (batch_no, chunk) in occupations.chunks(batch_size).enumerate() {
        let vectors = encoder.encode(chunk).await?;
        if vectors.len() != chunk.len() {
            return Err(SearchError::Encoding(SemanticError::Inference(format!(
                "encoder returned {} vectors for a batch of {}",
                vectors.len(),
                chunk.len()
            ))));
        }
        embeddings.extend(vectors);
        tracing::debug!(
            batch = batch_no + 1,
            encoded = embeddings.len(),
            total = occupations.len(),
            "encoded occupation batch"
        );
    }

    tracing::info!(
        occupations = occupations.len(),
        model = encoder.model_name(),
        "snapshot built"
    );
    Ok(EmbeddingSnapshot {
        occupations,
        embeddings,
        model_name: Some(encoder.model_name().to_string()),
    })
}
