//! # Occupation index
//!
//! Read-only store of occupation descriptions and their precomputed embeddings.
//!
//! A store is built once from an [`EmbeddingSnapshot`] (loaded from disk or assembled in
//! memory) and never mutated afterwards. Construction is all-or-nothing: every structural
//! problem in the snapshot is reported as a [`LoadError`] and no partial store is returned.
//!
//! ## Snapshot files
//!
//! - `*.json` - `{"occupations": [...], "embeddings": [[...], ...], "model_name": ...}`
//! - anything else - the same structure, bincode-encoded and zstd-compressed
//!
//! ## Example
//!
//! ```
//! use index::{EmbeddingSnapshot, EmbeddingStore};
//!
//! let snapshot = EmbeddingSnapshot {
//!     occupations: vec!["Software Developer".into(), "Gardener".into()],
//!     embeddings: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
//!     model_name: None,
//! };
//! let store = EmbeddingStore::from_snapshot(snapshot).unwrap();
//! assert_eq!(store.len(), 2);
//! assert_eq!(store.dimension(), 2);
//! assert_eq!(store.entry(1).unwrap().display_text, "Gardener");
//! ```

mod entry;
mod snapshot;

pub use entry::{display_text, OccupationEntry, DISPLAY_CHAR_LIMIT};
pub use snapshot::{EmbeddingSnapshot, SnapshotFormat, SNAPSHOT_SCHEMA_VERSION};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a snapshot could not become a store.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot decode error: {0}")]
    Decode(String),
    #[error("snapshot encode error: {0}")]
    Encode(String),
    #[error("{occupations} occupations but {embeddings} embeddings")]
    LengthMismatch {
        occupations: usize,
        embeddings: usize,
    },
    #[error("embedding {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("embedding {index} is empty")]
    EmptyVector { index: usize },
    #[error("embedding {index} contains a non-finite value")]
    NonFinite { index: usize },
    #[error("snapshot contains no occupations")]
    Empty,
}

/// Occupations and embeddings in parallel arrays, plus the L2 norm of every embedding.
#[derive(Debug)]
pub struct EmbeddingStore {
    occupations: Vec<OccupationEntry>,
    embeddings: Vec<Vec<f32>>,
    norms: Vec<f32>,
    dimension: usize,
    model_name: Option<String>,
}

impl EmbeddingStore {
    /// Validates the snapshot and builds the store.
    pub fn from_snapshot(snapshot: EmbeddingSnapshot) -> Result<Self, LoadError> {
        let EmbeddingSnapshot {
            occupations,
            embeddings,
            model_name,
        } = snapshot;

        if occupations.len() != embeddings.len() {
            return Err(LoadError::LengthMismatch {
                occupations: occupations.len(),
                embeddings: embeddings.len(),
            });
        }
        let dimension = match embeddings.first() {
            None => return Err(LoadError::Empty),
            Some(first) => first.len(),
        };

        let mut norms = Vec::with_capacity(embeddings.len());
        for (index, vector) in embeddings.iter().enumerate() {
            if vector.is_empty() {
                return Err(LoadError::EmptyVector { index });
            }
            if vector.len() != dimension {
                return Err(LoadError::DimensionMismatch {
                    index,
                    expected: dimension,
                    found: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(LoadError::NonFinite { index });
            }
            norms.push(vector.iter().map(|x| x * x).sum::<f32>().sqrt());
        }

        let occupations = occupations
            .into_iter()
            .enumerate()
            .map(|(id, text)| OccupationEntry::new(id, text))
            .collect();

        Ok(Self {
            occupations,
            embeddings,
            norms,
            dimension,
            model_name,
        })
    }

    /// Reads and validates a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let store = Self::from_snapshot(EmbeddingSnapshot::read(path)?)?;
        tracing::info!(
            path = %path.display(),
            occupations = store.len(),
            dimension = store.dimension,
            model = store.model_name.as_deref().unwrap_or("unknown"),
            "embedding store loaded"
        );
        Ok(store)
    }

    /// Writes the store back out as a snapshot (format chosen by extension).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        self.to_snapshot().write(path)
    }

    pub fn to_snapshot(&self) -> EmbeddingSnapshot {
        EmbeddingSnapshot {
            occupations: self
                .occupations
                .iter()
                .map(|entry| entry.full_text.clone())
                .collect(),
            embeddings: self.embeddings.clone(),
            model_name: self.model_name.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.occupations.len()
    }

    /// Always false for a constructed store; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.occupations.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn entry(&self, id: usize) -> Option<&OccupationEntry> {
        self.occupations.get(id)
    }

    pub fn entries(&self) -> &[OccupationEntry] {
        &self.occupations
    }

    pub fn embedding(&self, id: usize) -> Option<&[f32]> {
        self.embeddings.get(id).map(Vec::as_slice)
    }

    /// L2 norm of embedding `id`, computed at load time.
    pub fn norm(&self, id: usize) -> Option<f32> {
        self.norms.get(id).copied()
    }

    /// `(entry, embedding, norm)` for every occupation, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&OccupationEntry, &[f32], f32)> + '_ {
        self.occupations
            .iter()
            .zip(&self.embeddings)
            .zip(&self.norms)
            .map(|((entry, vector), norm)| (entry, vector.as_slice(), *norm))
    }
}
