use std::fs;
use std::path::Path;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::LoadError;

/// Bump whenever the binary snapshot layout changes.
pub const SNAPSHOT_SCHEMA_VERSION: u16 = 1;

const ZSTD_LEVEL: i32 = 3;

/// Occupation texts and their precomputed embeddings, aligned by position.
///
/// This is the on-disk shape. It is validated when turned into an
/// [`EmbeddingStore`](crate::EmbeddingStore), not when decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSnapshot {
    pub occupations: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    /// Model that produced `embeddings`, when recorded.
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Encoding of a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// Human-readable JSON.
    Json,
    /// bincode, zstd-compressed, prefixed with [`SNAPSHOT_SCHEMA_VERSION`].
    Binary,
}

impl SnapshotFormat {
    /// `.json` files are JSON; everything else is treated as binary.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Binary,
        }
    }
}

impl EmbeddingSnapshot {
    pub fn to_bytes(&self, format: SnapshotFormat) -> Result<Vec<u8>, LoadError> {
        match format {
            SnapshotFormat::Json => {
                serde_json::to_vec(self).map_err(|e| LoadError::Encode(e.to_string()))
            }
            SnapshotFormat::Binary => {
                let raw = encode_to_vec((SNAPSHOT_SCHEMA_VERSION, self), standard())
                    .map_err(|e| LoadError::Encode(e.to_string()))?;
                encode_all(raw.as_slice(), ZSTD_LEVEL).map_err(|e| LoadError::Encode(e.to_string()))
            }
        }
    }

    pub fn from_bytes(bytes: &[u8], format: SnapshotFormat) -> Result<Self, LoadError> {
        match format {
            SnapshotFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| LoadError::Decode(e.to_string()))
            }
            SnapshotFormat::Binary => {
                let raw = decode_all(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
                let ((version, snapshot), _): ((u16, EmbeddingSnapshot), usize) =
                    decode_from_slice(&raw, standard())
                        .map_err(|e| LoadError::Decode(e.to_string()))?;
                if version != SNAPSHOT_SCHEMA_VERSION {
                    return Err(LoadError::Decode(format!(
                        "unsupported snapshot schema version {version} (expected {SNAPSHOT_SCHEMA_VERSION})"
                    )));
                }
                Ok(snapshot)
            }
        }
    }

    /// Reads a snapshot, picking the format from the file extension.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes, SnapshotFormat::from_path(path))
    }

    /// Writes a snapshot, picking the format from the file extension. Parent directories are
    /// created as needed.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        let bytes = self.to_bytes(SnapshotFormat::from_path(path))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LoadError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, bytes).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
