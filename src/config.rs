//! YAML configuration for the `ncosearch` tool.
//!
//! One file describes where the snapshot lives, which encoder embeds occupations and
//! queries, how search results are ranked, and how the offline builder batches its work.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "nco-2015"
//!
//! snapshot_path: "data/nco_embeddings.snap"
//!
//! semantic:
//!   mode: "onnx"
//!   model_name: "all-mpnet-base-v2"
//!   model_path: "./models/all-mpnet-base-v2/onnx/model.onnx"
//!   tokenizer_path: "./models/all-mpnet-base-v2/tokenizer.json"
//!   normalize: true
//!
//! search:
//!   boost_factor: 1.2
//!   default_top_k: 5
//!   max_top_k: 100
//!   expand_queries: true
//!
//! build:
//!   batch_size: 32
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use matcher::{SearchConfig, ServiceConfig};
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for building snapshots and running searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NcoConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional label for the occupation dataset
    #[serde(default)]
    pub name: Option<String>,

    /// Snapshot read by `search` and written by `build` when no output is given
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub build: BuildYamlConfig,
}

impl NcoConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: NcoConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.semantic
            .validate()
            .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;
        self.search
            .validate()
            .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;
        self.build.validate()?;

        Ok(())
    }

    /// Snapshot, encoder and search settings for [`matcher::SearchService::from_config`].
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            snapshot_path: self.snapshot_path.clone(),
            semantic: self.semantic.clone(),
            search: self.search.clone(),
        }
    }
}

impl Default for NcoConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            snapshot_path: default_snapshot_path(),
            semantic: SemanticConfig::default(),
            search: SearchConfig::default(),
            build: BuildYamlConfig::default(),
        }
    }
}

/// Offline snapshot builder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildYamlConfig {
    /// Occupations encoded per encoder call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl BuildYamlConfig {
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.batch_size == 0 {
            return Err(ConfigLoadError::Validation(
                "build.batch_size must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BuildYamlConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
fn default_snapshot_path() -> PathBuf {
    ServiceConfig::default().snapshot_path
}
fn default_batch_size() -> usize {
    16
}
