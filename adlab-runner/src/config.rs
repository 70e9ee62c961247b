//! Serializable aggregation configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use adlab_core::selection::PolicyKind;

/// Content-addressable identifier of a configuration.
pub type RunId = String;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce one aggregation:
/// - where the experiment tree lives and which part of it to read
/// - which selection policy reduces runs to scores
/// - ranking direction and output location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Root of the `dataset/algorithm/iteration/run` tree.
    pub root: PathBuf,

    /// Datasets to score. Empty means every dataset under `root`.
    #[serde(default)]
    pub datasets: Vec<String>,

    /// Algorithms to collect and score, in output column order.
    pub algorithms: Vec<String>,

    #[serde(default)]
    pub policy: PolicyKind,

    /// Rank direction. Defaults to the policy's own direction.
    #[serde(default)]
    pub higher_is_better: Option<bool>,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl AggregationConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.algorithms.is_empty() {
            return Err(ConfigError::Invalid("algorithms must not be empty".into()));
        }
        if let Some(dup) = first_duplicate(&self.algorithms) {
            return Err(ConfigError::Invalid(format!("algorithm '{dup}' listed twice")));
        }
        if let Some(dup) = first_duplicate(&self.datasets) {
            return Err(ConfigError::Invalid(format!("dataset '{dup}' listed twice")));
        }
        Ok(())
    }

    /// Rank direction after applying the policy default.
    pub fn ranks_higher_first(&self) -> bool {
        self.higher_is_better
            .unwrap_or_else(|| self.policy.is_higher_better())
    }

    /// Deterministic BLAKE3 hash of the serialized config.
    ///
    /// Two identical configs share a RunId, so their outputs land in the
    /// same-named directory.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    names
        .iter()
        .enumerate()
        .find(|(i, name)| names[..*i].contains(name))
        .map(|(_, name)| name.as_str())
}
