//! Workspace configuration.
//!
//! Stored as pretty JSON. Every field has a default, so partial files
//! and missing files both load.

use crate::ranking::CentralityConfig;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of entries per section in a graph summary.
pub const DEFAULT_SUMMARY_LIMIT: usize = 10;

fn default_graph_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("knowgraph").join("graphs"))
        .unwrap_or_else(|| PathBuf::from(".knowgraph").join("graphs"))
}

fn default_summary_limit() -> usize {
    DEFAULT_SUMMARY_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowgraphConfig {
    /// Directory holding one `<name>.json` file per graph.
    #[serde(default = "default_graph_dir")]
    pub graph_dir: PathBuf,

    #[serde(default)]
    pub centrality: CentralityConfig,

    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
}

impl Default for KnowgraphConfig {
    fn default() -> Self {
        Self {
            graph_dir: default_graph_dir(),
            centrality: CentralityConfig::default(),
            summary_limit: DEFAULT_SUMMARY_LIMIT,
        }
    }
}

impl KnowgraphConfig {
    /// A default config storing graphs under `graph_dir`.
    pub fn with_graph_dir(graph_dir: impl Into<PathBuf>) -> Self {
        Self {
            graph_dir: graph_dir.into(),
            ..Self::default()
        }
    }

    /// Reads the config at `path`, or the defaults if there is no file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = KnowgraphConfig::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, KnowgraphConfig::default());
        assert_eq!(config.summary_limit, 10);
        assert_eq!(config.centrality.seed, 42);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"graph_dir": "/tmp/kg", "centrality": {"seed": 7}}"#).unwrap();

        let config = KnowgraphConfig::load(&path).unwrap();
        assert_eq!(config.graph_dir, PathBuf::from("/tmp/kg"));
        assert_eq!(config.centrality.seed, 7);
        assert_eq!(config.centrality.sample_ratio, 0.2);
        assert_eq!(config.summary_limit, 10);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".knowgraph").join("config.json");
        let mut config = KnowgraphConfig::with_graph_dir(dir.path().join("graphs"));
        config.summary_limit = 3;

        config.save(&path).unwrap();
        assert_eq!(KnowgraphConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "graph_dir = 1").unwrap();
        assert!(matches!(
            KnowgraphConfig::load(&path),
            Err(StoreError::Json(_))
        ));
    }
}
