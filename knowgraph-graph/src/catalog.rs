//! A directory of named graphs with one active selection.
//!
//! Each graph lives in `<graph_dir>/<name>.json`. The catalog is an
//! explicit value owned by the caller; nothing here is global.

use crate::config::KnowgraphConfig;
use crate::graph::{GraphStats, KnowledgeGraph};
use crate::store::StoreError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("no active graph; create one or select one first")]
    NoActiveGraph,

    #[error("unknown graph: {0}")]
    UnknownGraph(String),

    #[error("graph {0} already exists")]
    DuplicateGraph(String),

    #[error("invalid graph name {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// A file that could not be loaded by [`GraphCatalog::reload`].
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReloadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<LoadFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    pub saved: Vec<String>,
    /// Graph name and the reason it could not be written.
    pub failed: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct GraphCatalog {
    dir: PathBuf,
    graphs: IndexMap<String, KnowledgeGraph>,
    active: Option<String>,
}

fn validate_name(name: &str) -> CatalogResult<()> {
    let bad = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if bad {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl GraphCatalog {
    /// An empty catalog over `dir`. Nothing is read until [`reload`](Self::reload).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            graphs: IndexMap::new(),
            active: None,
        }
    }

    /// Opens the configured graph directory and loads every graph in it.
    pub fn open(config: &KnowgraphConfig) -> CatalogResult<(Self, ReloadReport)> {
        let mut catalog = Self::new(&config.graph_dir);
        let report = catalog.reload()?;
        Ok((catalog, report))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a graph of this name is stored.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Drops all graphs and loads every `*.json` file in the directory.
    ///
    /// Files that fail to parse are reported, not fatal. So is a graph
    /// whose name is invalid or differs from its file stem, since it would
    /// be saved to and removed from a different path. The active
    /// selection survives if its graph is still present.
    pub fn reload(&mut self) -> CatalogResult<ReloadReport> {
        fs::create_dir_all(&self.dir)?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        self.graphs.clear();
        let mut report = ReloadReport::default();

        for path in paths {
            match KnowledgeGraph::load_from_file(&path) {
                Ok(graph) if validate_name(graph.name()).is_err() => {
                    let message = CatalogError::InvalidName(graph.name().to_string()).to_string();
                    warn!("skipping {}: {}", path.display(), message);
                    report.failed.push(LoadFailure { path, message });
                }
                Ok(graph) if path.file_stem().and_then(|s| s.to_str()) != Some(graph.name()) => {
                    let message = format!("graph {} must be stored as {}.json", graph.name(), graph.name());
                    warn!("skipping {}: {}", path.display(), message);
                    report.failed.push(LoadFailure { path, message });
                }
                Ok(graph) if self.graphs.contains_key(graph.name()) => {
                    let message = format!("graph {} already loaded", graph.name());
                    warn!("skipping {}: {}", path.display(), message);
                    report.failed.push(LoadFailure { path, message });
                }
                Ok(graph) => {
                    report.loaded.push(graph.name().to_string());
                    self.graphs.insert(graph.name().to_string(), graph);
                }
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    report.failed.push(LoadFailure {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(active) = &self.active {
            if !self.graphs.contains_key(active) {
                self.active = None;
            }
        }

        info!(
            "catalog {}: loaded {} graphs, {} failed",
            self.dir.display(),
            report.loaded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Creates, saves and activates an empty graph.
    pub fn create_graph(&mut self, name: &str) -> CatalogResult<&mut KnowledgeGraph> {
        self.insert_graph(KnowledgeGraph::new(name))
    }

    /// Adds an existing graph under its own name, saves it and makes it active.
    pub fn insert_graph(&mut self, graph: KnowledgeGraph) -> CatalogResult<&mut KnowledgeGraph> {
        let name = graph.name().to_string();
        validate_name(&name)?;
        if self.graphs.contains_key(&name) {
            return Err(CatalogError::DuplicateGraph(name));
        }

        graph.save_to_file(self.path_for(&name))?;
        info!("catalog: added graph {}", name);

        self.active = Some(name.clone());
        Ok(self.graphs.entry(name).or_insert(graph))
    }

    /// Statistics for every graph, in load order.
    pub fn list(&self) -> Vec<GraphStats> {
        self.graphs.values().map(KnowledgeGraph::stats).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&KnowledgeGraph> {
        self.graphs.get(name)
    }

    pub fn set_active(&mut self, name: &str) -> CatalogResult<()> {
        if !self.graphs.contains_key(name) {
            return Err(CatalogError::UnknownGraph(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> CatalogResult<&KnowledgeGraph> {
        self.active
            .as_ref()
            .and_then(|name| self.graphs.get(name))
            .ok_or(CatalogError::NoActiveGraph)
    }

    pub fn active_mut(&mut self) -> CatalogResult<&mut KnowledgeGraph> {
        self.active
            .as_ref()
            .and_then(|name| self.graphs.get_mut(name))
            .ok_or(CatalogError::NoActiveGraph)
    }

    /// Writes the active graph back to its file.
    pub fn save_active(&self) -> CatalogResult<()> {
        let graph = self.active()?;
        graph.save_to_file(self.path_for(graph.name()))?;
        Ok(())
    }

    /// Writes every graph, collecting failures instead of stopping.
    pub fn save_all(&self) -> SaveReport {
        let mut report = SaveReport::default();
        for (name, graph) in &self.graphs {
            match graph.save_to_file(self.path_for(name)) {
                Ok(()) => report.saved.push(name.clone()),
                Err(e) => {
                    warn!("failed to save graph {}: {}", name, e);
                    report.failed.push((name.clone(), e.to_string()));
                }
            }
        }
        report
    }

    /// Drops a graph and deletes its file.
    pub fn remove_graph(&mut self, name: &str) -> CatalogResult<KnowledgeGraph> {
        let graph = self
            .graphs
            .shift_remove(name)
            .ok_or_else(|| CatalogError::UnknownGraph(name.to_string()))?;

        if self.active.as_deref() == Some(name) {
            self.active = None;
        }

        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        info!("catalog: removed graph {}", name);
        Ok(graph)
    }
}
