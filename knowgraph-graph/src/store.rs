//! Persistence codec.
//!
//! A graph is stored as a self-describing JSON document:
//!
//! ```json
//! {
//!   "name": "rust",
//!   "nodes": { "<id>": { "id", "title", "description", "tags", "in_edges", "out_edges" } },
//!   "edges": { "<id>": { "id", "title", "description", "start_node_id", "end_node_id" } }
//! }
//! ```
//!
//! Loading is two-phase. Every node is rebuilt first with its adjacency
//! reset; then every edge is validated against those nodes, linked, and
//! recorded on its endpoints. Persisted adjacency lists are never trusted.

use crate::graph::KnowledgeGraph;
use indexmap::IndexMap;
use knowgraph_core::{Edge, Endpoint, GraphError, GraphResult, Node};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

fn default_name() -> String {
    "untitled".to_string()
}

/// The on-disk form of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub nodes: IndexMap<String, Node>,

    #[serde(default)]
    pub edges: IndexMap<String, Edge>,
}

impl KnowledgeGraph {
    /// Snapshot of the durable state. Edge links are not part of it.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Rebuilds a graph from a document.
    ///
    /// Fails with [`GraphError::DanglingReference`] when an edge names a
    /// node the document does not contain, and with
    /// [`GraphError::DuplicateId`] when two records share an id.
    pub fn from_document(doc: GraphDocument) -> GraphResult<Self> {
        let mut graph = KnowledgeGraph::new(doc.name);

        // Phase one: nodes, adjacency rebuilt below.
        for (key, node) in doc.nodes {
            if key != node.id {
                warn!("node stored under key {} has id {}", key, node.id);
            }
            graph.add_node(node)?;
        }

        // Phase two: edges against the complete node set.
        for (key, edge) in doc.edges {
            if key != edge.id {
                warn!("edge stored under key {} has id {}", key, edge.id);
            }
            for (endpoint, node_id) in [
                (Endpoint::Start, &edge.start_node_id),
                (Endpoint::End, &edge.end_node_id),
            ] {
                if !graph.contains_node(node_id) {
                    return Err(GraphError::DanglingReference {
                        edge_id: edge.id.clone(),
                        endpoint,
                        node_id: node_id.clone(),
                    });
                }
            }
            if graph.contains_edge(&edge.id) {
                return Err(GraphError::duplicate_edge(edge.id));
            }
            graph.attach_edge(edge);
        }

        Ok(graph)
    }

    /// Serializes the graph as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Parses a graph from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let doc: GraphDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(doc)?)
    }

    /// Writes the graph to `path`, creating parent directories as needed.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;

        info!(
            "saved graph {} ({} nodes, {} edges) to {}",
            self.name,
            self.node_count(),
            self.edge_count(),
            path.display()
        );
        Ok(())
    }

    /// Reads a graph previously written by [`save_to_file`](Self::save_to_file).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let graph = Self::from_json_str(&json)?;

        info!(
            "loaded graph {} ({} nodes, {} edges) from {}",
            graph.name,
            graph.node_count(),
            graph.edge_count(),
            path.display()
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new("sample");
        graph
            .add_node(
                Node::new("Ownership")
                    .with_id("own")
                    .with_description("Each value has one owner")
                    .with_tags(["rust", "memory"]),
            )
            .unwrap();
        graph
            .add_node(Node::new("Borrowing").with_id("borrow"))
            .unwrap();
        graph
            .add_edge(Edge::new("own", "borrow", "enables").with_id("e1"))
            .unwrap();
        graph
            .add_edge(Edge::new("borrow", "borrow", "refines").with_id("e2"))
            .unwrap();
        graph
    }

    #[test]
    fn test_document_shape() {
        let graph = sample();
        let value: serde_json::Value = serde_json::from_str(&graph.to_json_string().unwrap()).unwrap();

        assert_eq!(value["name"], "sample");
        assert_eq!(value["nodes"]["own"]["out_edges"], json!(["e1"]));
        assert_eq!(value["nodes"]["borrow"]["in_edges"], json!(["e1", "e2"]));
        assert_eq!(value["edges"]["e1"]["start_node_id"], "own");
        assert_eq!(
            value["edges"]["e1"].as_object().unwrap().len(),
            5,
            "edges carry only durable fields"
        );
    }

    #[test]
    fn test_round_trip() {
        let graph = sample();
        let loaded = KnowledgeGraph::from_json_str(&graph.to_json_string().unwrap()).unwrap();

        assert_eq!(loaded.to_document(), graph.to_document());

        let edge = loaded.get_edge("e1").unwrap();
        assert_eq!(loaded.start_node(edge).unwrap().id, "own");
        assert_eq!(loaded.end_node(edge).unwrap().id, "borrow");
    }

    #[test]
    fn test_stale_adjacency_is_rebuilt() {
        let doc = json!({
            "name": "stale",
            "nodes": {
                "a": {"id": "a", "title": "A", "out_edges": ["ghost", "e1"]},
                "b": {"id": "b", "title": "B", "in_edges": []}
            },
            "edges": {
                "e1": {"id": "e1", "title": "to", "start_node_id": "a", "end_node_id": "b"}
            }
        });
        let graph = KnowledgeGraph::from_json_str(&doc.to_string()).unwrap();
        assert_eq!(graph.get_node("a").unwrap().out_edges(), ["e1".to_string()]);
        assert_eq!(graph.get_node("b").unwrap().in_edges(), ["e1".to_string()]);
    }

    #[test]
    fn test_dangling_reference_names_endpoint() {
        let doc = json!({
            "name": "broken",
            "nodes": {"a": {"id": "a", "title": "A"}},
            "edges": {
                "e1": {"id": "e1", "start_node_id": "a", "end_node_id": "missing"}
            }
        });
        let err = KnowledgeGraph::from_json_str(&doc.to_string()).unwrap_err();
        match err {
            StoreError::Graph(GraphError::DanglingReference {
                edge_id,
                endpoint,
                node_id,
            }) => {
                assert_eq!(edge_id, "e1");
                assert_eq!(endpoint, Endpoint::End);
                assert_eq!(node_id, "missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_ids_across_keys() {
        let doc = json!({
            "nodes": {
                "a": {"id": "same", "title": "A"},
                "b": {"id": "same", "title": "B"}
            }
        });
        let err = KnowledgeGraph::from_json_str(&doc.to_string()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Graph(GraphError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_legacy_field_names() {
        let doc = json!({
            "name": "legacy",
            "nodes": {
                "a": {"id": "a", "title": "A", "in_edge": [], "out_edge": ["e1"]},
                "b": {"id": "b", "title": "B", "in_edge": ["e1"], "out_edge": []}
            },
            "edges": {
                "e1": {"id": "e1", "title": "to", "start_node_id": "a", "end_node_id": "b"}
            }
        });
        let graph = KnowledgeGraph::from_json_str(&doc.to_string()).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.name(), "legacy");
    }

    #[test]
    fn test_malformed_json() {
        let err = KnowledgeGraph::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("sample.json");

        let graph = sample();
        graph.save_to_file(&path).unwrap();

        let loaded = KnowledgeGraph::load_from_file(&path).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.edge_count(), 2);
        assert_ne!(loaded.graph_id(), graph.graph_id());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = KnowledgeGraph::load_from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
