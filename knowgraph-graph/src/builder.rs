//! Batch mutation from loosely typed JSON payloads.
//!
//! The builder handles the two-pass process:
//! 1. Add every node in the payload
//! 2. Add every edge, so edges may reference nodes from the same batch
//!
//! Each item is validated on its own. A bad item is recorded in the
//! report and skipped; it never aborts the rest of the batch.

use crate::graph::KnowledgeGraph;
use knowgraph_core::{Edge, GraphError, GraphResult, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

fn default_node_title() -> String {
    "Node".to_string()
}

fn default_edge_title() -> String {
    "Edge".to_string()
}

/// A node as described in a batch payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_node_title")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<NodeSpec> for Node {
    fn from(spec: NodeSpec) -> Self {
        let mut node = Node::new(spec.title).with_tags(spec.tags);
        if let Some(id) = spec.id {
            node = node.with_id(id);
        }
        node.description = spec.description;
        node
    }
}

/// An edge as described in a batch payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_edge_title")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_node_id: String,
    pub end_node_id: String,
}

impl From<EdgeSpec> for Edge {
    fn from(spec: EdgeSpec) -> Self {
        let mut edge = Edge::new(spec.start_node_id, spec.end_node_id, spec.title);
        if let Some(id) = spec.id {
            edge = edge.with_id(id);
        }
        edge.description = spec.description;
        edge
    }
}

/// One rejected batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemError {
    /// The item as it appeared in the payload.
    pub item: String,
    pub message: String,
}

/// Outcome of applying a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub added_nodes: usize,
    pub added_edges: usize,
    pub errors: Vec<BatchItemError>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn reject(&mut self, item: &Value, message: impl Into<String>) {
        let item = item.to_string();
        let message = message.into();
        warn!("batch item rejected: {} ({})", item, message);
        self.errors.push(BatchItemError { item, message });
    }
}

/// Collects node and edge items, then applies them nodes-first.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: Vec<Value>,
    edges: Vec<Value>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a payload of the form `{"nodes": [...], "edges": [...]}`.
    ///
    /// Both keys are optional. Malformed JSON, a non-object payload, or a
    /// `nodes`/`edges` value that is not an array fails the whole batch.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let payload: Value = serde_json::from_str(json)
            .map_err(|e| GraphError::InvalidQuery(format!("malformed batch JSON: {}", e)))?;
        Self::from_value(payload)
    }

    pub fn from_value(payload: Value) -> GraphResult<Self> {
        let Value::Object(mut object) = payload else {
            return Err(GraphError::InvalidQuery(
                "batch payload must be a JSON object".to_string(),
            ));
        };

        let mut builder = Self::new();
        for (key, target) in [("nodes", &mut builder.nodes), ("edges", &mut builder.edges)] {
            match object.remove(key) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => *target = items,
                Some(_) => {
                    return Err(GraphError::InvalidQuery(format!(
                        "batch field {:?} must be an array",
                        key
                    )))
                }
            }
        }
        Ok(builder)
    }

    pub fn add_node_item(&mut self, item: Value) -> &mut Self {
        self.nodes.push(item);
        self
    }

    pub fn add_edge_item(&mut self, item: Value) -> &mut Self {
        self.edges.push(item);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Applies the batch to `graph`: every node first, then every edge.
    pub fn apply(self, graph: &mut KnowledgeGraph) -> BatchReport {
        let mut report = BatchReport::default();

        for item in &self.nodes {
            let spec = match NodeSpec::deserialize(item) {
                Ok(spec) => spec,
                Err(e) => {
                    report.reject(item, format!("invalid node: {}", e));
                    continue;
                }
            };
            match graph.add_node(spec.into()) {
                Ok(()) => report.added_nodes += 1,
                Err(e) => report.reject(item, e.to_string()),
            }
        }

        for item in &self.edges {
            let spec = match EdgeSpec::deserialize(item) {
                Ok(spec) => spec,
                Err(e) => {
                    report.reject(item, format!("invalid edge: {}", e));
                    continue;
                }
            };
            match graph.add_edge(spec.into()) {
                Ok(()) => report.added_edges += 1,
                Err(e) => report.reject(item, e.to_string()),
            }
        }

        debug!(
            "graph {}: batch added {} nodes, {} edges, rejected {}",
            graph.name(),
            report.added_nodes,
            report.added_edges,
            report.errors.len()
        );
        report
    }

    /// Builds a fresh graph from the batch.
    pub fn build(self, name: impl Into<String>) -> (KnowledgeGraph, BatchReport) {
        let mut graph = KnowledgeGraph::new(name);
        let report = self.apply(&mut graph);
        (graph, report)
    }
}

/// Outcome of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted_nodes: usize,
    pub deleted_edges: usize,
    pub missing_nodes: Vec<String>,
    pub missing_edges: Vec<String>,
}

impl KnowledgeGraph {
    /// Removes the given nodes, then the given edges.
    ///
    /// Ids that do not exist are collected instead of failing. An edge
    /// already removed by a node cascade is reported as missing.
    pub fn delete_items<N, E>(&mut self, node_ids: &[N], edge_ids: &[E]) -> DeleteReport
    where
        N: AsRef<str>,
        E: AsRef<str>,
    {
        let mut report = DeleteReport::default();

        for id in node_ids.iter().map(AsRef::as_ref) {
            match self.remove_node(id) {
                Ok(_) => report.deleted_nodes += 1,
                Err(_) => report.missing_nodes.push(id.to_string()),
            }
        }
        for id in edge_ids.iter().map(AsRef::as_ref) {
            match self.remove_edge(id) {
                Ok(_) => report.deleted_edges += 1,
                Err(_) => report.missing_edges.push(id.to_string()),
            }
        }
        report
    }
}
