//! Knowledge graph nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Length of generated ids. Short ids stay readable in prompts and logs.
const GENERATED_ID_LEN: usize = 8;

/// Generates a fresh id token for a node or an edge.
pub fn generate_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(GENERATED_ID_LEN);
    id
}

fn default_title() -> String {
    "Node".to_string()
}

/// An identified, labeled vertex in a knowledge graph.
///
/// The adjacency lists are owned by the graph the node lives in: they are
/// read-only from the outside and reset whenever the node enters a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within a graph.
    #[serde(default = "generate_id")]
    pub id: String,

    /// Display label.
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Tags. Kept sorted so that serialization is stable.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Ids of edges ending at this node, in attachment order.
    #[serde(default, alias = "in_edge")]
    in_edges: Vec<String>,

    /// Ids of edges starting at this node, in attachment order.
    #[serde(default, alias = "out_edge")]
    out_edges: Vec<String>,
}

impl Node {
    /// Creates a node with a generated id and no description, tags or edges.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            description: None,
            tags: BTreeSet::new(),
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_edges(&self) -> &[String] {
        &self.in_edges
    }

    pub fn out_edges(&self) -> &[String] {
        &self.out_edges
    }

    pub fn in_degree(&self) -> usize {
        self.in_edges.len()
    }

    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }

    /// Ids of every incident edge, deduplicated (a self-loop is listed once).
    pub fn incident_edges(&self) -> BTreeSet<String> {
        self.in_edges
            .iter()
            .chain(self.out_edges.iter())
            .cloned()
            .collect()
    }

    /// Records an incoming edge. Maintained by the owning graph.
    pub fn push_in_edge(&mut self, edge_id: impl Into<String>) {
        self.in_edges.push(edge_id.into());
    }

    /// Records an outgoing edge. Maintained by the owning graph.
    pub fn push_out_edge(&mut self, edge_id: impl Into<String>) {
        self.out_edges.push(edge_id.into());
    }

    /// Forgets an incoming edge. Returns false if it was not recorded.
    pub fn remove_in_edge(&mut self, edge_id: &str) -> bool {
        remove_first(&mut self.in_edges, edge_id)
    }

    /// Forgets an outgoing edge. Returns false if it was not recorded.
    pub fn remove_out_edge(&mut self, edge_id: &str) -> bool {
        remove_first(&mut self.out_edges, edge_id)
    }

    /// Drops all adjacency bookkeeping.
    pub fn clear_adjacency(&mut self) {
        self.in_edges.clear();
        self.out_edges.clear();
    }

    pub fn has_adjacency(&self) -> bool {
        !self.in_edges.is_empty() || !self.out_edges.is_empty()
    }
}

fn remove_first(list: &mut Vec<String>, edge_id: &str) -> bool {
    match list.iter().position(|id| id == edge_id) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new("Rust");
        assert_eq!(node.title, "Rust");
        assert_eq!(node.id.len(), GENERATED_ID_LEN);
        assert!(node.description.is_none());
        assert!(node.tags.is_empty());
        assert!(!node.has_adjacency());
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = Node::new("a");
        let b = Node::new("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_tags_are_a_set() {
        let node = Node::new("x").with_tags(["math", "algebra", "math"]);
        let tags: Vec<&str> = node.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["algebra", "math"]);
    }

    #[test]
    fn test_adjacency_bookkeeping() {
        let mut node = Node::new("hub");
        node.push_out_edge("e1");
        node.push_out_edge("e2");
        node.push_in_edge("e3");

        assert_eq!(node.out_degree(), 2);
        assert_eq!(node.in_degree(), 1);
        assert!(node.remove_out_edge("e1"));
        assert!(!node.remove_out_edge("e1"));
        assert_eq!(node.out_edges(), ["e2".to_string()]);

        node.clear_adjacency();
        assert!(!node.has_adjacency());
    }

    #[test]
    fn test_self_loop_counted_once_in_incident_edges() {
        let mut node = Node::new("loop");
        node.push_out_edge("e1");
        node.push_in_edge("e1");
        assert_eq!(node.incident_edges().len(), 1);
    }

    #[test]
    fn test_deserialize_fills_defaults_and_accepts_legacy_names() {
        let node: Node = serde_json::from_str(
            r#"{"id": "n1", "tags": ["b", "a"], "in_edge": ["e0"], "out_edge": []}"#,
        )
        .unwrap();
        assert_eq!(node.id, "n1");
        assert_eq!(node.title, "Node");
        assert_eq!(node.in_edges(), ["e0".to_string()]);

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["in_edges"], serde_json::json!(["e0"]));
        assert_eq!(json["tags"], serde_json::json!(["a", "b"]));
    }
}
