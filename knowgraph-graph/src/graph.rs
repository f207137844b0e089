//! Core graph data structure.
//!
//! The KnowledgeGraph owns every node and edge by id. Edges refer to
//! their endpoints by id only; the graph is the single place those ids
//! are resolved, and every mutation keeps the per-node adjacency lists
//! in step with the edge map.

use indexmap::{IndexMap, IndexSet};
use knowgraph_core::{Edge, GraphError, GraphId, GraphResult, Node};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A named, mutable, in-memory directed knowledge graph.
///
/// Nodes and edges are kept in insertion order, which makes listings and
/// rankings reproducible for the same sequence of operations.
#[derive(Debug)]
pub struct KnowledgeGraph {
    /// Identity edges are linked against.
    pub(crate) id: GraphId,

    pub(crate) name: String,

    /// Nodes keyed by their own id.
    pub(crate) nodes: IndexMap<String, Node>,

    /// Edges keyed by their own id.
    pub(crate) edges: IndexMap<String, Edge>,
}

/// Fields to change on an existing node. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Fields to change on an existing edge. Endpoints are immutable.
#[derive(Debug, Clone, Default)]
pub struct EdgePatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl EdgePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new("untitled")
    }
}

/// Cloning yields an independent graph with its own identity; the
/// cloned edges are relinked against it.
impl Clone for KnowledgeGraph {
    fn clone(&self) -> Self {
        let id = GraphId::fresh();
        let edges = self
            .edges
            .iter()
            .map(|(key, edge)| {
                let mut edge = edge.clone();
                edge.attach(id);
                (key.clone(), edge)
            })
            .collect();

        Self {
            id,
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            edges,
        }
    }
}

impl KnowledgeGraph {
    /// Creates a new empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GraphId::fresh(),
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    pub fn graph_id(&self) -> GraphId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────

    /// Adds a node to the graph.
    ///
    /// Whatever adjacency the node carried is dropped: a node entering a
    /// graph has no edges in it yet.
    pub fn add_node(&mut self, mut node: Node) -> GraphResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::duplicate_node(node.id));
        }
        node.clear_adjacency();

        debug!("graph {}: add node {} ({})", self.name, node.id, node.title);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Adds an edge between two existing nodes.
    ///
    /// Both endpoints are checked before the edge id, so a dangling edge
    /// reports the missing node.
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if !self.nodes.contains_key(&edge.start_node_id) {
            return Err(GraphError::node_not_found(edge.start_node_id));
        }
        if !self.nodes.contains_key(&edge.end_node_id) {
            return Err(GraphError::node_not_found(edge.end_node_id));
        }
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::duplicate_edge(edge.id));
        }

        debug!(
            "graph {}: add edge {} {} -> {}",
            self.name, edge.id, edge.start_node_id, edge.end_node_id
        );
        self.attach_edge(edge);
        Ok(())
    }

    /// Links a validated edge and records it on both endpoints.
    ///
    /// Callers must have checked that both endpoints exist and the id is free.
    pub(crate) fn attach_edge(&mut self, mut edge: Edge) {
        edge.attach(self.id);
        if let Some(start) = self.nodes.get_mut(&edge.start_node_id) {
            start.push_out_edge(edge.id.clone());
        }
        if let Some(end) = self.nodes.get_mut(&edge.end_node_id) {
            end.push_in_edge(edge.id.clone());
        }
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Removes a node and, first, every edge incident to it.
    ///
    /// Returns the removed node.
    pub fn remove_node(&mut self, id: &str) -> GraphResult<Node> {
        let incident = self
            .nodes
            .get(id)
            .map(Node::incident_edges)
            .ok_or_else(|| GraphError::node_not_found(id))?;

        for edge_id in &incident {
            // Already gone if an earlier removal in this loop touched it.
            if self.edges.contains_key(edge_id) {
                self.remove_edge(edge_id)?;
            }
        }

        debug!(
            "graph {}: remove node {} (cascaded {} edges)",
            self.name,
            id,
            incident.len()
        );
        self.nodes
            .shift_remove(id)
            .ok_or_else(|| GraphError::node_not_found(id))
    }

    /// Removes an edge and its entries in the endpoints' adjacency lists.
    ///
    /// Returns the removed edge, detached from this graph.
    pub fn remove_edge(&mut self, id: &str) -> GraphResult<Edge> {
        let mut edge = self
            .edges
            .shift_remove(id)
            .ok_or_else(|| GraphError::edge_not_found(id))?;

        if let Some(start) = self.nodes.get_mut(&edge.start_node_id) {
            start.remove_out_edge(&edge.id);
        }
        if let Some(end) = self.nodes.get_mut(&edge.end_node_id) {
            end.remove_in_edge(&edge.id);
        }

        debug!("graph {}: remove edge {}", self.name, id);
        edge.detach();
        Ok(edge)
    }

    /// Updates display fields of a node. Id and adjacency never change.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;

        if let Some(title) = patch.title {
            node.title = title;
        }
        if let Some(description) = patch.description {
            node.description = Some(description);
        }
        if let Some(tags) = patch.tags {
            node.tags = tags;
        }
        Ok(())
    }

    /// Updates display fields of an edge. Id and endpoints never change.
    pub fn update_edge(&mut self, id: &str, patch: EdgePatch) -> GraphResult<()> {
        let edge = self
            .edges
            .get_mut(id)
            .ok_or_else(|| GraphError::edge_not_found(id))?;

        if let Some(title) = patch.title {
            edge.title = title;
        }
        if let Some(description) = patch.description {
            edge.description = Some(description);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn get_all_node(&self) -> Vec<&Node> {
        self.nodes.values().collect()
    }

    pub fn get_all_edge(&self) -> Vec<&Edge> {
        self.edges.values().collect()
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn require_node(&self, id: &str) -> GraphResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::node_not_found(id))
    }

    /// Edges leaving a node, in attachment order.
    pub fn get_out_edge(&self, id: &str) -> GraphResult<Vec<&Edge>> {
        let node = self.require_node(id)?;
        Ok(node
            .out_edges()
            .iter()
            .filter_map(|edge_id| self.edges.get(edge_id))
            .collect())
    }

    /// Edges arriving at a node, in attachment order.
    pub fn get_in_edge(&self, id: &str) -> GraphResult<Vec<&Edge>> {
        let node = self.require_node(id)?;
        Ok(node
            .in_edges()
            .iter()
            .filter_map(|edge_id| self.edges.get(edge_id))
            .collect())
    }

    /// Nodes one hop away in either direction, excluding the node itself.
    pub fn get_neighbours(&self, id: &str) -> GraphResult<Vec<&Node>> {
        let node = self.require_node(id)?;

        let mut ids: IndexSet<&str> = IndexSet::new();
        for edge in node.in_edges().iter().filter_map(|e| self.edges.get(e)) {
            ids.insert(edge.start_node_id.as_str());
        }
        for edge in node.out_edges().iter().filter_map(|e| self.edges.get(e)) {
            ids.insert(edge.end_node_id.as_str());
        }
        ids.shift_remove(id);

        Ok(ids.into_iter().filter_map(|n| self.nodes.get(n)).collect())
    }

    /// Targets of a node's outgoing edges.
    pub fn get_out_neighbours(&self, id: &str) -> GraphResult<Vec<&Node>> {
        let node = self.require_node(id)?;

        let ids: IndexSet<&str> = node
            .out_edges()
            .iter()
            .filter_map(|e| self.edges.get(e))
            .map(|edge| edge.end_node_id.as_str())
            .collect();

        Ok(ids.into_iter().filter_map(|n| self.nodes.get(n)).collect())
    }

    /// All edges from `from` to `to`, in attachment order.
    pub fn edges_between(&self, from: &str, to: &str) -> GraphResult<Vec<&Edge>> {
        self.require_node(to)?;
        Ok(self
            .get_out_edge(from)?
            .into_iter()
            .filter(|edge| edge.end_node_id == to)
            .collect())
    }

    /// Resolves the start node of an edge attached to this graph.
    pub fn start_node(&self, edge: &Edge) -> GraphResult<&Node> {
        self.check_link(edge)?;
        self.require_node(&edge.start_node_id)
    }

    /// Resolves the end node of an edge attached to this graph.
    pub fn end_node(&self, edge: &Edge) -> GraphResult<&Node> {
        self.check_link(edge)?;
        self.require_node(&edge.end_node_id)
    }

    /// The edge must carry this graph's link and be the stored edge with
    /// that id; a hand-attached copy does not count.
    fn check_link(&self, edge: &Edge) -> GraphResult<()> {
        let stored = self.edges.get(&edge.id).is_some_and(|kept| {
            kept.start_node_id == edge.start_node_id && kept.end_node_id == edge.end_node_id
        });
        if edge.owner()? != self.id || !stored {
            return Err(GraphError::ReferenceNotLinked {
                edge_id: edge.id.clone(),
            });
        }
        Ok(())
    }
}

/// Graph statistics for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
    /// Number of distinct tags across all nodes.
    pub tag_count: usize,
}

impl KnowledgeGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let tags: BTreeSet<&str> = self
            .nodes
            .values()
            .flat_map(|node| node.tags.iter().map(String::as_str))
            .collect();

        GraphStats {
            name: self.name.clone(),
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            tag_count: tags.len(),
        }
    }
}
