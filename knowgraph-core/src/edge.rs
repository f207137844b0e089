//! Directed edges between knowledge graph nodes.
//!
//! The authoritative relation between an edge and its endpoints is the
//! pair of node ids. An edge additionally remembers which graph it was
//! attached to, so that endpoint lookups can refuse to run against an
//! edge that no graph has resolved yet.

use crate::error::{GraphError, GraphResult};
use crate::node::generate_id;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identity of a graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u64);

impl GraphId {
    /// Mints an id no other graph in this process has.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

fn default_title() -> String {
    "Edge".to_string()
}

/// An identified, labeled, directed connection from one node to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique within a graph.
    #[serde(default = "generate_id")]
    pub id: String,

    /// Label for the relationship.
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    pub start_node_id: String,

    pub end_node_id: String,

    /// Graph this edge has been attached to. Runtime state only.
    #[serde(skip)]
    link: Option<GraphId>,
}

impl Edge {
    /// Creates an unattached edge with a generated id.
    pub fn new(
        start_node_id: impl Into<String>,
        end_node_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            description: None,
            start_node_id: start_node_id.into(),
            end_node_id: end_node_id.into(),
            link: None,
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

    pub fn is_self_loop(&self) -> bool {
        self.start_node_id == self.end_node_id
    }

    /// Marks the edge as resolved inside `owner`. Called by the graph.
    pub fn attach(&mut self, owner: GraphId) {
        self.link = Some(owner);
    }

    /// Clears the resolved link, e.g. before copying the edge elsewhere.
    pub fn detach(&mut self) {
        self.link = None;
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// The graph this edge is attached to.
    ///
    /// Fails with [`GraphError::ReferenceNotLinked`] for an edge that was
    /// just constructed or deserialized and never added to a graph.
    pub fn owner(&self) -> GraphResult<GraphId> {
        self.link.ok_or_else(|| GraphError::ReferenceNotLinked {
            edge_id: self.id.clone(),
        })
    }
}

/// Equality over the durable fields. The runtime link is ignored.
impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.description == other.description
            && self.start_node_id == other.start_node_id
            && self.end_node_id == other.end_node_id
    }
}

impl Eq for Edge {}
