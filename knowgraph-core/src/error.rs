//! Error types for graph operations.
//!
//! Every variant is a local, recoverable condition reported to the
//! immediate caller. None of them mean the graph itself is corrupt.

use std::fmt;
use thiserror::Error;

/// Which kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Edge,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Edge => write!(f, "edge"),
        }
    }
}

/// One end of a directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    End,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An id collision on insert.
    #[error("{kind} id {id} already exists")]
    DuplicateId { kind: EntityKind, id: String },

    /// A referenced node or edge does not exist.
    #[error("{kind} id {id} does not exist")]
    NotFound { kind: EntityKind, id: String },

    /// An edge names an endpoint that is not in the graph being loaded.
    #[error("edge {edge_id} references missing {endpoint} node {node_id}")]
    DanglingReference {
        edge_id: String,
        endpoint: Endpoint,
        node_id: String,
    },

    /// An edge's endpoints were resolved before it was attached to a graph.
    #[error("edge {edge_id} is not linked to a graph; add it to a graph first")]
    ReferenceNotLinked { edge_id: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl GraphError {
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Node,
            id: id.into(),
        }
    }

    pub fn edge_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Edge,
            id: id.into(),
        }
    }

    pub fn duplicate_node(id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind: EntityKind::Node,
            id: id.into(),
        }
    }

    pub fn duplicate_edge(id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind: EntityKind::Edge,
            id: id.into(),
        }
    }
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
