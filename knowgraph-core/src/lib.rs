//! Knowgraph Core - Entity model for knowledge graphs
//!
//! This crate defines the values a knowledge graph is made of: labeled
//! nodes, labeled directed edges, and the errors graph operations report.
//! It has no notion of a container; `knowgraph-graph` owns nodes and
//! edges and keeps their cross-references consistent.
//!
//! # Example
//!
//! ```
//! use knowgraph_core::{Edge, Node};
//!
//! let algebra = Node::new("Algebra").with_tags(["math"]);
//! let groups = Node::new("Group theory").with_tags(["math", "algebra"]);
//! let edge = Edge::new(&algebra.id, &groups.id, "includes");
//!
//! // Not attached to any graph yet.
//! assert!(!edge.is_linked());
//! ```

pub mod edge;
pub mod error;
pub mod node;

pub use edge::{Edge, GraphId};
pub use error::{Endpoint, EntityKind, GraphError, GraphResult};
pub use node::{generate_id, Node};
