//! Knowgraph Graph - In-memory directed knowledge graphs
//!
//! This crate owns nodes and edges and keeps their cross-references
//! consistent. On top of the container it provides traversals, degree
//! and centrality rankings, keyword and tag search, a JSON persistence
//! codec, and a catalog of named graphs stored in one directory.
//!
//! # Architecture
//!
//! `KnowledgeGraph` keeps nodes and edges in insertion-ordered maps keyed
//! by id. Each node records the ids of its incoming and outgoing edges;
//! each attached edge carries a link to its owning graph, so endpoint
//! lookups can only go through that graph. Centrality runs on a petgraph
//! projection built on demand.
//!
//! # Example
//!
//! ```
//! use knowgraph_graph::KnowledgeGraph;
//! use knowgraph_core::{Edge, Node};
//!
//! let mut graph = KnowledgeGraph::new("math");
//! graph.add_node(Node::new("Sets").with_id("sets")).unwrap();
//! graph.add_node(Node::new("Groups").with_id("groups")).unwrap();
//! graph.add_edge(Edge::new("sets", "groups", "underlies")).unwrap();
//!
//! assert_eq!(graph.find_path("sets", "groups").unwrap(), vec!["sets", "groups"]);
//! ```

mod builder;
mod catalog;
mod config;
mod graph;
mod ranking;
mod search;
mod store;
mod summary;
mod traversal;

pub use builder::{BatchItemError, BatchReport, DeleteReport, EdgeSpec, GraphBuilder, NodeSpec};
pub use catalog::{
    CatalogError, CatalogResult, GraphCatalog, LoadFailure, ReloadReport, SaveReport,
};
pub use config::{KnowgraphConfig, DEFAULT_SUMMARY_LIMIT};
pub use graph::{EdgePatch, GraphStats, KnowledgeGraph, NodePatch};
pub use ranking::{CentralityConfig, CentralityScores, DEFAULT_SAMPLE_RATIO, DEFAULT_SAMPLE_SEED};
pub use search::TagMatch;
pub use store::{GraphDocument, StoreError};
pub use summary::{sample_nodes, EdgeBrief, GraphSummary, RankedNode, ScoredNode};
