//! High-level graph overview and random sampling.

use crate::graph::KnowledgeGraph;
use crate::ranking::CentralityConfig;
use knowgraph_core::{Edge, Node};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Picks up to `count` distinct nodes uniformly at random.
pub fn sample_nodes<'a, R: Rng + ?Sized>(
    graph: &'a KnowledgeGraph,
    count: usize,
    rng: &mut R,
) -> Vec<&'a Node> {
    let all = graph.get_all_node();
    all.choose_multiple(rng, count.min(all.len()))
        .copied()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    pub id: String,
    pub title: String,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredNode {
    pub id: String,
    pub title: String,
    pub score: f64,
}

/// An edge rendered with its endpoint titles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeBrief {
    pub id: String,
    pub title: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub top_in_degree: Vec<RankedNode>,
    pub top_out_degree: Vec<RankedNode>,
    pub top_betweenness: Vec<ScoredNode>,
    pub sampled_edges: Vec<EdgeBrief>,
    pub top_tags: Vec<(String, usize)>,
}

fn ranked(pairs: Vec<(&Node, usize)>) -> Vec<RankedNode> {
    pairs
        .into_iter()
        .map(|(node, degree)| RankedNode {
            id: node.id.clone(),
            title: node.title.clone(),
            degree,
        })
        .collect()
}

impl GraphSummary {
    /// Summarizes `graph` with at most `limit` entries per section.
    ///
    /// Betweenness is approximate and edge sampling uses the configured
    /// seed, so the same graph and config give the same summary.
    pub fn build(graph: &KnowledgeGraph, limit: usize, config: &CentralityConfig) -> Self {
        let top_betweenness = graph
            .get_high_betweenness_centrality_nodes_with(limit, true, config)
            .into_iter()
            .map(|(node, score)| ScoredNode {
                id: node.id.clone(),
                title: node.title.clone(),
                score,
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let edges = graph.get_all_edge();
        let sampled_edges = edges
            .choose_multiple(&mut rng, limit.min(edges.len()))
            .filter_map(|edge| brief(graph, edge))
            .collect();

        Self {
            name: graph.name().to_string(),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            top_in_degree: ranked(graph.get_high_in_degree_nodes(limit)),
            top_out_degree: ranked(graph.get_high_out_degree_nodes(limit)),
            top_betweenness,
            sampled_edges,
            top_tags: graph.get_top_k_tags(limit),
        }
    }
}

fn brief(graph: &KnowledgeGraph, edge: &Edge) -> Option<EdgeBrief> {
    let from = graph.start_node(edge).ok()?;
    let to = graph.end_node(edge).ok()?;
    Some(EdgeBrief {
        id: edge.id.clone(),
        title: edge.title.clone(),
        from: from.title.clone(),
        to: to.title.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new("star");
        graph
            .add_node(Node::new("Hub").with_id("hub").with_tags(["core"]))
            .unwrap();
        for i in 0..5 {
            let id = format!("leaf{}", i);
            graph
                .add_node(Node::new(format!("Leaf {}", i)).with_id(&id).with_tags(["leaf"]))
                .unwrap();
            graph
                .add_edge(Edge::new("hub", id.as_str(), "points to"))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_sample_nodes_is_distinct_and_clamped() {
        let graph = star();
        let mut rng = StdRng::seed_from_u64(1);

        let sample = sample_nodes(&graph, 3, &mut rng);
        assert_eq!(sample.len(), 3);
        let mut ids: Vec<&str> = sample.iter().map(|n| n.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);

        assert_eq!(sample_nodes(&graph, 100, &mut rng).len(), 6);
        assert!(sample_nodes(&KnowledgeGraph::new("e"), 3, &mut rng).is_empty());
    }

    #[test]
    fn test_summary_sections() {
        let graph = star();
        let summary = GraphSummary::build(&graph, 2, &CentralityConfig::default());

        assert_eq!(summary.name, "star");
        assert_eq!(summary.node_count, 6);
        assert_eq!(summary.edge_count, 5);
        assert_eq!(summary.top_out_degree[0].id, "hub");
        assert_eq!(summary.top_out_degree[0].degree, 5);
        assert_eq!(summary.top_in_degree.len(), 2);
        assert_eq!(summary.sampled_edges.len(), 2);
        assert!(summary.sampled_edges.iter().all(|e| e.from == "Hub"));
        assert_eq!(summary.top_tags[0], ("leaf".to_string(), 5));
    }

    #[test]
    fn test_summary_is_reproducible() {
        let graph = star();
        let config = CentralityConfig::default();
        assert_eq!(
            GraphSummary::build(&graph, 3, &config),
            GraphSummary::build(&graph, 3, &config)
        );
    }

    #[test]
    fn test_summary_of_empty_graph() {
        let summary = GraphSummary::build(&KnowledgeGraph::new("e"), 5, &CentralityConfig::default());
        assert_eq!(summary.node_count, 0);
        assert!(summary.top_betweenness.is_empty());
        assert!(summary.sampled_edges.is_empty());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "e");
    }
}
