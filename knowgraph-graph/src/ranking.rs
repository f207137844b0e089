//! Degree and centrality rankings.
//!
//! Centrality runs on a petgraph projection of the container: one vertex
//! per node in insertion order and at most one arc per ordered node pair.
//! Distances are unweighted hop counts along edge direction.
//!
//! Exact betweenness is Brandes' algorithm, O(V·E). It is blocking and has
//! no suspension points; callers that need responsiveness should run it
//! on a worker thread.

use crate::graph::KnowledgeGraph;
use indexmap::IndexMap;
use knowgraph_core::Node;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Default share of nodes used as sources by approximate betweenness.
pub const DEFAULT_SAMPLE_RATIO: f64 = 0.2;

/// Default seed for source sampling.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Tuning for centrality computations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    /// Fraction of nodes sampled as BFS sources in approximate mode.
    pub sample_ratio: f64,

    /// Seed for the sampling RNG. The same seed and graph give the same
    /// scores.
    pub seed: u64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

impl CentralityConfig {
    /// Number of sources to sample out of `n` nodes. Never zero for a
    /// non-empty graph and never more than `n`.
    pub fn sample_size(&self, n: usize) -> usize {
        let wanted = (n as f64 * self.sample_ratio).floor() as usize;
        wanted.clamp(1.min(n), n)
    }
}

/// Centrality score per node id, in node insertion order.
#[derive(Debug, Clone, Default)]
pub struct CentralityScores {
    scores: IndexMap<String, f64>,
}

impl CentralityScores {
    pub fn get(&self, id: &str) -> Option<f64> {
        self.scores.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Ids sorted by score, highest first. Equal scores keep node order.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut pairs: Vec<(&str, f64)> = self
            .scores
            .iter()
            .map(|(id, score)| (id.as_str(), *score))
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs
    }

    pub fn top(&self, k: usize) -> Vec<(&str, f64)> {
        let mut ranked = self.ranked();
        ranked.truncate(k);
        ranked
    }

    pub fn into_map(self) -> IndexMap<String, f64> {
        self.scores
    }
}

/// Directed projection used by the centrality passes.
struct Projection {
    graph: DiGraph<(), ()>,
}

impl Projection {
    fn build(source: &KnowledgeGraph) -> Self {
        let mut graph = DiGraph::with_capacity(source.node_count(), source.edge_count());
        for _ in 0..source.node_count() {
            graph.add_node(());
        }

        for edge in source.edges.values() {
            let start = source.nodes.get_index_of(&edge.start_node_id);
            let end = source.nodes.get_index_of(&edge.end_node_id);
            if let (Some(start), Some(end)) = (start, end) {
                // Parallel edges collapse into one arc.
                graph.update_edge(NodeIndex::new(start), NodeIndex::new(end), ());
            }
        }

        Self { graph }
    }

    fn len(&self) -> usize {
        self.graph.node_count()
    }

    fn successors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(v), Direction::Outgoing)
            .map(|n| n.index())
    }

    /// Hop distances from `source`; `None` for unreachable nodes.
    fn distances_from(&self, source: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.len()];
        dist[source] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let next = dist[v].map_or(0, |d| d + 1);
            for w in self.successors(v) {
                if dist[w].is_none() {
                    dist[w] = Some(next);
                    queue.push_back(w);
                }
            }
        }
        dist
    }

    /// Adds the dependencies of one Brandes source into `centrality`.
    fn accumulate_brandes(&self, s: usize, centrality: &mut [f64]) {
        let n = self.len();
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist: Vec<i64> = vec![-1; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in self.successors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }
}

impl KnowledgeGraph {
    /// Nodes ranked by number of incoming edges, highest first.
    pub fn get_high_in_degree_nodes(&self, k: usize) -> Vec<(&Node, usize)> {
        self.rank_by_degree(k, Node::in_degree)
    }

    /// Nodes ranked by number of outgoing edges, highest first.
    pub fn get_high_out_degree_nodes(&self, k: usize) -> Vec<(&Node, usize)> {
        self.rank_by_degree(k, Node::out_degree)
    }

    fn rank_by_degree(&self, k: usize, degree: fn(&Node) -> usize) -> Vec<(&Node, usize)> {
        let mut ranked: Vec<(&Node, usize)> =
            self.nodes.values().map(|node| (node, degree(node))).collect();
        // Stable: equal degrees keep insertion order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Normalized betweenness centrality of every node.
    ///
    /// Scores are divided by `(n-1)(n-2)`, the number of ordered pairs a
    /// node can sit between. In approximate mode only a seeded sample of
    /// sources is expanded and the sum is scaled by `n / samples`.
    pub fn betweenness_centrality(
        &self,
        approximate: bool,
        config: &CentralityConfig,
    ) -> CentralityScores {
        let projection = Projection::build(self);
        let n = projection.len();
        if n == 0 {
            return CentralityScores::default();
        }

        let sources: Vec<usize> = if approximate {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let mut sampled = rand::seq::index::sample(&mut rng, n, config.sample_size(n)).into_vec();
            sampled.sort_unstable();
            sampled
        } else {
            (0..n).collect()
        };
        debug!(
            "graph {}: betweenness over {} of {} sources",
            self.name,
            sources.len(),
            n
        );

        let mut centrality = vec![0.0_f64; n];
        for &s in &sources {
            projection.accumulate_brandes(s, &mut centrality);
        }

        if n > 2 {
            let mut scale = 1.0 / ((n - 1) * (n - 2)) as f64;
            if approximate {
                scale *= n as f64 / sources.len() as f64;
            }
            for score in &mut centrality {
                *score *= scale;
            }
        }

        self.scores_from(centrality)
    }

    /// Closeness centrality of every node along outgoing edges.
    ///
    /// For a node reaching `r` others with total distance `d`, the score
    /// is `(r / d) * (r / (n - 1))`: the reciprocal of the mean distance,
    /// scaled down by the share of the graph it can reach. Nodes that
    /// reach nothing score zero.
    pub fn closeness_centrality(&self) -> CentralityScores {
        let projection = Projection::build(self);
        let n = projection.len();

        let centrality: Vec<f64> = (0..n)
            .map(|v| {
                let reached: Vec<usize> = projection
                    .distances_from(v)
                    .into_iter()
                    .flatten()
                    .filter(|&d| d > 0)
                    .collect();
                let total: usize = reached.iter().sum();
                if total == 0 || n <= 1 {
                    return 0.0;
                }
                let r = reached.len() as f64;
                (r / total as f64) * (r / (n - 1) as f64)
            })
            .collect();

        self.scores_from(centrality)
    }

    /// Top `k` nodes by betweenness centrality, using default tuning.
    pub fn get_high_betweenness_centrality_nodes(
        &self,
        k: usize,
        approximate: bool,
    ) -> Vec<(&Node, f64)> {
        self.get_high_betweenness_centrality_nodes_with(k, approximate, &CentralityConfig::default())
    }

    pub fn get_high_betweenness_centrality_nodes_with(
        &self,
        k: usize,
        approximate: bool,
        config: &CentralityConfig,
    ) -> Vec<(&Node, f64)> {
        let scores = self.betweenness_centrality(approximate, config);
        self.resolve_top(&scores, k)
    }

    /// Top `k` nodes by closeness centrality.
    pub fn get_high_closeness_centrality_nodes(&self, k: usize) -> Vec<(&Node, f64)> {
        let scores = self.closeness_centrality();
        self.resolve_top(&scores, k)
    }

    fn scores_from(&self, values: Vec<f64>) -> CentralityScores {
        CentralityScores {
            scores: self.nodes.keys().cloned().zip(values).collect(),
        }
    }

    fn resolve_top(&self, scores: &CentralityScores, k: usize) -> Vec<(&Node, f64)> {
        scores
            .top(k)
            .into_iter()
            .filter_map(|(id, score)| self.nodes.get(id).map(|node| (node, score)))
            .collect()
    }
}
