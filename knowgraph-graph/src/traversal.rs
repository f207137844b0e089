//! Breadth-first traversals over outgoing edges.
//!
//! The graph is directed: every traversal here follows edges from their
//! start node to their end node only.

use crate::graph::KnowledgeGraph;
use knowgraph_core::{Edge, GraphError, GraphResult};
use std::collections::{HashMap, HashSet, VecDeque};

impl KnowledgeGraph {
    /// Finds a shortest directed path from `start` to `goal`.
    ///
    /// Path length is the number of edges. Returns `[start]` when both ids
    /// are equal and an empty vector when `goal` is unreachable. Among
    /// several shortest paths, the one discovered first in BFS order wins.
    pub fn find_path(&self, start: &str, goal: &str) -> GraphResult<Vec<String>> {
        if !self.contains_node(start) {
            return Err(GraphError::node_not_found(start));
        }
        if !self.contains_node(goal) {
            return Err(GraphError::node_not_found(goal));
        }
        if start == goal {
            return Ok(vec![start.to_string()]);
        }

        // Parent of every discovered node; the start has none.
        let mut parent: HashMap<&str, Option<&str>> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        parent.insert(start, None);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == goal {
                let mut path = Vec::new();
                let mut cursor = Some(current);
                while let Some(id) = cursor {
                    path.push(id.to_string());
                    cursor = parent.get(id).copied().flatten();
                }
                path.reverse();
                return Ok(path);
            }

            for neighbor in self.out_targets(current) {
                if !parent.contains_key(neighbor) {
                    parent.insert(neighbor, Some(current));
                    queue.push_back(neighbor);
                }
            }
        }

        Ok(Vec::new())
    }

    /// The edges joining consecutive nodes of a path.
    ///
    /// When several edges join the same pair, the first attached wins.
    /// Fails if a step of the path has no edge.
    pub fn path_edges(&self, path: &[String]) -> GraphResult<Vec<&Edge>> {
        path.windows(2)
            .map(|step| {
                self.edges_between(&step[0], &step[1])?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        GraphError::InvalidQuery(format!(
                            "no edge from {} to {}",
                            step[0], step[1]
                        ))
                    })
            })
            .collect()
    }

    /// Extracts the neighborhood reachable from `start` within `k` hops.
    ///
    /// The result is a new graph holding copies of every reached node
    /// (the start included) and of every traversed edge whose endpoints
    /// both made it into the copy. Nothing is shared with `self`.
    pub fn get_k_hop_neighborhood(&self, start: &str, k: usize) -> GraphResult<KnowledgeGraph> {
        let start_node = self
            .get_node(start)
            .ok_or_else(|| GraphError::node_not_found(start))?;

        let mut subgraph = KnowledgeGraph::new(format!("{}_subgraph", self.name));
        subgraph.add_node(start_node.clone())?;

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        visited.insert(start_node.id.as_str());
        queue.push_back((start_node.id.as_str(), 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= k {
                continue;
            }

            for edge in self.out_edges_of(current) {
                let neighbor = edge.end_node_id.as_str();

                if visited.insert(neighbor) {
                    if let Some(node) = self.get_node(neighbor) {
                        subgraph.add_node(node.clone())?;
                        queue.push_back((neighbor, depth + 1));
                    }
                }

                if !subgraph.contains_edge(&edge.id)
                    && subgraph.contains_node(&edge.start_node_id)
                    && subgraph.contains_node(&edge.end_node_id)
                {
                    let mut copy = edge.clone();
                    copy.detach();
                    subgraph.add_edge(copy)?;
                }
            }
        }

        Ok(subgraph)
    }

    /// Outgoing edges of a node known to exist.
    pub(crate) fn out_edges_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|node| node.out_edges().iter())
            .filter_map(move |edge_id| self.edges.get(edge_id))
    }

    /// End node ids of a node's outgoing edges, in attachment order.
    fn out_targets<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.out_edges_of(id).map(|edge| edge.end_node_id.as_str())
    }
}
