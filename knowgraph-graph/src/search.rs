//! Keyword and tag search over nodes and edges.
//!
//! All searches are linear scans in insertion order. Case-insensitive
//! matching lowercases both the query and the searched text.

use crate::graph::KnowledgeGraph;
use knowgraph_core::{Edge, GraphError, GraphResult, Node};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// How a tag query combines its tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMatch {
    /// The node must carry every queried tag.
    #[default]
    All,
    /// The node must carry at least one queried tag.
    Any,
}

impl FromStr for TagMatch {
    type Err = GraphError;

    /// Parses `AND` / `OR` (any case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::All),
            "OR" => Ok(Self::Any),
            other => Err(GraphError::InvalidQuery(format!(
                "unknown tag match mode {:?}, expected AND or OR",
                other
            ))),
        }
    }
}

impl fmt::Display for TagMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "AND"),
            Self::Any => write!(f, "OR"),
        }
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

fn text_matches(term: &str, text: Option<&str>, case_sensitive: bool) -> bool {
    text.is_some_and(|text| fold(text, case_sensitive).contains(term))
}

impl KnowledgeGraph {
    /// Nodes whose title, description or space-joined tags contain `keyword`.
    pub fn search_nodes_by_keyword(&self, keyword: &str, case_sensitive: bool) -> Vec<&Node> {
        let term = fold(keyword, case_sensitive);

        self.nodes
            .values()
            .filter(|node| {
                let tags = node
                    .tags
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                text_matches(&term, Some(&node.title), case_sensitive)
                    || text_matches(&term, node.description.as_deref(), case_sensitive)
                    || text_matches(&term, Some(&tags), case_sensitive)
            })
            .collect()
    }

    /// Edges whose title or description contain `keyword`.
    pub fn search_edges_by_keyword(&self, keyword: &str, case_sensitive: bool) -> Vec<&Edge> {
        let term = fold(keyword, case_sensitive);

        self.edges
            .values()
            .filter(|edge| {
                text_matches(&term, Some(&edge.title), case_sensitive)
                    || text_matches(&term, edge.description.as_deref(), case_sensitive)
            })
            .collect()
    }

    /// Nodes whose tags satisfy the query.
    ///
    /// An empty tag list matches nothing, in either mode.
    pub fn search_nodes_by_tag<S: AsRef<str>>(
        &self,
        tags: &[S],
        mode: TagMatch,
        case_sensitive: bool,
    ) -> GraphResult<Vec<&Node>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let wanted: BTreeSet<String> = tags
            .iter()
            .map(|tag| fold(tag.as_ref(), case_sensitive))
            .collect();

        Ok(self
            .nodes
            .values()
            .filter(|node| {
                let have: BTreeSet<String> = node
                    .tags
                    .iter()
                    .map(|tag| fold(tag, case_sensitive))
                    .collect();
                match mode {
                    TagMatch::All => wanted.is_subset(&have),
                    TagMatch::Any => !wanted.is_disjoint(&have),
                }
            })
            .collect())
    }

    /// The `k` most frequent tags across all nodes with their counts.
    ///
    /// Equal counts are ordered by tag name.
    pub fn get_top_k_tags(&self, k: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tag in self.nodes.values().flat_map(|node| node.tags.iter()) {
            *counts.entry(tag.as_str()).or_default() += 1;
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new("library");
        graph
            .add_node(
                Node::new("Linear Algebra")
                    .with_id("x")
                    .with_tags(["math", "algebra"]),
            )
            .unwrap();
        graph
            .add_node(Node::new("Calculus").with_id("y").with_tags(["math"]))
            .unwrap();
        graph
            .add_node(
                Node::new("Borrow checker")
                    .with_id("z")
                    .with_description("Rust ownership rules")
                    .with_tags(["Rust"]),
            )
            .unwrap();
        graph
            .add_edge(
                Edge::new("x", "y", "precedes")
                    .with_id("xy")
                    .with_description("Usually taught first"),
            )
            .unwrap();
        graph
    }

    fn ids(nodes: &[&Node]) -> Vec<String> {
        nodes.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn test_tag_and() {
        let graph = library();
        let found = graph
            .search_nodes_by_tag(&["math", "algebra"], TagMatch::All, false)
            .unwrap();
        assert_eq!(ids(&found), vec!["x"]);
    }

    #[test]
    fn test_tag_or() {
        let graph = library();
        let found = graph
            .search_nodes_by_tag(&["math"], TagMatch::Any, false)
            .unwrap();
        let mut found = ids(&found);
        found.sort();
        assert_eq!(found, vec!["x", "y"]);
    }

    #[test]
    fn test_tag_case_sensitivity() {
        let graph = library();
        assert_eq!(
            graph
                .search_nodes_by_tag(&["rust"], TagMatch::All, false)
                .unwrap()
                .len(),
            1
        );
        assert!(graph
            .search_nodes_by_tag(&["rust"], TagMatch::All, true)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_tag_query_matches_nothing() {
        let graph = library();
        let empty: [&str; 0] = [];
        for mode in [TagMatch::Any, TagMatch::All] {
            for case_sensitive in [false, true] {
                assert!(graph
                    .search_nodes_by_tag(&empty, mode, case_sensitive)
                    .unwrap()
                    .is_empty());
            }
        }
    }

    #[test]
    fn test_tag_match_parse() {
        assert_eq!("and".parse::<TagMatch>().unwrap(), TagMatch::All);
        assert_eq!("OR".parse::<TagMatch>().unwrap(), TagMatch::Any);
        assert!("XOR".parse::<TagMatch>().is_err());
        assert_eq!(TagMatch::Any.to_string(), "OR");
    }

    #[test]
    fn test_keyword_matches_title_description_and_tags() {
        let graph = library();
        assert_eq!(ids(&graph.search_nodes_by_keyword("calc", false)), vec!["y"]);
        assert_eq!(ids(&graph.search_nodes_by_keyword("OWNERSHIP", false)), vec!["z"]);
        assert_eq!(
            ids(&graph.search_nodes_by_keyword("algebra", false)),
            vec!["x"]
        );
        // Space-joined tags: "algebra math" contains "a m".
        assert_eq!(ids(&graph.search_nodes_by_keyword("a m", false)), vec!["x"]);
    }

    #[test]
    fn test_keyword_case_sensitive() {
        let graph = library();
        assert!(graph.search_nodes_by_keyword("calculus", true).is_empty());
        assert_eq!(ids(&graph.search_nodes_by_keyword("Calculus", true)), vec!["y"]);
    }

    #[test]
    fn test_edge_keyword() {
        let graph = library();
        let found = graph.search_edges_by_keyword("taught", false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "xy");
        assert!(graph.search_edges_by_keyword("Precedes", true).is_empty());
    }

    #[test]
    fn test_top_k_tags() {
        let graph = library();
        let top = graph.get_top_k_tags(2);
        assert_eq!(
            top,
            vec![("math".to_string(), 2), ("Rust".to_string(), 1)]
        );
        assert!(KnowledgeGraph::new("empty").get_top_k_tags(3).is_empty());
    }
}
