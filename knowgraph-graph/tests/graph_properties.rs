use knowgraph_core::{Edge, GraphError, Node};
use knowgraph_graph::{KnowledgeGraph, TagMatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Builds a graph from a seeded mix of inserts and removals, including
/// self-loops and parallel edges.
fn random_graph(seed: u64, steps: usize) -> KnowledgeGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = KnowledgeGraph::new(format!("random-{}", seed));

    for step in 0..steps {
        let ids: Vec<String> = graph.nodes().map(|n| n.id.clone()).collect();
        match rng.gen_range(0..10) {
            0..=3 => {
                graph
                    .add_node(Node::new(format!("n{}", step)).with_id(format!("n{}", step)))
                    .unwrap();
            }
            4..=7 if !ids.is_empty() => {
                let from = &ids[rng.gen_range(0..ids.len())];
                let to = &ids[rng.gen_range(0..ids.len())];
                graph
                    .add_edge(Edge::new(from.as_str(), to.as_str(), "rel").with_id(format!("e{}", step)))
                    .unwrap();
            }
            8 if !ids.is_empty() => {
                let victim = &ids[rng.gen_range(0..ids.len())];
                graph.remove_node(victim).unwrap();
            }
            _ => {
                let edge_ids: Vec<String> = graph.edges().map(|e| e.id.clone()).collect();
                if !edge_ids.is_empty() {
                    let victim = &edge_ids[rng.gen_range(0..edge_ids.len())];
                    graph.remove_edge(victim).unwrap();
                }
            }
        }
    }
    graph
}

fn assert_adjacency_consistent(graph: &KnowledgeGraph) {
    for edge in graph.edges() {
        let out_holders = graph
            .nodes()
            .filter(|n| n.out_edges().contains(&edge.id))
            .count();
        let in_holders = graph
            .nodes()
            .filter(|n| n.in_edges().contains(&edge.id))
            .count();
        assert_eq!(out_holders, 1, "edge {} out-holders", edge.id);
        assert_eq!(in_holders, 1, "edge {} in-holders", edge.id);
        assert!(graph.get_node(&edge.start_node_id).unwrap().out_edges().contains(&edge.id));
        assert!(graph.get_node(&edge.end_node_id).unwrap().in_edges().contains(&edge.id));
    }
    for node in graph.nodes() {
        for id in node.in_edges().iter().chain(node.out_edges()) {
            assert!(graph.contains_edge(id), "node {} lists stale edge {}", node.id, id);
        }
    }
}

/// All-pairs hop distances, computed independently of the BFS in the crate.
fn floyd_warshall(graph: &KnowledgeGraph) -> HashMap<(String, String), usize> {
    let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
    let mut dist: HashMap<(String, String), usize> = HashMap::new();
    for id in &ids {
        dist.insert((id.to_string(), id.to_string()), 0);
    }
    for edge in graph.edges() {
        let key = (edge.start_node_id.clone(), edge.end_node_id.clone());
        let entry = dist.entry(key).or_insert(1);
        *entry = (*entry).min(1);
    }
    for k in &ids {
        for i in &ids {
            for j in &ids {
                let ik = dist.get(&(i.to_string(), k.to_string())).copied();
                let kj = dist.get(&(k.to_string(), j.to_string())).copied();
                if let (Some(a), Some(b)) = (ik, kj) {
                    let entry = dist.entry((i.to_string(), j.to_string())).or_insert(a + b);
                    *entry = (*entry).min(a + b);
                }
            }
        }
    }
    dist
}

#[test]
fn test_adjacency_stays_consistent() {
    for seed in 0..20 {
        let graph = random_graph(seed, 80);
        assert_adjacency_consistent(&graph);
    }
}

#[test]
fn test_remove_node_cascades() {
    for seed in 0..10 {
        let mut graph = random_graph(seed, 60);
        let Some(victim) = graph.nodes().next().map(|n| n.id.clone()) else {
            continue;
        };
        let touching = graph.get_node(&victim).unwrap().incident_edges();

        graph.remove_node(&victim).unwrap();

        assert!(graph
            .edges()
            .all(|e| e.start_node_id != victim && e.end_node_id != victim));
        for node in graph.nodes() {
            for id in node.in_edges().iter().chain(node.out_edges()) {
                assert!(!touching.contains(id));
            }
        }
        assert_adjacency_consistent(&graph);
    }
}

#[test]
fn test_round_trip_preserves_everything() {
    for seed in 0..10 {
        let graph = random_graph(seed, 60);
        let json = graph.to_json_string().unwrap();
        let loaded = KnowledgeGraph::from_json_str(&json).unwrap();

        assert_eq!(loaded.to_document(), graph.to_document());
        for (a, b) in graph.nodes().zip(loaded.nodes()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.in_edges(), b.in_edges());
            assert_eq!(a.out_edges(), b.out_edges());
        }
        for edge in loaded.edges() {
            assert_eq!(loaded.start_node(edge).unwrap().id, edge.start_node_id);
            assert_eq!(loaded.end_node(edge).unwrap().id, edge.end_node_id);
        }
    }
}

#[test]
fn test_find_path_is_minimal() {
    for seed in 0..8 {
        let graph = random_graph(seed, 40);
        let dist = floyd_warshall(&graph);
        let ids: Vec<String> = graph.nodes().map(|n| n.id.clone()).collect();

        for a in &ids {
            assert_eq!(graph.find_path(a, a).unwrap(), vec![a.clone()]);
            for b in &ids {
                let path = graph.find_path(a, b).unwrap();
                match dist.get(&(a.clone(), b.clone())) {
                    None => assert!(path.is_empty(), "{} -> {} should be unreachable", a, b),
                    Some(&d) => {
                        assert_eq!(path.len() - 1, d, "{} -> {}", a, b);
                        assert_eq!(path.first(), Some(a));
                        assert_eq!(path.last(), Some(b));
                        assert_eq!(graph.path_edges(&path).unwrap().len(), d);
                    }
                }
            }
        }
    }
}

#[test]
fn test_chain_example() {
    let mut graph = KnowledgeGraph::new("chain");
    for id in ["A", "B", "C"] {
        graph.add_node(Node::new(id).with_id(id)).unwrap();
    }
    graph.add_edge(Edge::new("A", "B", "to")).unwrap();
    graph.add_edge(Edge::new("B", "C", "to")).unwrap();

    assert_eq!(graph.find_path("A", "C").unwrap(), vec!["A", "B", "C"]);

    graph.remove_node("B").unwrap();
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.find_path("A", "C").unwrap().is_empty());
}

#[test]
fn test_tag_example() {
    let mut graph = KnowledgeGraph::new("tags");
    graph
        .add_node(Node::new("X").with_id("X").with_tags(["math", "algebra"]))
        .unwrap();
    graph
        .add_node(Node::new("Y").with_id("Y").with_tags(["math"]))
        .unwrap();

    let and: Vec<&str> = graph
        .search_nodes_by_tag(&["math", "algebra"], TagMatch::All, false)
        .unwrap()
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(and, vec!["X"]);

    let mut or: Vec<&str> = graph
        .search_nodes_by_tag(&["math"], TagMatch::Any, false)
        .unwrap()
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    or.sort();
    assert_eq!(or, vec!["X", "Y"]);
}

#[test]
fn test_failed_add_edge_changes_nothing() {
    let mut graph = random_graph(3, 40);
    let before = (graph.node_count(), graph.edge_count());

    let err = graph
        .add_edge(Edge::new("no-such-node", "also-missing", "to"))
        .unwrap_err();
    assert_eq!(err, GraphError::node_not_found("no-such-node"));
    assert_eq!((graph.node_count(), graph.edge_count()), before);
    assert_adjacency_consistent(&graph);
}

#[test]
fn test_zero_hop_neighborhood_is_just_start() {
    let graph = random_graph(5, 60);
    for node in graph.nodes() {
        let sub = graph.get_k_hop_neighborhood(&node.id, 0).unwrap();
        assert_eq!(sub.node_count(), 1);
        assert_eq!(sub.edge_count(), 0);
        assert!(sub.contains_node(&node.id));
    }
}

#[test]
fn test_degree_ranking_prefix_is_monotonic() {
    let graph = random_graph(11, 120);
    let n = graph.node_count();
    let full: Vec<String> = graph
        .get_high_out_degree_nodes(n)
        .into_iter()
        .map(|(node, _)| node.id.clone())
        .collect();

    for k in 0..=n {
        let top: Vec<String> = graph
            .get_high_out_degree_nodes(k)
            .into_iter()
            .map(|(node, _)| node.id.clone())
            .collect();
        assert_eq!(top, full[..k]);
    }
}
