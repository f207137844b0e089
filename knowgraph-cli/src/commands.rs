//! CLI command implementations.

use crate::RankBy;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use knowgraph_core::{Edge, Node};
use knowgraph_graph::{
    EdgePatch, GraphBuilder, GraphCatalog, GraphSummary, KnowgraphConfig, KnowledgeGraph,
    NodePatch, TagMatch,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Initialize a knowgraph workspace in a directory.
pub fn init(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    let root = path.canonicalize()?;
    let knowgraph_dir = root.join(".knowgraph");
    let config_path = knowgraph_dir.join("config.json");

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    let config = KnowgraphConfig::with_graph_dir(knowgraph_dir.join("graphs"));
    config.save(&config_path)?;
    fs::create_dir_all(&config.graph_dir)?;

    println!("{} Initialized knowgraph in {}", "✓".green(), root.display());
    println!("  Run {} to create a graph", "knowgraph create <name>".cyan());

    Ok(())
}

/// Loads the catalog, reporting files that could not be read.
fn open_catalog(config: &KnowgraphConfig) -> Result<GraphCatalog> {
    debug!("graph directory: {}", config.graph_dir.display());
    let (catalog, report) = GraphCatalog::open(config)?;
    if !report.failed.is_empty() {
        eprintln!("{} {} graph files could not be loaded:", "⚠".yellow(), report.failed.len());
        for failure in report.failed.iter().take(5) {
            eprintln!("  {} - {}", failure.path.display().to_string().red(), failure.message);
        }
        if report.failed.len() > 5 {
            eprintln!("  ... and {} more", report.failed.len() - 5);
        }
    }
    Ok(catalog)
}

/// Loads the catalog with `name` as the active graph.
fn open_graph(config: &KnowgraphConfig, name: &str) -> Result<GraphCatalog> {
    let mut catalog = open_catalog(config)?;
    catalog.set_active(name)?;
    Ok(catalog)
}

/// Runs a blocking computation on a worker thread behind a spinner.
async fn with_spinner<T, F>(message: &str, job: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = tokio::task::spawn_blocking(job).await;

    spinner.finish_and_clear();
    Ok(result?)
}

fn node_label(node: &Node) -> String {
    format!("{} {}", node.title.cyan(), format!("[{}]", node.id).dimmed())
}

fn print_node(node: &Node) {
    print!("  • {}", node_label(node));
    if !node.tags.is_empty() {
        let tags: Vec<&str> = node.tags.iter().map(String::as_str).collect();
        print!(" {}", tags.join(", ").yellow());
    }
    println!();
    if let Some(description) = &node.description {
        println!("    {}", description.dimmed());
    }
}

fn print_edge(graph: &KnowledgeGraph, edge: &Edge) -> Result<()> {
    let from = graph.start_node(edge)?;
    let to = graph.end_node(edge)?;
    println!(
        "  • {} --[{}]--> {} {}",
        from.title.cyan(),
        edge.title.green(),
        to.title.cyan(),
        format!("[{}]", edge.id).dimmed()
    );
    Ok(())
}

/// Create an empty graph.
pub fn create(config: &KnowgraphConfig, name: &str) -> Result<()> {
    let mut catalog = open_catalog(config)?;
    catalog.create_graph(name)?;
    println!(
        "{} Created graph {} in {}",
        "✓".green(),
        name.cyan(),
        catalog.dir().display()
    );
    Ok(())
}

/// List stored graphs.
pub fn list(config: &KnowgraphConfig) -> Result<()> {
    let catalog = open_catalog(config)?;

    if catalog.is_empty() {
        println!("No graphs in {}", catalog.dir().display());
        println!("  Run {} to create one", "knowgraph create <name>".cyan());
        return Ok(());
    }

    println!("{}", "Graphs".cyan().bold());
    println!();
    for stats in catalog.list() {
        println!(
            "  {} {} nodes, {} edges, {} tags",
            stats.name.cyan(),
            stats.node_count,
            stats.edge_count,
            stats.tag_count
        );
    }
    Ok(())
}

/// Delete a graph and its file.
pub fn drop_graph(config: &KnowgraphConfig, name: &str) -> Result<()> {
    let mut catalog = open_catalog(config)?;
    let graph = catalog.remove_graph(name)?;
    println!(
        "{} Deleted graph {} ({} nodes, {} edges)",
        "✓".green(),
        name.cyan(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(())
}

/// Summarize a graph.
pub async fn summary(config: &KnowgraphConfig, name: &str, json_output: bool) -> Result<()> {
    let catalog = open_graph(config, name)?;
    let graph = catalog.active()?.clone();
    let limit = config.summary_limit;
    let centrality = config.centrality.clone();

    let summary = with_spinner("Summarizing graph...", move || {
        GraphSummary::build(&graph, limit, &centrality)
    })
    .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {}", "Graph".cyan().bold(), summary.name.bold());
    println!();
    println!("  {} {}", "Nodes:".dimmed(), summary.node_count);
    println!("  {} {}", "Edges:".dimmed(), summary.edge_count);
    println!();

    if summary.node_count == 0 {
        return Ok(());
    }

    println!("{}", "Most referenced (in-degree):".yellow());
    for entry in &summary.top_in_degree {
        println!("  • {} ({})", entry.title.cyan(), entry.degree);
    }
    println!();

    println!("{}", "Most referencing (out-degree):".yellow());
    for entry in &summary.top_out_degree {
        println!("  • {} ({})", entry.title.cyan(), entry.degree);
    }
    println!();

    println!("{}", "Bridges (approximate betweenness):".yellow());
    for entry in &summary.top_betweenness {
        println!("  • {} ({:.4})", entry.title.cyan(), entry.score);
    }
    println!();

    if !summary.sampled_edges.is_empty() {
        println!("{}", "Sampled edges:".yellow());
        for edge in &summary.sampled_edges {
            println!(
                "  • {} --[{}]--> {}",
                edge.from.cyan(),
                edge.title.green(),
                edge.to.cyan()
            );
        }
        println!();
    }

    if !summary.top_tags.is_empty() {
        println!("{}", "Top tags:".yellow());
        for (tag, count) in &summary.top_tags {
            println!("  • {} ({})", tag, count);
        }
    }

    Ok(())
}

/// Show a node with its edges and neighbours.
pub fn show(config: &KnowgraphConfig, name: &str, node_id: &str) -> Result<()> {
    let catalog = open_graph(config, name)?;
    let graph = catalog.active()?;
    let node = graph
        .get_node(node_id)
        .ok_or_else(|| format!("Node '{}' not found in graph {}", node_id, name))?;

    println!("{}", node_label(node).bold());
    if let Some(description) = &node.description {
        println!("  {}", description);
    }
    if !node.tags.is_empty() {
        let tags: Vec<&str> = node.tags.iter().map(String::as_str).collect();
        println!("  {} {}", "Tags:".dimmed(), tags.join(", ").yellow());
    }
    println!();

    let outgoing = graph.get_out_edge(node_id)?;
    println!("{} ({})", "Outgoing:".yellow(), outgoing.len());
    for edge in outgoing {
        print_edge(graph, edge)?;
    }

    let incoming = graph.get_in_edge(node_id)?;
    println!("{} ({})", "Incoming:".yellow(), incoming.len());
    for edge in incoming {
        print_edge(graph, edge)?;
    }

    let neighbours = graph.get_neighbours(node_id)?;
    println!("{} ({})", "Neighbours:".yellow(), neighbours.len());
    for neighbour in neighbours {
        print_node(neighbour);
    }

    Ok(())
}

/// Add a node.
pub fn add_node(
    config: &KnowgraphConfig,
    name: &str,
    title: &str,
    id: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    let mut catalog = open_graph(config, name)?;

    let mut node = Node::new(title).with_tags(tags);
    if let Some(id) = id {
        node = node.with_id(id);
    }
    node.description = description;
    let node_id = node.id.clone();

    catalog.active_mut()?.add_node(node)?;
    catalog.save_active()?;

    println!("{} Added node {} [{}]", "✓".green(), title.cyan(), node_id);
    Ok(())
}

/// Add a directed edge.
pub fn add_edge(
    config: &KnowgraphConfig,
    name: &str,
    from: &str,
    to: &str,
    title: &str,
    id: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let mut catalog = open_graph(config, name)?;

    let mut edge = Edge::new(from, to, title);
    if let Some(id) = id {
        edge = edge.with_id(id);
    }
    edge.description = description;
    let edge_id = edge.id.clone();

    catalog.active_mut()?.add_edge(edge)?;
    catalog.save_active()?;

    println!(
        "{} Added edge {} --[{}]--> {} [{}]",
        "✓".green(),
        from.cyan(),
        title.green(),
        to.cyan(),
        edge_id
    );
    Ok(())
}

/// Change display fields of a node.
pub fn update_node(
    config: &KnowgraphConfig,
    name: &str,
    node_id: &str,
    title: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
) -> Result<()> {
    let mut catalog = open_graph(config, name)?;

    let patch = NodePatch {
        title,
        description,
        tags: tags.map(|tags| tags.into_iter().collect()),
    };
    catalog.active_mut()?.update_node(node_id, patch)?;
    catalog.save_active()?;

    println!("{} Updated node {}", "✓".green(), node_id.cyan());
    Ok(())
}

/// Change display fields of an edge.
pub fn update_edge(
    config: &KnowgraphConfig,
    name: &str,
    edge_id: &str,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let mut catalog = open_graph(config, name)?;

    let patch = EdgePatch { title, description };
    catalog.active_mut()?.update_edge(edge_id, patch)?;
    catalog.save_active()?;

    println!("{} Updated edge {}", "✓".green(), edge_id.cyan());
    Ok(())
}

/// Add nodes and edges from a batch file.
pub fn import(config: &KnowgraphConfig, name: &str, file: &Path) -> Result<()> {
    let mut catalog = open_graph(config, name)?;

    let json = fs::read_to_string(file)?;
    let builder = GraphBuilder::from_json(&json)?;
    let report = builder.apply(catalog.active_mut()?);
    catalog.save_active()?;

    println!(
        "{} Imported {} nodes and {} edges into {}",
        "✓".green(),
        report.added_nodes.to_string().cyan(),
        report.added_edges.to_string().cyan(),
        name.cyan()
    );

    if !report.errors.is_empty() {
        println!("\n{} {} items rejected:", "⚠".yellow(), report.errors.len());
        for error in report.errors.iter().take(5) {
            println!("  {} - {}", error.item.red(), error.message);
        }
        if report.errors.len() > 5 {
            println!("  ... and {} more", report.errors.len() - 5);
        }
    }

    Ok(())
}

/// Delete nodes and edges.
pub fn delete(
    config: &KnowgraphConfig,
    name: &str,
    node_ids: &[String],
    edge_ids: &[String],
) -> Result<()> {
    if node_ids.is_empty() && edge_ids.is_empty() {
        return Err("nothing to delete; pass --node or --edge".into());
    }

    let mut catalog = open_graph(config, name)?;
    let report = catalog.active_mut()?.delete_items(node_ids, edge_ids);
    catalog.save_active()?;

    println!(
        "{} Deleted {} nodes and {} edges",
        "✓".green(),
        report.deleted_nodes,
        report.deleted_edges
    );
    if !report.missing_nodes.is_empty() {
        println!("  {} {}", "Nodes not found:".dimmed(), report.missing_nodes.join(", "));
    }
    if !report.missing_edges.is_empty() {
        println!("  {} {}", "Edges not found:".dimmed(), report.missing_edges.join(", "));
    }
    Ok(())
}

/// Find a shortest directed path.
pub fn path(config: &KnowgraphConfig, name: &str, from: &str, to: &str) -> Result<()> {
    let catalog = open_graph(config, name)?;
    let graph = catalog.active()?;

    let path = graph.find_path(from, to)?;
    if path.is_empty() {
        println!("No path from {} to {}", from.cyan(), to.cyan());
        return Ok(());
    }

    println!("Path of {} hops:\n", path.len() - 1);
    for edge in graph.path_edges(&path)? {
        print_edge(graph, edge)?;
    }
    if path.len() == 1 {
        if let Some(node) = graph.get_node(&path[0]) {
            print_node(node);
        }
    }
    Ok(())
}

/// Search by keyword.
pub fn search(
    config: &KnowgraphConfig,
    name: &str,
    keyword: &str,
    case_sensitive: bool,
    edges: bool,
) -> Result<()> {
    let catalog = open_graph(config, name)?;
    let graph = catalog.active()?;

    if edges {
        let matches = graph.search_edges_by_keyword(keyword, case_sensitive);
        if matches.is_empty() {
            println!("No edges match \"{}\"", keyword);
            return Ok(());
        }
        println!("Found {} edges:\n", matches.len());
        for edge in matches {
            print_edge(graph, edge)?;
        }
    } else {
        let matches = graph.search_nodes_by_keyword(keyword, case_sensitive);
        if matches.is_empty() {
            println!("No nodes match \"{}\"", keyword);
            return Ok(());
        }
        println!("Found {} nodes:\n", matches.len());
        for node in matches {
            print_node(node);
        }
    }
    Ok(())
}

/// Find nodes by tag.
pub fn tags(
    config: &KnowgraphConfig,
    name: &str,
    tags: &[String],
    any: bool,
    case_sensitive: bool,
) -> Result<()> {
    let catalog = open_graph(config, name)?;
    let graph = catalog.active()?;

    let mode = if any { TagMatch::Any } else { TagMatch::All };
    let matches = graph.search_nodes_by_tag(tags, mode, case_sensitive)?;

    if matches.is_empty() {
        println!("No nodes tagged {} ({})", tags.join(", ").yellow(), mode);
        return Ok(());
    }
    println!("Found {} nodes ({}):\n", matches.len(), mode);
    for node in matches {
        print_node(node);
    }
    Ok(())
}

/// Rank nodes.
pub async fn rank(
    config: &KnowgraphConfig,
    name: &str,
    by: RankBy,
    limit: usize,
    approximate: bool,
) -> Result<()> {
    let catalog = open_graph(config, name)?;
    let graph = catalog.active()?;

    let rows: Vec<(String, String, String)> = match by {
        RankBy::In => graph
            .get_high_in_degree_nodes(limit)
            .into_iter()
            .map(|(node, degree)| (node.id.clone(), node.title.clone(), degree.to_string()))
            .collect(),
        RankBy::Out => graph
            .get_high_out_degree_nodes(limit)
            .into_iter()
            .map(|(node, degree)| (node.id.clone(), node.title.clone(), degree.to_string()))
            .collect(),
        RankBy::Betweenness | RankBy::Closeness => {
            let owned = graph.clone();
            let centrality = config.centrality.clone();
            with_spinner("Computing centrality...", move || {
                let top = if by == RankBy::Betweenness {
                    owned.get_high_betweenness_centrality_nodes_with(limit, approximate, &centrality)
                } else {
                    owned.get_high_closeness_centrality_nodes(limit)
                };
                top.into_iter()
                    .map(|(node, score)| (node.id.clone(), node.title.clone(), format!("{:.4}", score)))
                    .collect::<Vec<_>>()
            })
            .await?
        }
    };

    if rows.is_empty() {
        println!("Graph {} has no nodes", name.cyan());
        return Ok(());
    }

    println!("{} by {:?}\n", "Ranking".cyan().bold(), by);
    for (rank, (id, title, score)) in rows.iter().enumerate() {
        println!(
            "  {:>3}. {} {} {}",
            rank + 1,
            title.cyan(),
            format!("[{}]", id).dimmed(),
            score.bold()
        );
    }
    Ok(())
}

/// Extract a k-hop neighbourhood.
pub fn hood(
    config: &KnowgraphConfig,
    name: &str,
    node_id: &str,
    hops: usize,
    output: Option<&Path>,
) -> Result<()> {
    let catalog = open_graph(config, name)?;
    let graph = catalog.active()?;

    let sub = graph.get_k_hop_neighborhood(node_id, hops)?;

    println!(
        "{} within {} hops of {}: {} nodes, {} edges\n",
        "Neighbourhood".cyan().bold(),
        hops,
        node_id.cyan(),
        sub.node_count(),
        sub.edge_count()
    );
    for node in sub.nodes() {
        print_node(node);
    }
    if sub.edge_count() > 0 {
        println!();
        for edge in sub.edges() {
            print_edge(&sub, edge)?;
        }
    }

    if let Some(out_path) = output {
        sub.save_to_file(out_path)?;
        println!("\n{} Exported to {}", "✓".green(), out_path.display());
    }
    Ok(())
}
