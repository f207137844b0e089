//! Knowgraph CLI - Command-line interface for Knowgraph
//!
//! This is the main entry point for users working with knowledge graphs.
//! It provides commands for building, querying, and ranking graphs stored
//! in a local graph directory.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use knowgraph_graph::KnowgraphConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "knowgraph")]
#[command(author = "Knowgraph Contributors")]
#[command(version)]
#[command(about = "Build, query and rank directed knowledge graphs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./.knowgraph/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Ranking criteria for `rank`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RankBy {
    /// Incoming edge count
    In,
    /// Outgoing edge count
    Out,
    /// Betweenness centrality
    Betweenness,
    /// Closeness centrality
    Closeness,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a knowgraph workspace in a directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Create an empty graph
    Create {
        /// Graph name
        name: String,
    },

    /// List stored graphs
    List,

    /// Delete a graph and its file
    Drop {
        /// Graph name
        name: String,
    },

    /// Summarize a graph: degrees, centrality, sampled edges, tags
    Summary {
        graph: String,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Show a node with its edges and neighbours
    Show {
        graph: String,

        /// Node id
        node: String,
    },

    /// Add a node
    AddNode {
        graph: String,

        title: String,

        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Tag to attach; repeatable
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Add a directed edge between two existing nodes
    AddEdge {
        graph: String,

        /// Start node id
        from: String,

        /// End node id
        to: String,

        title: String,

        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Change the title, description or tags of a node
    UpdateNode {
        graph: String,

        /// Node id
        node: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Replacement tag set; repeatable
        #[arg(short, long = "tag")]
        tags: Option<Vec<String>>,
    },

    /// Change the title or description of an edge
    UpdateEdge {
        graph: String,

        /// Edge id
        edge: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Add nodes and edges from a JSON batch file
    Import {
        graph: String,

        /// File holding {"nodes": [...], "edges": [...]}
        file: PathBuf,
    },

    /// Delete nodes (with their edges) and edges
    Delete {
        graph: String,

        /// Node id; repeatable
        #[arg(long = "node")]
        nodes: Vec<String>,

        /// Edge id; repeatable
        #[arg(long = "edge")]
        edges: Vec<String>,
    },

    /// Find a shortest directed path between two nodes
    Path {
        graph: String,
        from: String,
        to: String,
    },

    /// Search nodes (or edges) by keyword
    Search {
        graph: String,

        keyword: String,

        #[arg(long)]
        case_sensitive: bool,

        /// Search edges instead of nodes
        #[arg(long)]
        edges: bool,
    },

    /// Find nodes by tag
    Tags {
        graph: String,

        #[arg(required = true)]
        tags: Vec<String>,

        /// Match any tag instead of all of them
        #[arg(long)]
        any: bool,

        #[arg(long)]
        case_sensitive: bool,
    },

    /// Rank nodes by degree or centrality
    Rank {
        graph: String,

        #[arg(long, value_enum, default_value = "in")]
        by: RankBy,

        /// Maximum results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Sample sources for betweenness instead of using all of them
        #[arg(long)]
        approximate: bool,
    },

    /// Extract the neighbourhood reachable from a node
    Hood {
        graph: String,

        /// Start node id
        node: String,

        /// Maximum number of hops
        #[arg(long, default_value = "1")]
        hops: usize,

        /// Write the neighbourhood as a graph file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(".knowgraph").join("config.json"));
    let config = match KnowgraphConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{} cannot read {}: {}",
                "error:".red().bold(),
                config_path.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Create { name } => commands::create(&config, &name),
        Commands::List => commands::list(&config),
        Commands::Drop { name } => commands::drop_graph(&config, &name),
        Commands::Summary { graph, json } => commands::summary(&config, &graph, json).await,
        Commands::Show { graph, node } => commands::show(&config, &graph, &node),
        Commands::AddNode {
            graph,
            title,
            id,
            description,
            tags,
        } => commands::add_node(&config, &graph, &title, id, description, tags),
        Commands::AddEdge {
            graph,
            from,
            to,
            title,
            id,
            description,
        } => commands::add_edge(&config, &graph, &from, &to, &title, id, description),
        Commands::UpdateNode {
            graph,
            node,
            title,
            description,
            tags,
        } => commands::update_node(&config, &graph, &node, title, description, tags),
        Commands::UpdateEdge {
            graph,
            edge,
            title,
            description,
        } => commands::update_edge(&config, &graph, &edge, title, description),
        Commands::Import { graph, file } => commands::import(&config, &graph, &file),
        Commands::Delete {
            graph,
            nodes,
            edges,
        } => commands::delete(&config, &graph, &nodes, &edges),
        Commands::Path { graph, from, to } => commands::path(&config, &graph, &from, &to),
        Commands::Search {
            graph,
            keyword,
            case_sensitive,
            edges,
        } => commands::search(&config, &graph, &keyword, case_sensitive, edges),
        Commands::Tags {
            graph,
            tags,
            any,
            case_sensitive,
        } => commands::tags(&config, &graph, &tags, any, case_sensitive),
        Commands::Rank {
            graph,
            by,
            limit,
            approximate,
        } => commands::rank(&config, &graph, by, limit, approximate).await,
        Commands::Hood {
            graph,
            node,
            hops,
            output,
        } => commands::hood(&config, &graph, &node, hops, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
