//! ensemble-graph CLI - thin wrapper serving and querying ensemble stores

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use ensemble_graph::config::{self, GraphConfig};
use ensemble_graph::query::{self, Request};
use ensemble_graph::storage::EntityStore;
use ensemble_graph::ui;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ensemble-graph")]
#[command(version)]
#[command(about = "Query-graph access to simulation ensembles and their blob-backed payloads")]
#[command(long_about = r#"
ensemble-graph serves ensembles, realizations, responses, observations and
parameters from an entity store, resolving numeric payloads from a separate
blob store at read time.

Example usage:
  ensemble-graph serve --port 5000
  ensemble-graph query --query "{ allEnsembles { id name updateSource } }"
  ensemble-graph stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ensemble-graph.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Entity store database file
    #[arg(long, global = true)]
    entities: Option<PathBuf>,

    /// Blob store database file
    #[arg(long, global = true)]
    blobs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the query endpoint over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },

    /// Execute one query document and print the JSON response
    Query {
        /// Query document
        #[arg(short, long, conflicts_with = "file")]
        query: Option<String>,

        /// Read the query document from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,
    },

    /// Show row counts of the entity store
    Stats,

    /// Write a configuration file with the effective settings
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut graph_config = config::load_config(Some(config_path.as_path()))?.unwrap_or_default();
    if let Some(entities) = cli.entities {
        graph_config.entity_store = entities;
    }
    if let Some(blobs) = cli.blobs {
        graph_config.blob_store = blobs;
    }

    match cli.command {
        Commands::Serve { port } => {
            ui::serving(port);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(ensemble_graph::server::start_server(port, graph_config))?;
        }

        Commands::Query { query, file, variables } => {
            let document = match (query, file) {
                (Some(query), _) => query,
                (None, Some(file)) => std::fs::read_to_string(&file)?,
                (None, None) => anyhow::bail!("either --query or --file is required"),
            };

            let mut request = Request::new(document);
            if let Some(raw) = variables {
                request.variables = Some(serde_json::from_str(&raw)?);
            }

            let response = query::execute(&graph_config, &request);
            println!("{}", serde_json::to_string_pretty(&response)?);
            ui::query_outcome(&response);
            if response.data.is_none() {
                std::process::exit(1);
            }
        }

        Commands::Stats => {
            let store = EntityStore::open(&graph_config.entity_store, graph_config.busy_timeout())?;
            let stats = store.stats()?;
            ui::store_summary(&graph_config.entity_store, &stats);
        }

        Commands::Init { force } => {
            write_config_file(&config_path, &graph_config, force)?;
        }
    }

    Ok(())
}

fn write_config_file(path: &Path, graph_config: &GraphConfig, force: bool) -> anyhow::Result<()> {
    match config::write_config(path, graph_config, force) {
        Ok(()) => {
            ui::config_written(path, graph_config);
            Ok(())
        }
        Err(err) => {
            ui::failure(&err.to_string());
            Err(err)
        }
    }
}
