//! Hybrid GraphRAG CLI - main entry point
//!
//! Ingest documents into a vector store and knowledge graph, then ask
//! questions answered from both.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use hybrid_graphrag::{commands, metrics, Config};
use tracing::warn;

#[derive(Parser)]
#[command(name = "hybrid_graphrag")]
#[command(about = "Hybrid vector + knowledge-graph RAG with Ollama", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (defaults to config.yml, built-in defaults if missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and extract relations from documents
    Ingest {
        /// Single document (.pdf, .txt, .md)
        #[arg(long, conflicts_with = "folder")]
        file: Option<PathBuf>,

        /// Folder of PDFs (defaults to ingestion.pdf_folder)
        #[arg(long)]
        folder: Option<PathBuf>,
    },

    /// Interactive question loop (exit/quit to leave)
    Chat,

    /// Ask a single question
    Ask {
        query: String,

        /// Retrieval mode: hybrid | vector | graph
        #[arg(long, default_value = "hybrid")]
        mode: String,

        /// Print retrieved chunks and graph relations before the answer
        #[arg(long, default_value_t = false)]
        show_context: bool,
    },

    /// Store the RTX 2080 Ti sample and query it
    Demo,

    /// Check graph, vector store and Ollama connectivity
    Check {
        /// Also send a one-turn chat to the chat model
        #[arg(long, default_value_t = false)]
        ping: bool,
    },

    /// Print entity, relation and vector counts
    Stats,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ingest { .. } => "ingest",
            Commands::Chat => "chat",
            Commands::Ask { .. } => "ask",
            Commands::Demo => "demo",
            Commands::Check { .. } => "check",
            Commands::Stats => "stats",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("hybrid_graphrag=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let config = Config::load(cli.config.as_deref())?;

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command, &config).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(command: Commands, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Ingest { file, folder } => {
            commands::ingest::run(config, file, folder).await?;
        }
        Commands::Chat => {
            commands::chat::run(config).await?;
        }
        Commands::Ask {
            query,
            mode,
            show_context,
        } => {
            commands::ask::run(config, &query, &mode, show_context).await?;
        }
        Commands::Demo => {
            commands::demo::run(config).await?;
        }
        Commands::Check { ping } => {
            commands::check::run(config, ping).await?;
        }
        Commands::Stats => {
            commands::stats::run(config).await?;
        }
    }

    Ok(())
}
