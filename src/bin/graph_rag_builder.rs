//! Batch ingestion of a PDF folder into the vector store and knowledge graph.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hybrid_graphrag::{commands, Config};

#[derive(Parser)]
#[command(name = "graph_rag_builder")]
#[command(about = "Build the hybrid RAG store from a folder of PDFs")]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder of PDFs (defaults to ingestion.pdf_folder)
    #[arg(long)]
    folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("hybrid_graphrag=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    commands::ingest::run(&config, None, cli.folder).await
}
