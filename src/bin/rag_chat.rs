//! Interactive hybrid RAG chat over an already built store.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hybrid_graphrag::{commands, Config};

#[derive(Parser)]
#[command(name = "rag_chat")]
#[command(about = "Ask questions against the vector store and knowledge graph")]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("hybrid_graphrag=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    commands::chat::run(&config).await
}
