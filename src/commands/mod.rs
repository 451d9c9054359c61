//! Command implementations
//!
//! Each module corresponds to a subcommand in the CLI.

pub mod ask;
pub mod chat;
pub mod check;
pub mod demo;
pub mod ingest;
pub mod stats;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::rag::HybridRag;

/// Open the pipeline for a command.
pub async fn connect(config: &Config) -> Result<HybridRag> {
    HybridRag::connect(config)
        .await
        .context("failed to open vector store / graph database")
}
