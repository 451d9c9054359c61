use anyhow::{Context, Result};

use crate::config::Config;
use crate::storage::HybridStore;

/// Print entity, relation and vector counts.
pub async fn run(config: &Config) -> Result<()> {
    let store = HybridStore::connect(&config.storage)
        .await
        .context("failed to open store")?;
    let stats = store.stats().await;
    store.close()?;
    let stats = stats?;

    println!("📊 Store statistics");
    println!("  Entities:  {}", stats.entities);
    println!("  Relations: {}", stats.relations);
    println!("  Vectors:   {} ({})", stats.vectors, config.storage.collection);
    Ok(())
}
