//! Connectivity checks for the graph, vector store and Ollama.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::integrations::{ChatMessage, OllamaClient};
use crate::storage::HybridStore;

/// Run every check; fails if any of them failed.
pub async fn run(config: &Config, ping_chat: bool) -> Result<()> {
    let mut failures = 0;

    match HybridStore::connect(&config.storage).await {
        Ok(store) => {
            match store.graph.ping().await {
                Ok(()) => println!("✅ Graph ({:?}) reachable", config.storage.graph_backend),
                Err(e) => {
                    failures += 1;
                    println!("❌ Graph query failed: {}", e);
                }
            }
            match store.vectors.count().await {
                Ok(n) => println!(
                    "✅ Vector store ({:?}) '{}': {} entries",
                    config.storage.vector_backend, config.storage.collection, n
                ),
                Err(e) => {
                    failures += 1;
                    println!("❌ Vector store failed: {}", e);
                }
            }
            store.close()?;
        }
        Err(e) => {
            failures += 1;
            println!("❌ Store connection failed: {}", e);
        }
    }

    let ollama = OllamaClient::from_config(&config.ollama)?;
    match ollama.list_models().await {
        Ok(models) => {
            println!("✅ Ollama at {}: {} models", ollama.base_url(), models.len());
            for wanted in [&config.ollama.chat_model, &config.ollama.embed_model] {
                if !has_model(&models, wanted) {
                    println!("⚠️  Model {} not pulled", wanted);
                }
            }
        }
        Err(e) => {
            failures += 1;
            println!("❌ Ollama unreachable at {}: {}", ollama.base_url(), e);
        }
    }

    if ping_chat {
        match ollama
            .chat(
                vec![ChatMessage::user("Hello, are you ready?")],
                &config.ollama.chat_model,
                None,
            )
            .await
        {
            Ok(reply) => println!("✅ {} replied: {}", config.ollama.chat_model, reply.trim()),
            Err(e) => {
                failures += 1;
                println!("❌ Chat with {} failed: {}", config.ollama.chat_model, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} check(s) failed", failures);
    }
    Ok(())
}

/// Ollama lists `nomic-embed-text` as `nomic-embed-text:latest`.
fn has_model(models: &[String], wanted: &str) -> bool {
    models
        .iter()
        .any(|m| m == wanted || m.strip_suffix(":latest") == Some(wanted))
}
