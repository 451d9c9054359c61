use anyhow::{Context, Result};

use crate::config::Config;
use crate::rag::{Answer, RetrievalMode};

/// One-shot question.
pub async fn run(config: &Config, query: &str, mode: &str, show_context: bool) -> Result<()> {
    let mode: RetrievalMode = mode.parse()?;
    let rag = super::connect(config).await?;

    let result = rag
        .answer_with_mode(query, mode)
        .await
        .with_context(|| format!("failed to answer: {}", query));

    rag.close().context("failed to close store")?;
    let answer = result?;

    if show_context {
        print_context(&answer);
    }
    println!("{}", answer.text);
    Ok(())
}

fn print_context(answer: &Answer) {
    println!("=== Vector context ({} chunks) ===", answer.context.vector_hits.len());
    for hit in &answer.context.vector_hits {
        println!("[{:.3}] {} ({})", hit.score, hit.chunk_id, hit.source);
    }
    println!("\n=== Graph context ({} relations) ===", answer.context.graph_lines.len());
    for line in &answer.context.graph_lines {
        println!("{}", line);
    }
    println!();
}
