//! Store one sample chunk with hand-written triples and query it.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::rag::RawTriple;

pub const DEMO_ID: &str = "doc_001";
pub const DEMO_TEXT: &str = "RTX 2080 Ti 是一款由 NVIDIA 推出的高端顯卡，擁有 11GB VRAM。";
pub const DEMO_QUERY: &str = "RTX 2080 Ti";

pub fn demo_triples() -> Vec<RawTriple> {
    vec![
        RawTriple::new("RTX 2080 Ti", "生產商", "NVIDIA"),
        RawTriple::new("RTX 2080 Ti", "顯存", "11GB"),
    ]
}

pub async fn run(config: &Config) -> Result<()> {
    let mut rag = super::connect(config).await?;

    let result = async {
        rag.add_data(DEMO_ID, DEMO_TEXT, &demo_triples())
            .await
            .context("failed to store demo data")?;
        rag.answer(DEMO_QUERY).await.context("failed to answer demo query")
    }
    .await;

    rag.close().context("failed to close store")?;
    let answer = result?;

    println!("\n--- GraphRAG 回答 ---");
    println!("{}", answer.text);
    Ok(())
}
