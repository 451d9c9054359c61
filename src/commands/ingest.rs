//! Build the vector store and knowledge graph from documents.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::rag::{BatchReport, IngestReport};

/// Ingest one file, or every PDF in `folder` (defaults to `ingestion.pdf_folder`).
pub async fn run(config: &Config, file: Option<PathBuf>, folder: Option<PathBuf>) -> Result<()> {
    let mut rag = super::connect(config).await?;

    let outcome = match file {
        Some(path) => rag
            .ingest_document(&path)
            .await
            .map(|report| print_document(&report))
            .with_context(|| format!("failed to ingest {}", path.display())),
        None => {
            let folder = folder.unwrap_or_else(|| config.ingestion.pdf_folder.clone());
            rag.ingest_folder(&folder)
                .await
                .map(|batch| print_batch(&batch))
                .with_context(|| format!("failed to ingest folder {}", folder.display()))
        }
    };

    rag.close().context("failed to close store")?;
    outcome
}

fn print_document(report: &IngestReport) {
    println!(
        "✅ {}: {} chunks, {} relations ({} chunks without extraction)",
        report.document, report.chunks, report.relations, report.failed_extractions
    );
}

fn print_batch(batch: &BatchReport) {
    for report in &batch.documents {
        print_document(report);
    }
    for failure in &batch.failures {
        println!("❌ {}: {}", failure.path.display(), failure.error);
    }
    println!(
        "\n🎉 Done: {} documents, {} chunks, {} relations, {} failed",
        batch.documents.len(),
        batch.chunks(),
        batch.relations(),
        batch.failures.len()
    );
}
