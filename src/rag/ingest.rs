use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::metrics;
use crate::storage::VectorRecord;
use crate::Result;

use super::chunker::Chunk;
use super::extractor::RawTriple;
use super::loader::{discover_pdfs, load_document, Document};
use super::pipeline::HybridRag;

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub document: String,
    /// Chunks written to the vector store
    pub chunks: usize,
    /// Complete triples merged into the graph
    pub relations: usize,
    /// Chunks whose extraction failed and counted as zero relations
    pub failed_extractions: usize,
}

/// A document that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a folder ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub documents: Vec<IngestReport>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchReport {
    pub fn chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks).sum()
    }

    pub fn relations(&self) -> usize {
        self.documents.iter().map(|d| d.relations).sum()
    }
}

impl HybridRag {
    /// Load, chunk, embed, extract and store one document.
    ///
    /// Embedding and vector-store failures abort the document. Extraction
    /// failures count as zero relations; graph write failures are logged and
    /// the chunk's vector entry is kept.
    pub async fn ingest_document(&mut self, path: &Path) -> Result<IngestReport> {
        let document = load_document(path)?;
        self.ingest_loaded(&document).await
    }

    /// Same as [`ingest_document`](Self::ingest_document) for in-memory text.
    pub async fn ingest_text(
        &mut self,
        document_name: &str,
        source: &str,
        text: &str,
    ) -> Result<IngestReport> {
        self.ingest_loaded(&Document::from_text(document_name, source, text))
            .await
    }

    async fn ingest_loaded(&mut self, document: &Document) -> Result<IngestReport> {
        let chunks = self
            .chunker
            .chunk_pages(&document.name, &document.path, &document.pages);
        info!(
            "Ingesting {} ({} pages, {} chunks)",
            document.name,
            document.pages.len(),
            chunks.len()
        );

        let result = self.ingest_chunks(&document.name, &chunks).await;
        // Keep whatever was written even when a later chunk failed
        self.store.flush()?;
        result
    }

    async fn ingest_chunks(&mut self, document: &str, chunks: &[Chunk]) -> Result<IngestReport> {
        let mut report = IngestReport {
            document: document.to_string(),
            ..Default::default()
        };

        for (i, chunk) in chunks.iter().enumerate() {
            info!("  [{}/{}] {}", i + 1, chunks.len(), chunk.id);
            self.store_vector(&chunk.id, &chunk.text, &chunk.source)
                .await?;
            report.chunks += 1;

            let triples = match self.extractor.extract(&chunk.text).await {
                Ok(triples) => triples,
                Err(e) => {
                    warn!("Extraction failed for {}: {}", chunk.id, e);
                    metrics::record_extraction_failure();
                    report.failed_extractions += 1;
                    continue;
                }
            };

            report.relations += self.store_relations(&triples, &chunk.id).await;
        }

        info!(
            "Done {}: {} chunks, {} relations, {} failed extractions",
            report.document, report.chunks, report.relations, report.failed_extractions
        );
        Ok(report)
    }

    /// Store one pre-chunked text with caller-provided triples; no extraction call.
    pub async fn add_data(
        &mut self,
        chunk_id: &str,
        text: &str,
        triples: &[RawTriple],
    ) -> Result<IngestReport> {
        self.store_vector(chunk_id, text, chunk_id).await?;
        let relations = self.store_relations(triples, chunk_id).await;
        self.store.flush()?;

        Ok(IngestReport {
            document: chunk_id.to_string(),
            chunks: 1,
            relations,
            failed_extractions: 0,
        })
    }

    /// Ingest every PDF directly inside `folder`, in path order. A failed
    /// document is logged and recorded; the batch continues.
    pub async fn ingest_folder(&mut self, folder: &Path) -> Result<BatchReport> {
        let files = discover_pdfs(folder)?;
        info!("Found {} PDF files in {}", files.len(), folder.display());

        let mut batch = BatchReport::default();
        for path in files {
            match self.ingest_document(&path).await {
                Ok(report) => batch.documents.push(report),
                Err(e) => {
                    error!("Failed to ingest {}: {}", path.display(), e);
                    batch.failures.push(DocumentFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(batch)
    }

    async fn store_vector(&mut self, id: &str, text: &str, source: &str) -> Result<()> {
        let embedding = self
            .ollama
            .embeddings(text, &self.models.embed_model)
            .await?;

        self.store
            .vectors
            .upsert(VectorRecord {
                id: id.to_string(),
                embedding,
                text: text.to_string(),
                source: source.to_string(),
            })
            .await?;
        metrics::record_chunk_ingested();
        Ok(())
    }

    /// Merge triples; a failed write is logged and counts as zero.
    async fn store_relations(&mut self, triples: &[RawTriple], source: &str) -> usize {
        match self.store.graph.merge_triples(triples, source).await {
            Ok(count) => {
                metrics::record_relations_merged(count);
                count
            }
            Err(e) => {
                error!("Graph write failed for {}: {}", source, e);
                0
            }
        }
    }
}
