//! Hybrid retrieval-augmented generation.
//!
//! Ingestion chunks documents, embeds each chunk into the vector store and
//! merges LLM-extracted `(head, relation, tail)` triples into the graph.
//! Queries combine nearest chunks with graph edges matching the query terms
//! in one prompt.

pub mod chunker;
pub mod extractor;
pub mod ingest;
pub mod keywords;
pub mod loader;
pub mod pipeline;
pub mod retriever;

pub use chunker::{chunk_id, Chunk, Chunker, ChunkingStrategy};
pub use extractor::{complete_triples, parse_triples, RawTriple, Triple, TripleExtractor};
pub use ingest::{BatchReport, DocumentFailure, IngestReport};
pub use keywords::{KeywordExtractor, MatchPolicy, TermStrategy};
pub use loader::{discover_pdfs, load_document, Document};
pub use pipeline::HybridRag;
pub use retriever::{Answer, AnswerMode, HybridContext, RetrievalMode};
