//! Hybrid GraphRAG Library
//!
//! This library provides tools to:
//! - Load PDF and text documents and split them into overlapping chunks
//! - Embed chunks with Ollama into a local or Qdrant vector store
//! - Extract entity/relation triples with an LLM and merge them into Neo4j
//!   or a local graph snapshot
//! - Answer questions from nearest chunks plus matching graph relations

pub mod config;
pub mod error;
pub mod integrations;
pub mod metrics;
pub mod prompts;
pub mod rag;
pub mod storage;

// Re-export common types
pub use config::Config;
pub use error::{Error, ExtractionError, Result};
pub use integrations::OllamaClient;
pub use prompts::{load_prompt, Prompt};
pub use rag::{Answer, HybridContext, HybridRag, IngestReport, RetrievalMode};
pub use storage::HybridStore;

pub mod commands;
