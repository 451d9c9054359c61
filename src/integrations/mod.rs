//! External integrations module.
//!
//! Provides clients for:
//! - Ollama (local embeddings, chat and completion)

pub mod ollama;

pub use ollama::{ChatMessage, OllamaClient};
