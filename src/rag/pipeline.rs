use crate::config::{Config, OllamaConfig, RetrievalConfig};
use crate::integrations::OllamaClient;
use crate::prompts::Prompt;
use crate::storage::HybridStore;
use crate::Result;

use super::chunker::Chunker;
use super::extractor::TripleExtractor;
use super::keywords::KeywordExtractor;

/// Ingestion and query over one vector store and one graph.
///
/// Every external call is awaited in turn; nothing runs concurrently.
pub struct HybridRag {
    pub(super) ollama: OllamaClient,
    pub(super) store: HybridStore,
    pub(super) chunker: Chunker,
    pub(super) extractor: TripleExtractor,
    pub(super) keywords: KeywordExtractor,
    pub(super) models: OllamaConfig,
    pub(super) retrieval: RetrievalConfig,
    pub(super) answer_template: String,
}

impl HybridRag {
    /// Connect to Ollama and open the configured store.
    pub async fn connect(config: &Config) -> Result<Self> {
        let ollama = OllamaClient::from_config(&config.ollama)?;
        let store = HybridStore::connect(&config.storage).await?;
        Ok(Self::new(config, ollama, store))
    }

    pub fn new(config: &Config, ollama: OllamaClient, store: HybridStore) -> Self {
        let chunker = Chunker::with_strategy(
            config.ingestion.chunk_size,
            config.ingestion.chunk_overlap,
            config.ingestion.chunking,
        );
        let extractor = TripleExtractor::new(ollama.clone(), &config.ollama.chat_model)
            .with_temperature(config.ollama.temperature);

        Self {
            ollama,
            store,
            chunker,
            extractor,
            keywords: KeywordExtractor::new(config.retrieval.term_strategy),
            models: config.ollama.clone(),
            retrieval: config.retrieval.clone(),
            answer_template: Prompt::Answer.template(),
        }
    }

    /// Replace the answer prompt template.
    pub fn with_answer_template(mut self, template: impl Into<String>) -> Self {
        self.answer_template = template.into();
        self
    }

    /// Replace the extraction prompt template.
    pub fn with_extraction_template(mut self, template: impl Into<String>) -> Self {
        self.extractor = self.extractor.with_template(template);
        self
    }

    pub fn ollama(&self) -> &OllamaClient {
        &self.ollama
    }

    pub fn store(&self) -> &HybridStore {
        &self.store
    }

    pub fn chat_model(&self) -> &str {
        &self.models.chat_model
    }

    /// Flush local files and release the store.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}
