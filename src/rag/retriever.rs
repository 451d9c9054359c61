use std::collections::HashSet;
use std::str::FromStr;

use tracing::{debug, info};

use crate::integrations::ChatMessage;
use crate::prompts::render;
use crate::storage::VectorHit;
use crate::{Error, Result};

use super::pipeline::HybridRag;

/// Which lookups a query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalMode {
    /// Vector and graph (default)
    #[default]
    Hybrid,
    VectorOnly,
    GraphOnly,
}

impl FromStr for RetrievalMode {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "hybrid" | "global" => Ok(Self::Hybrid),
            "vector" | "vector_only" | "naive" => Ok(Self::VectorOnly),
            "graph" | "graph_only" | "local" => Ok(Self::GraphOnly),
            other => Err(Error::InvalidArgument(format!(
                "unknown retrieval mode: {}",
                other
            ))),
        }
    }
}

/// How the answer prompt is sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerMode {
    /// Single-turn `/api/chat` (default)
    #[default]
    Chat,
    /// Plain `/api/generate`
    Generate,
}

impl FromStr for AnswerMode {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "generate" => Ok(Self::Generate),
            other => Err(Error::Config(format!("unknown answer mode: {}", other))),
        }
    }
}

/// Context gathered for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HybridContext {
    pub vector_hits: Vec<VectorHit>,
    /// `"{head} --[{relation}]--> {tail}"`, deduplicated, first-seen order
    pub graph_lines: Vec<String>,
}

impl HybridContext {
    /// Chunk texts joined with newlines.
    pub fn vector_text(&self) -> String {
        self.vector_hits
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn graph_text(&self) -> String {
        self.graph_lines.join("\n")
    }
}

/// Generated answer with the context it was based on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub context: HybridContext,
}

impl HybridRag {
    /// Embed the query and fetch the nearest chunks.
    pub async fn vector_context(&self, query: &str) -> Result<Vec<VectorHit>> {
        let embedding = self
            .ollama
            .embeddings(query, &self.models.embed_model)
            .await?;
        self.store
            .vectors
            .search(&embedding, self.retrieval.vector_top_k)
            .await
    }

    /// Graph edges touching any match term of the query.
    pub async fn graph_context(&self, query: &str) -> Result<Vec<String>> {
        let terms = self.keywords.terms(query);
        debug!("Graph match terms: {:?}", terms);

        let mut seen = HashSet::new();
        let mut lines = Vec::new();

        for term in &terms {
            let edges = self
                .store
                .graph
                .search(term, self.retrieval.match_policy, self.retrieval.graph_limit)
                .await?;

            for edge in edges {
                let line = edge.line();
                if seen.insert(line.clone()) {
                    lines.push(line);
                }
            }
        }

        Ok(lines)
    }

    pub async fn retrieve(&self, query: &str, mode: RetrievalMode) -> Result<HybridContext> {
        let vector_hits = match mode {
            RetrievalMode::GraphOnly => Vec::new(),
            _ => self.vector_context(query).await?,
        };
        let graph_lines = match mode {
            RetrievalMode::VectorOnly => Vec::new(),
            _ => self.graph_context(query).await?,
        };

        info!(
            "Retrieved {} chunks ({} chars), {} graph relations",
            vector_hits.len(),
            vector_hits.iter().map(|h| h.text.chars().count()).sum::<usize>(),
            graph_lines.len()
        );

        Ok(HybridContext {
            vector_hits,
            graph_lines,
        })
    }

    /// Answer prompt with both labeled context blocks.
    pub fn build_prompt(&self, query: &str, context: &HybridContext) -> String {
        let vector_text = context.vector_text();
        let graph_text = context.graph_text();
        render(
            &self.answer_template,
            &[
                ("vector_context", vector_text.as_str()),
                ("graph_context", graph_text.as_str()),
                ("query", query),
            ],
        )
    }

    /// Retrieve with both lookups and generate an answer.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        self.answer_with_mode(query, RetrievalMode::Hybrid).await
    }

    pub async fn answer_with_mode(&self, query: &str, mode: RetrievalMode) -> Result<Answer> {
        let context = self.retrieve(query, mode).await?;
        let prompt = self.build_prompt(query, &context);

        let model = &self.models.chat_model;
        let temperature = self.models.temperature;
        let text = match self.retrieval.answer_mode {
            AnswerMode::Chat => {
                self.ollama
                    .chat(vec![ChatMessage::user(prompt)], model, temperature)
                    .await?
            }
            AnswerMode::Generate => self.ollama.generate(&prompt, model, temperature).await?,
        };

        Ok(Answer { text, context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(text: &str) -> VectorHit {
        VectorHit {
            chunk_id: "c".into(),
            text: text.into(),
            source: "s".into(),
            score: 1.0,
        }
    }

    #[test]
    fn context_text_joins_with_newlines() {
        let context = HybridContext {
            vector_hits: vec![hit("first"), hit("second")],
            graph_lines: vec!["A --[r]--> B".into(), "B --[r]--> C".into()],
        };

        assert_eq!(context.vector_text(), "first\nsecond");
        assert_eq!(context.graph_text(), "A --[r]--> B\nB --[r]--> C");
    }

    #[test]
    fn empty_context_renders_empty_blocks() {
        let context = HybridContext::default();
        assert_eq!(context.vector_text(), "");
        assert_eq!(context.graph_text(), "");
    }

    #[test]
    fn parses_modes() {
        assert_eq!("vector".parse::<RetrievalMode>().unwrap(), RetrievalMode::VectorOnly);
        assert_eq!("GRAPH_ONLY".parse::<RetrievalMode>().unwrap(), RetrievalMode::GraphOnly);
        assert_eq!("hybrid".parse::<RetrievalMode>().unwrap(), RetrievalMode::Hybrid);
        assert!("both".parse::<RetrievalMode>().is_err());

        assert_eq!("generate".parse::<AnswerMode>().unwrap(), AnswerMode::Generate);
        assert_eq!("chat".parse::<AnswerMode>().unwrap(), AnswerMode::Chat);
        assert!("stream".parse::<AnswerMode>().is_err());
    }
}
