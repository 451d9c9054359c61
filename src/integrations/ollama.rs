//! Ollama client for local embeddings and LLM inference.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{OllamaConfig, OLLAMA_URL, OLLAMA_TIMEOUT_SECS};
use crate::{Error, Result};

/// Ollama client for local LLM.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create new client with default URL.
    pub fn new() -> Result<Self> {
        Self::with_url(OLLAMA_URL)
    }

    /// Create client with custom URL.
    pub fn with_url(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), Duration::from_secs(OLLAMA_TIMEOUT_SECS))
    }

    /// Create client from the `ollama` config section.
    pub fn from_config(config: &OllamaConfig) -> Result<Self> {
        Self::build(config.url.clone(), Duration::from_secs(config.timeout_secs))
    }

    fn build(base_url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Ollama(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama server is running.
    pub async fn is_running(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// List available models.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Ollama(format!("Ollama request failed: {}", e)))?;

        let tags: TagsResponse = read_json(response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Compute an embedding vector for `text`.
    pub async fn embeddings(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        debug!("Embedding {} chars with {}", text.chars().count(), model);

        let response = self
            .http
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Ollama(format!("Ollama request failed: {}", e)))?;

        let result: EmbeddingsResponse = read_json(response).await?;
        if result.embedding.is_empty() {
            return Err(Error::Ollama(format!(
                "Model {} returned an empty embedding",
                model
            )));
        }

        Ok(result.embedding)
    }

    /// Generate text from a plain prompt.
    pub async fn generate(
        &self,
        prompt: &str,
        model: &str,
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
            options: temperature.map(|temperature| ModelOptions { temperature }),
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Ollama(format!("Ollama request failed: {}", e)))?;

        let result: GenerateResponse = read_json(response).await?;
        Ok(result.response)
    }

    /// Chat with model.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            stream: false,
            options: temperature.map(|temperature| ModelOptions { temperature }),
        };

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Ollama(format!("Ollama request failed: {}", e)))?;

        let result: ChatResponse = read_json(response).await?;
        Ok(result.message.content)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(Error::Ollama(format!("Ollama error {}: {}", status, text)));
    }

    response
        .json()
        .await
        .map_err(|e| Error::Ollama(format!("Invalid response: {}", e)))
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> OllamaClient {
        OllamaClient::with_url(server.base_url()).unwrap()
    }

    #[tokio::test]
    async fn list_models_returns_names() {
        let server = MockServer::start_async().await;

        let tags_mock = server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [
                    { "name": "llama3.1:8b" },
                    { "name": "nomic-embed-text" }
                ]
            }));
        });

        let models = client(&server).list_models().await.unwrap();

        assert_eq!(
            models,
            vec!["llama3.1:8b".to_string(), "nomic-embed-text".to_string()]
        );
        tags_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn embeddings_sends_model_and_prompt() {
        let server = MockServer::start_async().await;

        let embed_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/embeddings")
                .json_body(json!({ "model": "nomic-embed-text", "prompt": "顯卡" }));
            then.status(200)
                .json_body(json!({ "embedding": [0.1, 0.2, 0.3] }));
        });

        let vector = client(&server)
            .embeddings("顯卡", "nomic-embed-text")
            .await
            .unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        embed_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn empty_embedding_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/embeddings");
            then.status(200).json_body(json!({ "embedding": [] }));
        });

        let err = client(&server)
            .embeddings("text", "nomic-embed-text")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Ollama(_)));
        assert!(err.to_string().contains("empty embedding"));
    }

    #[tokio::test]
    async fn generate_reports_error_on_http_failure() {
        let server = MockServer::start_async().await;

        let gen_mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500).body("boom");
        });

        let err = client(&server)
            .generate("hi", "llama3.1:8b", None)
            .await
            .unwrap_err();

        let msg = format!("{err}");
        assert!(msg.contains("Ollama error 500"));
        assert!(msg.contains("boom"));
        gen_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn generate_is_non_streaming_and_omits_default_options() {
        let server = MockServer::start_async().await;

        let gen_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .json_body(json!({ "model": "llama3.1:8b", "prompt": "hi", "stream": false }));
            then.status(200).json_body(json!({ "response": "hello" }));
        });

        let reply = client(&server)
            .generate("hi", "llama3.1:8b", None)
            .await
            .unwrap();

        assert_eq!(reply, "hello");
        gen_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn chat_returns_assistant_message() {
        let server = MockServer::start_async().await;

        let chat_mock = server.mock(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(200).json_body(json!({
                "message": {
                    "role": "assistant",
                    "content": "Hello!"
                }
            }));
        });

        let reply = client(&server)
            .chat(vec![ChatMessage::user("Hi")], "llama3.1:8b", Some(0.3))
            .await
            .unwrap();

        assert_eq!(reply, "Hello!");
        chat_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn is_running_respects_http_status() {
        let healthy = MockServer::start_async().await;
        healthy.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200);
        });

        let failing = MockServer::start_async().await;
        failing.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(503);
        });

        assert!(client(&healthy).is_running().await);
        assert!(!client(&failing).is_running().await);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::with_url("http://localhost:11434/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }
}
