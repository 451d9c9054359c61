use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::ExtractionError;
use crate::integrations::{ChatMessage, OllamaClient};
use crate::prompts::{render, Prompt};
use crate::Result;

/// Complete `(head, relation, tail)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl Triple {
    pub fn new(
        head: impl Into<String>,
        relation: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }
}

/// One element of the extraction array as the LLM produced it. Any field may
/// be missing; incomplete triples are dropped when persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTriple {
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub head: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub relation: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub tail: Option<String>,
}

impl RawTriple {
    pub fn new(head: &str, relation: &str, tail: &str) -> Self {
        Self {
            head: Some(head.to_string()),
            relation: Some(relation.to_string()),
            tail: Some(tail.to_string()),
        }
    }

    /// The triple if head, relation and tail are all non-blank.
    pub fn complete(&self) -> Option<Triple> {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(Triple {
            head: field(&self.head)?,
            relation: field(&self.relation)?,
            tail: field(&self.tail)?,
        })
    }
}

impl From<Triple> for RawTriple {
    fn from(triple: Triple) -> Self {
        Self {
            head: Some(triple.head),
            relation: Some(triple.relation),
            tail: Some(triple.tail),
        }
    }
}

/// Keep only complete triples.
pub fn complete_triples(raw: &[RawTriple]) -> Vec<Triple> {
    raw.iter().filter_map(RawTriple::complete).collect()
}

/// Accept strings, numbers and booleans (stringified); `null` is absent.
fn deserialize_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Parse an extraction response: the text between the first `[` and the last
/// `]` must be a JSON array of triple objects.
pub fn parse_triples(response: &str) -> std::result::Result<Vec<RawTriple>, ExtractionError> {
    let start = response.find('[').ok_or(ExtractionError::MissingArray)?;
    let end = response.rfind(']').ok_or(ExtractionError::MissingArray)?;
    if end < start {
        return Err(ExtractionError::MissingArray);
    }

    serde_json::from_str(&response[start..=end])
        .map_err(|e| ExtractionError::Malformed(e.to_string()))
}

/// Asks the chat model for triples found in a chunk.
#[derive(Debug, Clone)]
pub struct TripleExtractor {
    ollama: OllamaClient,
    model: String,
    temperature: Option<f32>,
    template: String,
}

impl TripleExtractor {
    pub fn new(ollama: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            ollama,
            model: model.into(),
            temperature: None,
            template: Prompt::Extraction.template(),
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Build the extraction prompt for `text`.
    pub fn prompt(&self, text: &str) -> String {
        render(&self.template, &[("text", text)])
    }

    /// Extract triples. Both a failed LLM call and an unparseable answer are
    /// errors; `[]` is a successful empty extraction.
    pub async fn extract(&self, text: &str) -> Result<Vec<RawTriple>> {
        let response = self
            .ollama
            .chat(
                vec![ChatMessage::user(self.prompt(text))],
                &self.model,
                self.temperature,
            )
            .await?;

        debug!(
            "Extraction response ({} chars): {}",
            response.chars().count(),
            response.chars().take(200).collect::<String>()
        );

        Ok(parse_triples(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn parses_array_wrapped_in_prose() {
        let response = r#"好的，以下是結果：
[
  {"head": "RTX 2080 Ti", "relation": "生產商", "tail": "NVIDIA"},
  {"head": "RTX 2080 Ti", "relation": "顯存", "tail": "11GB"}
]
希望對你有幫助。"#;

        let triples = parse_triples(response).unwrap();

        assert_eq!(
            complete_triples(&triples),
            vec![
                Triple::new("RTX 2080 Ti", "生產商", "NVIDIA"),
                Triple::new("RTX 2080 Ti", "顯存", "11GB"),
            ]
        );
    }

    #[test]
    fn empty_array_is_a_successful_empty_extraction() {
        assert_eq!(parse_triples("[]").unwrap(), Vec::new());
        assert_eq!(parse_triples("沒有關係 []").unwrap(), Vec::new());
    }

    #[test]
    fn missing_brackets_is_an_error() {
        assert_eq!(
            parse_triples("I could not find any relations."),
            Err(ExtractionError::MissingArray)
        );
        assert_eq!(parse_triples("] reversed ["), Err(ExtractionError::MissingArray));
    }

    #[test]
    fn brackets_in_surrounding_prose_are_malformed() {
        let response = r#"See [1] for details: [{"head": "a", "relation": "b", "tail": "c"}]"#;
        assert!(matches!(
            parse_triples(response),
            Err(ExtractionError::Malformed(_))
        ));
    }

    #[test]
    fn non_object_elements_are_malformed() {
        assert!(matches!(
            parse_triples(r#"["just a string"]"#),
            Err(ExtractionError::Malformed(_))
        ));
        assert!(matches!(
            parse_triples(r#"[{"head": {"nested": true}, "relation": "r", "tail": "t"}]"#),
            Err(ExtractionError::Malformed(_))
        ));
    }

    #[test]
    fn missing_and_blank_fields_make_incomplete_triples() {
        let triples = parse_triples(
            r#"[
                {"head": "A", "relation": "r", "tail": "B"},
                {"head": "A", "tail": "B"},
                {"head": "", "relation": "r", "tail": "B"},
                {"head": "A", "relation": "r", "tail": null},
                {"head": "  C ", "relation": " r ", "tail": "D"}
            ]"#,
        )
        .unwrap();

        assert_eq!(triples.len(), 5);
        assert_eq!(
            complete_triples(&triples),
            vec![Triple::new("A", "r", "B"), Triple::new("C", "r", "D")]
        );
    }

    #[test]
    fn numeric_values_are_stringified() {
        let triples = parse_triples(r#"[{"head": "RTX 2080 Ti", "relation": "VRAM_GB", "tail": 11}]"#)
            .unwrap();
        assert_eq!(triples[0].tail.as_deref(), Some("11"));
    }

    #[test]
    fn raw_triple_from_triple_is_complete() {
        let raw: RawTriple = Triple::new("a", "b", "c").into();
        assert_eq!(raw.complete(), Some(Triple::new("a", "b", "c")));
    }

    #[test]
    fn prompt_embeds_chunk_text() {
        let ollama = OllamaClient::with_url("http://localhost:1").unwrap();
        let extractor = TripleExtractor::new(ollama, "llama3.1:8b").with_template("T: {text}");
        assert_eq!(extractor.prompt("abc"), "T: abc");
    }

    #[tokio::test]
    async fn extract_calls_chat_and_parses_response() {
        let server = MockServer::start_async().await;
        let chat_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .body_includes("NVIDIA 推出");
            then.status(200).json_body(json!({
                "message": {
                    "role": "assistant",
                    "content": "結果: [{\"head\": \"RTX 2080 Ti\", \"relation\": \"生產商\", \"tail\": \"NVIDIA\"}]"
                }
            }));
        });

        let ollama = OllamaClient::with_url(server.base_url()).unwrap();
        let extractor = TripleExtractor::new(ollama, "llama3.1:8b");
        let triples = extractor.extract("RTX 2080 Ti 是一款由 NVIDIA 推出的高端顯卡").await.unwrap();

        assert_eq!(complete_triples(&triples), vec![Triple::new("RTX 2080 Ti", "生產商", "NVIDIA")]);
        chat_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn extract_surfaces_parse_failures_as_extraction_errors() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(200).json_body(json!({
                "message": { "role": "assistant", "content": "no relations here" }
            }));
        });

        let ollama = OllamaClient::with_url(server.base_url()).unwrap();
        let err = TripleExtractor::new(ollama, "llama3.1:8b")
            .extract("text")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Extraction(ExtractionError::MissingArray)));
    }
}
