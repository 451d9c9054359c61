//! Prompt templates for triple extraction and answer generation.
//!
//! Built-in templates can be overridden by files in the `prompts/` directory
//! at the project root. Placeholders use `{name}` syntax.

use std::path::PathBuf;

use crate::{Error, Result};

const EXTRACTION_TEMPLATE: &str = r#"
你是一個資料科學家。請從以下文本中提取關鍵實體(Entities)和它們之間的關係(Relationships)。

文本：
{text}

請嚴格按照以下 JSON 格式輸出，不要包含任何解釋或其他文字：
[
    {"head": "實體1", "relation": "關係描述", "tail": "實體2"},
    {"head": "實體1", "relation": "關係描述", "tail": "實體3"}
]

重點：
1. 實體(head/tail)必須是名詞。
2. 關係(relation)必須簡潔。
3. 如果沒有明確關係，回傳空陣列 []。
4. JSON 格式必須合法。
"#;

const ANSWER_TEMPLATE: &str = r#"
你是一個智慧助手。請根據以下檢索到的資訊回答使用者的問題。

[來自文本的詳細內容 (Vector DB)]:
{vector_context}

[來自知識圖譜的關聯 (Graph DB)]:
{graph_context}

使用者問題: {query}

請用繁體中文回答，並綜合上述兩種資訊來源。如果資訊不足，請誠實告知。
"#;

/// Available prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Entity/relation triple extraction. Placeholder: `{text}`.
    Extraction,
    /// Hybrid-context answer. Placeholders: `{vector_context}`, `{graph_context}`, `{query}`.
    Answer,
}

impl Prompt {
    /// Override file name (Markdown).
    pub fn filename(&self) -> &'static str {
        match self {
            Prompt::Extraction => "extraction.md",
            Prompt::Answer => "answer.md",
        }
    }

    /// Built-in template text.
    pub fn builtin(&self) -> &'static str {
        match self {
            Prompt::Extraction => EXTRACTION_TEMPLATE,
            Prompt::Answer => ANSWER_TEMPLATE,
        }
    }

    /// Template from `prompts/` if present, otherwise the built-in one.
    pub fn template(&self) -> String {
        match load_prompt(self.filename()) {
            Ok(text) => {
                tracing::debug!("Using prompt override {}", self.filename());
                text
            }
            Err(_) => self.builtin().to_string(),
        }
    }
}

/// Load a prompt by file name.
pub fn load_prompt(filename: &str) -> Result<String> {
    let path = prompts_dir().join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| Error::InvalidArgument(format!("Failed to load prompt {}: {}", filename, e)))
}

/// Path to the prompts directory.
pub fn prompts_dir() -> PathBuf {
    let candidates = [PathBuf::from("prompts"), PathBuf::from("../prompts")];

    for path in candidates {
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("prompts")
}

/// Substitute `{key}` placeholders. Values are inserted verbatim, so braces in
/// document text are never re-expanded.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
