//! Configuration for the Ollama endpoint, graph/vector stores and the pipeline
//!
//! Loads configuration from config.yml; environment variables (and `.env`)
//! take precedence over values from the file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rag::{AnswerMode, ChunkingStrategy, MatchPolicy, TermStrategy};
use crate::storage::{GraphBackend, VectorBackend};
use crate::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const CONFIG_FILE: &str = "config.yml";
pub const OLLAMA_URL: &str = "http://localhost:11434";
pub const CHAT_MODEL: &str = "llama3.1:8b";
pub const EMBED_MODEL: &str = "nomic-embed-text";
pub const OLLAMA_TIMEOUT_SECS: u64 = 600;
pub const NEO4J_URI: &str = "bolt://localhost:7687";
pub const NEO4J_USER: &str = "neo4j";
pub const NEO4J_PASSWORD: &str = "12345678";
pub const QDRANT_URL: &str = "http://localhost:6334";
pub const DATA_DIR: &str = "./graphrag_db";
pub const COLLECTION_NAME: &str = "rag_collection";
pub const PDF_FOLDER: &str = "./source-pdf";
pub const CHUNK_SIZE: usize = 600;
pub const CHUNK_OVERLAP: usize = 50;
pub const VECTOR_TOP_K: usize = 3;
pub const GRAPH_LIMIT: usize = 10;
pub const MIN_TERM_CHARS: usize = 2;

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    ollama: Option<YamlOllama>,
    neo4j: Option<YamlNeo4j>,
    storage: Option<YamlStorage>,
    ingestion: Option<YamlIngestion>,
    retrieval: Option<YamlRetrieval>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlOllama {
    url: Option<String>,
    chat_model: Option<String>,
    embed_model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlNeo4j {
    uri: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlStorage {
    data_dir: Option<String>,
    graph_backend: Option<String>,
    vector_backend: Option<String>,
    collection: Option<String>,
    qdrant_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlIngestion {
    pdf_folder: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    chunking: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlRetrieval {
    vector_top_k: Option<usize>,
    graph_limit: Option<usize>,
    term_strategy: Option<String>,
    min_term_chars: Option<usize>,
    match_policy: Option<String>,
    answer_mode: Option<String>,
}

/// Ollama endpoint and model names.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub chat_model: String,
    pub embed_model: String,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

/// Neo4j credentials.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

/// Where and how chunks and graph edges are persisted.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory for local backends (vector collection, graph snapshot, lock file)
    pub data_dir: PathBuf,
    pub graph_backend: GraphBackend,
    pub vector_backend: VectorBackend,
    pub collection: String,
    pub qdrant_url: String,
    pub neo4j: Neo4jConfig,
}

/// Document loading and chunking.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub pdf_folder: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunking: ChunkingStrategy,
}

/// Query-time lookup settings.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub vector_top_k: usize,
    /// Max graph rows fetched per match term
    pub graph_limit: usize,
    pub term_strategy: TermStrategy,
    pub match_policy: MatchPolicy,
    pub answer_mode: AnswerMode,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub storage: StorageConfig,
    pub ingestion: IngestionConfig,
    pub retrieval: RetrievalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load configuration from `path` (or `config.yml`), falling back to defaults
    /// when the file does not exist. A file that exists but fails to parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_dotenv();

        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!("{} not found, using defaults", path.display());
            Self::from_yaml(YamlConfig::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty file deserializes to `null`
        let yaml: Option<YamlConfig> = serde_yaml::from_str(content)?;
        Self::from_yaml(yaml.unwrap_or_default())
    }

    /// Built-in defaults with environment overrides applied.
    pub fn defaults() -> Self {
        Self {
            ollama: OllamaConfig {
                url: env_or("OLLAMA_URL", OLLAMA_URL),
                chat_model: CHAT_MODEL.to_string(),
                embed_model: EMBED_MODEL.to_string(),
                temperature: None,
                timeout_secs: OLLAMA_TIMEOUT_SECS,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from(DATA_DIR),
                graph_backend: GraphBackend::Neo4j,
                vector_backend: VectorBackend::Local,
                collection: COLLECTION_NAME.to_string(),
                qdrant_url: env_or("QDRANT_URL", QDRANT_URL),
                neo4j: Neo4jConfig {
                    uri: env_or("NEO4J_URI", NEO4J_URI),
                    user: env_or("NEO4J_USER", NEO4J_USER),
                    password: env_or("NEO4J_PASSWORD", NEO4J_PASSWORD),
                },
            },
            ingestion: IngestionConfig {
                pdf_folder: PathBuf::from(PDF_FOLDER),
                chunk_size: CHUNK_SIZE,
                chunk_overlap: CHUNK_OVERLAP,
                chunking: ChunkingStrategy::Recursive,
            },
            retrieval: RetrievalConfig {
                vector_top_k: VECTOR_TOP_K,
                graph_limit: GRAPH_LIMIT,
                term_strategy: TermStrategy::Tokens {
                    min_chars: MIN_TERM_CHARS,
                },
                match_policy: MatchPolicy::Substring,
                answer_mode: AnswerMode::Chat,
            },
        }
    }

    fn from_yaml(yaml: YamlConfig) -> Result<Self> {
        let defaults = Self::defaults();

        let ollama = yaml.ollama.unwrap_or_default();
        let neo4j = yaml.neo4j.unwrap_or_default();
        let storage = yaml.storage.unwrap_or_default();
        let ingestion = yaml.ingestion.unwrap_or_default();
        let retrieval = yaml.retrieval.unwrap_or_default();

        let graph_backend = match storage.graph_backend.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.storage.graph_backend,
        };
        let vector_backend = match storage.vector_backend.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.storage.vector_backend,
        };
        let chunking = match ingestion.chunking.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.ingestion.chunking,
        };
        let match_policy = match retrieval.match_policy.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.retrieval.match_policy,
        };
        let answer_mode = match retrieval.answer_mode.as_deref() {
            Some(name) => name.parse()?,
            None => defaults.retrieval.answer_mode,
        };
        let min_chars = retrieval.min_term_chars.unwrap_or(MIN_TERM_CHARS);
        let term_strategy = match retrieval.term_strategy.as_deref() {
            Some(name) => TermStrategy::from_name(name, min_chars)?,
            None => TermStrategy::Tokens { min_chars },
        };

        let config = Self {
            ollama: OllamaConfig {
                url: resolve_env_string(ollama.url, "OLLAMA_URL", OLLAMA_URL),
                chat_model: ollama.chat_model.unwrap_or(defaults.ollama.chat_model),
                embed_model: ollama.embed_model.unwrap_or(defaults.ollama.embed_model),
                temperature: ollama.temperature,
                timeout_secs: ollama.timeout_secs.unwrap_or(OLLAMA_TIMEOUT_SECS),
            },
            storage: StorageConfig {
                data_dir: storage
                    .data_dir
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
                graph_backend,
                vector_backend,
                collection: storage.collection.unwrap_or(defaults.storage.collection),
                qdrant_url: resolve_env_string(storage.qdrant_url, "QDRANT_URL", QDRANT_URL),
                neo4j: Neo4jConfig {
                    uri: resolve_env_string(neo4j.uri, "NEO4J_URI", NEO4J_URI),
                    user: resolve_env_string(neo4j.user, "NEO4J_USER", NEO4J_USER),
                    password: resolve_env_string(neo4j.password, "NEO4J_PASSWORD", NEO4J_PASSWORD),
                },
            },
            ingestion: IngestionConfig {
                pdf_folder: ingestion
                    .pdf_folder
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ingestion.pdf_folder),
                chunk_size: ingestion.chunk_size.unwrap_or(CHUNK_SIZE),
                chunk_overlap: ingestion.chunk_overlap.unwrap_or(CHUNK_OVERLAP),
                chunking,
            },
            retrieval: RetrievalConfig {
                vector_top_k: retrieval.vector_top_k.unwrap_or(VECTOR_TOP_K),
                graph_limit: retrieval.graph_limit.unwrap_or(GRAPH_LIMIT),
                term_strategy,
                match_policy,
                answer_mode,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.chunk_size == 0 {
            return Err(Error::Config("ingestion.chunk_size must be > 0".into()));
        }
        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(Error::Config(format!(
                "ingestion.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.ingestion.chunk_overlap, self.ingestion.chunk_size
            )));
        }
        if self.retrieval.vector_top_k == 0 {
            return Err(Error::Config("retrieval.vector_top_k must be > 0".into()));
        }
        Ok(())
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        // Try to load from current directory first, then parent
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }
}

/// Resolve a value: env var first, then a `${VAR}` placeholder, then the YAML value.
fn resolve_env_string(value: Option<String>, env_key: &str, default: &str) -> String {
    if let Ok(env_val) = std::env::var(env_key) {
        return env_val;
    }
    if let Some(ref v) = value {
        if v.starts_with("${") && v.ends_with('}') {
            let var_name = &v[2..v.len() - 1];
            return std::env::var(var_name).unwrap_or_else(|_| default.to_string());
        }
    }
    value.unwrap_or_else(|| default.to_string())
}

fn env_or(env_key: &str, default: &str) -> String {
    std::env::var(env_key).unwrap_or_else(|_| default.to_string())
}
