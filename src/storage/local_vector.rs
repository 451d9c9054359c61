use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::vector_db::{VectorHit, VectorRecord};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVector {
    embedding: Vec<f32>,
    text: String,
    source: String,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    dimension: Option<usize>,
    records: BTreeMap<String, StoredVector>,
}

/// Flat-file vector collection keyed by chunk id, searched by cosine similarity.
#[derive(Debug)]
pub struct LocalVectorStore {
    path: PathBuf,
    collection: Collection,
    dirty: bool,
}

impl LocalVectorStore {
    /// Open `{data_dir}/{name}.json`, starting empty if it does not exist yet.
    pub fn open(data_dir: &Path, name: &str) -> Result<Self> {
        let path = data_dir.join(format!("{}.json", name));
        let collection = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::VectorStore(format!("Corrupt collection {}: {}", path.display(), e))
            })?
        } else {
            Collection::default()
        };

        debug!(
            "Opened local collection {} ({} entries)",
            path.display(),
            collection.records.len()
        );

        Ok(Self {
            path,
            collection,
            dirty: false,
        })
    }

    pub fn len(&self) -> usize {
        self.collection.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.records.is_empty()
    }

    /// Insert or overwrite the entry for `record.id`.
    pub fn upsert(&mut self, record: VectorRecord) -> Result<()> {
        let dimension = record.embedding.len();
        match self.collection.dimension {
            Some(expected) if expected != dimension => {
                return Err(Error::VectorStore(format!(
                    "Embedding dimension {} does not match collection dimension {}",
                    dimension, expected
                )))
            }
            Some(_) => {}
            None => self.collection.dimension = Some(dimension),
        }

        self.collection.records.insert(
            record.id,
            StoredVector {
                embedding: record.embedding,
                text: record.text,
                source: record.source,
                stored_at: Utc::now(),
            },
        );
        self.dirty = true;
        Ok(())
    }

    /// Top `limit` entries by cosine similarity, best first.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        if let Some(expected) = self.collection.dimension {
            if expected != query.len() {
                return Err(Error::VectorStore(format!(
                    "Query dimension {} does not match collection dimension {}",
                    query.len(),
                    expected
                )));
            }
        }

        let mut scored: Vec<VectorHit> = self
            .collection
            .records
            .iter()
            .map(|(id, stored)| VectorHit {
                chunk_id: id.clone(),
                text: stored.text.clone(),
                source: stored.source.clone(),
                score: cosine_similarity(query, &stored.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    /// Write the collection if it changed since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&self.collection)?)?;
        std::fs::rename(&tmp, &self.path)?;
        self.dirty = false;

        debug!("Flushed {} vectors to {}", self.len(), self.path.display());
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
