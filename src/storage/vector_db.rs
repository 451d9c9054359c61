//! Vector store: local JSON collection or Qdrant

use std::collections::HashMap;

use qdrant_client::qdrant::{
    value::Kind, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tracing::{debug, info};
use uuid::Uuid;

use super::local_vector::LocalVectorStore;
use crate::Result;

/// Entry written for one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Chunk id
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub source: String,
}

/// Search result.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub chunk_id: String,
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Qdrant point id for a chunk id. Qdrant only accepts integers and UUIDs.
pub fn point_id(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

/// Collection stored in Qdrant.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    ready: bool,
}

impl QdrantVectorStore {
    pub async fn connect(url: &str, collection: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build()?;

        let collections = client.list_collections().await?;
        let ready = collections.collections.iter().any(|c| c.name == collection);
        debug!("Qdrant collection '{}' exists: {}", collection, ready);

        Ok(Self {
            client,
            collection: collection.to_string(),
            ready,
        })
    }

    /// Create the collection with the dimension of the first embedding.
    async fn ensure_collection(&mut self, dimension: usize) -> Result<()> {
        if self.ready {
            return Ok(());
        }

        info!(
            "Creating collection '{}' (dimension {})",
            self.collection, dimension
        );
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await?;
        self.ready = true;
        Ok(())
    }

    pub async fn upsert(&mut self, record: VectorRecord) -> Result<()> {
        self.ensure_collection(record.embedding.len()).await?;

        let mut payload: HashMap<String, QdrantValue> = HashMap::new();
        payload.insert("chunk_id".into(), record.id.clone().into());
        payload.insert("text".into(), record.text.into());
        payload.insert("source".into(), record.source.into());

        let point = PointStruct::new(point_id(&record.id), record.embedding, payload);
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await?;
        Ok(())
    }

    pub async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        if !self.ready {
            return Ok(Vec::new());
        }

        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| {
                Some(VectorHit {
                    chunk_id: payload_str(&point.payload, "chunk_id")?,
                    text: payload_str(&point.payload, "text")?,
                    source: payload_str(&point.payload, "source").unwrap_or_default(),
                    score: point.score,
                })
            })
            .collect())
    }

    pub async fn count(&self) -> Result<u64> {
        if !self.ready {
            return Ok(0);
        }

        let info = self.client.collection_info(&self.collection).await?;
        Ok(info
            .result
            .map(|r| r.points_count.unwrap_or(0))
            .unwrap_or(0))
    }
}

fn payload_str(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    match payload.get(key)?.kind.as_ref()? {
        Kind::StringValue(v) => Some(v.clone()),
        _ => None,
    }
}

/// Configured vector backend.
pub enum VectorStore {
    Local(LocalVectorStore),
    Qdrant(QdrantVectorStore),
}

impl VectorStore {
    pub async fn qdrant(url: &str, collection: &str) -> Result<Self> {
        Ok(Self::Qdrant(QdrantVectorStore::connect(url, collection).await?))
    }

    /// Insert or overwrite the entry for `record.id`.
    pub async fn upsert(&mut self, record: VectorRecord) -> Result<()> {
        match self {
            VectorStore::Local(store) => store.upsert(record),
            VectorStore::Qdrant(store) => store.upsert(record).await,
        }
    }

    /// Nearest `limit` chunks to `query`, best first.
    pub async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        match self {
            VectorStore::Local(store) => store.search(query, limit),
            VectorStore::Qdrant(store) => store.search(query, limit).await,
        }
    }

    pub async fn count(&self) -> Result<u64> {
        match self {
            VectorStore::Local(store) => Ok(store.len() as u64),
            VectorStore::Qdrant(store) => store.count().await,
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self {
            VectorStore::Local(store) => store.flush(),
            VectorStore::Qdrant(_) => Ok(()),
        }
    }
}
