//! Persistence for chunk embeddings and the entity/relation graph.
//!
//! Provides:
//! - `VectorStore`: local JSON collection or Qdrant
//! - `GraphStore`: Neo4j or a JSON-snapshot memory graph
//! - `HybridStore`: both handles plus the data-dir lock held by local backends

pub mod graph_db;
pub mod local_graph;
pub mod local_vector;
pub mod vector_db;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fs2::FileExt;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::{Error, Result};

pub use graph_db::{GraphEdge, GraphStats, GraphStore};
pub use local_graph::MemoryGraph;
pub use local_vector::LocalVectorStore;
pub use vector_db::{VectorHit, VectorRecord, VectorStore};

const LOCK_FILE: &str = ".lock";

/// Graph database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphBackend {
    Neo4j,
    /// Merge semantics over `{data_dir}/graph.json`
    Memory,
}

impl FromStr for GraphBackend {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "memory" | "local" => Ok(Self::Memory),
            other => Err(Error::Config(format!("unknown graph backend: {}", other))),
        }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    /// `{data_dir}/{collection}.json`
    Local,
    Qdrant,
}

impl FromStr for VectorBackend {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(Error::Config(format!("unknown vector backend: {}", other))),
        }
    }
}

/// Exclusive lock on a data directory, released on drop.
pub struct StoreLock {
    lock_file: Option<File>,
    path: PathBuf,
}

impl StoreLock {
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                lock_file: Some(lock_file),
                path,
            }),
            Err(_) => Err(Error::StoreLocked(data_dir.display().to_string())),
        }
    }

    pub fn release(&mut self) {
        if let Some(ref file) = self.lock_file {
            let _ = file.unlock();
            let _ = std::fs::remove_file(&self.path);
        }
        self.lock_file = None;
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Counts reported by `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub entities: u64,
    pub relations: u64,
    pub vectors: u64,
}

/// Vector store and graph opened together.
pub struct HybridStore {
    pub vectors: VectorStore,
    pub graph: GraphStore,
    lock: Option<StoreLock>,
}

impl HybridStore {
    /// Open both backends. Local backends lock `data_dir` for the lifetime of the store.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let needs_dir = config.vector_backend == VectorBackend::Local
            || config.graph_backend == GraphBackend::Memory;

        let lock = if needs_dir {
            std::fs::create_dir_all(&config.data_dir)?;
            Some(StoreLock::acquire(&config.data_dir)?)
        } else {
            None
        };

        let vectors = match config.vector_backend {
            VectorBackend::Local => VectorStore::Local(LocalVectorStore::open(
                &config.data_dir,
                &config.collection,
            )?),
            VectorBackend::Qdrant => {
                VectorStore::qdrant(&config.qdrant_url, &config.collection).await?
            }
        };

        let graph = match config.graph_backend {
            GraphBackend::Neo4j => GraphStore::neo4j(&config.neo4j).await?,
            GraphBackend::Memory => GraphStore::Memory(MemoryGraph::open(&config.data_dir)?),
        };

        info!(
            "Opened store: vectors={:?} graph={:?} collection={}",
            config.vector_backend, config.graph_backend, config.collection
        );

        Ok(Self {
            vectors,
            graph,
            lock,
        })
    }

    /// Persist pending local writes.
    pub fn flush(&mut self) -> Result<()> {
        self.vectors.flush()?;
        self.graph.flush()
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let graph = self.graph.stats().await?;
        Ok(StoreStats {
            entities: graph.entities,
            relations: graph.relations,
            vectors: self.vectors.count().await?,
        })
    }

    /// Flush local files, drop connections and release the data-dir lock.
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        if let Some(mut lock) = self.lock.take() {
            lock.release();
        }
        debug!("Store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StorageConfig};
    use tempfile::TempDir;

    fn local_config(dir: &Path) -> StorageConfig {
        let mut storage = Config::defaults().storage;
        storage.data_dir = dir.to_path_buf();
        storage.graph_backend = GraphBackend::Memory;
        storage.vector_backend = VectorBackend::Local;
        storage
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!("neo4j".parse::<GraphBackend>().unwrap(), GraphBackend::Neo4j);
        assert_eq!("Memory".parse::<GraphBackend>().unwrap(), GraphBackend::Memory);
        assert_eq!("qdrant".parse::<VectorBackend>().unwrap(), VectorBackend::Qdrant);

        let err = "cassandra".parse::<GraphBackend>().unwrap_err();
        assert!(err.to_string().contains("cassandra"));
        assert!("chroma".parse::<VectorBackend>().is_err());
    }

    #[test]
    fn store_lock_is_exclusive_until_released() {
        let dir = TempDir::new().unwrap();

        let mut first = StoreLock::acquire(dir.path()).unwrap();
        assert!(matches!(
            StoreLock::acquire(dir.path()),
            Err(Error::StoreLocked(_))
        ));

        first.release();
        assert!(StoreLock::acquire(dir.path()).is_ok());
    }

    #[tokio::test]
    async fn local_store_opens_locks_and_closes() {
        let dir = TempDir::new().unwrap();
        let config = local_config(dir.path());

        let store = HybridStore::connect(&config).await.unwrap();
        assert!(dir.path().join(LOCK_FILE).exists());
        assert!(matches!(
            HybridStore::connect(&config).await,
            Err(Error::StoreLocked(_))
        ));

        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
        store.close().unwrap();

        let reopened = HybridStore::connect(&config).await.unwrap();
        reopened.close().unwrap();
    }
}
