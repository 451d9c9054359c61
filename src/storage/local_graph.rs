use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::graph_db::GraphEdge;
use crate::rag::{MatchPolicy, Triple};
use crate::{Error, Result};

const SNAPSHOT_FILE: &str = "graph.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    entities: BTreeSet<String>,
    edges: Vec<GraphEdge>,
}

/// Entity graph kept in memory and persisted as a JSON snapshot.
/// Entities merge on name, edges on (head, relation, tail).
#[derive(Debug)]
pub struct MemoryGraph {
    path: Option<PathBuf>,
    entities: BTreeSet<String>,
    edges: Vec<GraphEdge>,
    index: HashMap<(String, String, String), usize>,
    dirty: bool,
}

impl MemoryGraph {
    /// Graph without a backing file.
    pub fn new() -> Self {
        Self::from_snapshot(None, Snapshot::default())
    }

    /// Load `{data_dir}/graph.json` if present.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SNAPSHOT_FILE);
        let snapshot = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::Graph(format!("Corrupt graph snapshot {}: {}", path.display(), e))
            })?
        } else {
            Snapshot::default()
        };

        Ok(Self::from_snapshot(Some(path), snapshot))
    }

    fn from_snapshot(path: Option<PathBuf>, snapshot: Snapshot) -> Self {
        let index = snapshot
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.head.clone(), e.relation.clone(), e.tail.clone()), i))
            .collect();

        Self {
            path,
            entities: snapshot.entities,
            edges: snapshot.edges,
            index,
            dirty: false,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Merge one triple. Returns `true` if a new edge was created.
    pub fn merge(&mut self, triple: &Triple, source: &str) -> bool {
        self.entities.insert(triple.head.clone());
        self.entities.insert(triple.tail.clone());
        self.dirty = true;

        let key = (
            triple.head.clone(),
            triple.relation.clone(),
            triple.tail.clone(),
        );
        if self.index.contains_key(&key) {
            return false;
        }

        self.index.insert(key, self.edges.len());
        self.edges.push(GraphEdge {
            head: triple.head.clone(),
            relation: triple.relation.clone(),
            tail: triple.tail.clone(),
            source: source.to_string(),
        });
        true
    }

    /// Edges with either endpoint matching `term`, in insertion order.
    pub fn search(&self, term: &str, policy: MatchPolicy, limit: usize) -> Vec<GraphEdge> {
        self.edges
            .iter()
            .filter(|e| policy.matches(&e.head, term) || policy.matches(&e.tail, term))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn flush(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        let snapshot = Snapshot {
            entities: self.entities.clone(),
            edges: self.edges.clone(),
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&snapshot)?)?;
        std::fs::rename(&tmp, path)?;
        self.dirty = false;

        debug!(
            "Flushed graph snapshot ({} entities, {} edges)",
            self.entities.len(),
            self.edges.len()
        );
        Ok(())
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}
