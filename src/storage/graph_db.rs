//! Entity/relation graph: Neo4j or the local memory graph

use neo4rs::{query, Graph};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::local_graph::MemoryGraph;
use crate::config::Neo4jConfig;
use crate::rag::{complete_triples, MatchPolicy, RawTriple};
use crate::Result;

/// Stored relation edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub head: String,
    pub relation: String,
    pub tail: String,
    /// Chunk id the edge was first extracted from
    pub source: String,
}

impl GraphEdge {
    /// `"{head} --[{relation}]--> {tail}"`
    pub fn line(&self) -> String {
        format!("{} --[{}]--> {}", self.head, self.relation, self.tail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphStats {
    pub entities: u64,
    pub relations: u64,
}

const MERGE_RELATIONS: &str = "UNWIND $rows AS row
     MERGE (h:Entity {name: row[0]})
     MERGE (t:Entity {name: row[2]})
     MERGE (h)-[r:RELATION {type: row[1]}]->(t)
     ON CREATE SET r.source = $source";

/// Graph store backed by Neo4j
pub struct Neo4jGraph {
    graph: Graph,
}

impl Neo4jGraph {
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let graph = Graph::new(&config.uri, &config.user, &config.password).await?;
        let store = Self { graph };
        store.init_schema().await?;
        info!("Connected to Neo4j at {}", config.uri);
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        self.graph
            .run(query(
                "CREATE CONSTRAINT entity_name IF NOT EXISTS FOR (e:Entity) REQUIRE e.name IS UNIQUE",
            ))
            .await?;
        Ok(())
    }

    pub async fn merge(&self, rows: Vec<Vec<String>>, source: &str) -> Result<()> {
        let q = query(MERGE_RELATIONS)
            .param("rows", rows)
            .param("source", source);
        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn search(
        &self,
        term: &str,
        policy: MatchPolicy,
        limit: usize,
    ) -> Result<Vec<GraphEdge>> {
        let cypher = format!(
            "MATCH (h:Entity)-[r:RELATION]->(t:Entity)
             WHERE {} OR {}
             RETURN h.name AS head, r.type AS relation, t.name AS tail, r.source AS source
             LIMIT $limit",
            policy.cypher_condition("h"),
            policy.cypher_condition("t"),
        );
        let q = query(&cypher)
            .param("term", term)
            .param("limit", limit as i64);

        let mut result = self.graph.execute(q).await?;
        let mut edges = Vec::new();

        while let Some(row) = result.next().await? {
            if let (Ok(head), Ok(relation), Ok(tail)) = (
                row.get::<String>("head"),
                row.get::<String>("relation"),
                row.get::<String>("tail"),
            ) {
                edges.push(GraphEdge {
                    head,
                    relation,
                    tail,
                    source: row.get::<String>("source").unwrap_or_default(),
                });
            }
        }

        Ok(edges)
    }

    async fn count(&self, cypher: &str) -> Result<u64> {
        let mut result = self.graph.execute(query(cypher)).await?;
        Ok(match result.next().await? {
            Some(row) => row.get::<i64>("n").unwrap_or(0) as u64,
            None => 0,
        })
    }

    pub async fn stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            entities: self.count("MATCH (e:Entity) RETURN count(e) AS n").await?,
            relations: self
                .count("MATCH (:Entity)-[r:RELATION]->(:Entity) RETURN count(r) AS n")
                .await?,
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let mut result = self.graph.execute(query("RETURN 1 AS n")).await?;
        while result.next().await?.is_some() {}
        Ok(())
    }
}

/// Configured graph backend.
pub enum GraphStore {
    Neo4j(Neo4jGraph),
    Memory(MemoryGraph),
}

impl GraphStore {
    pub async fn neo4j(config: &Neo4jConfig) -> Result<Self> {
        Ok(Self::Neo4j(Neo4jGraph::connect(config).await?))
    }

    /// Merge the complete triples among `triples`, tagging new edges with
    /// `source`. Returns how many triples were written.
    pub async fn merge_triples(&mut self, triples: &[RawTriple], source: &str) -> Result<usize> {
        let complete = complete_triples(triples);
        let skipped = triples.len() - complete.len();
        if skipped > 0 {
            debug!("Dropping {} incomplete triples from {}", skipped, source);
        }
        if complete.is_empty() {
            return Ok(0);
        }

        match self {
            GraphStore::Neo4j(graph) => {
                let rows = complete
                    .iter()
                    .map(|t| vec![t.head.clone(), t.relation.clone(), t.tail.clone()])
                    .collect();
                graph.merge(rows, source).await?;
            }
            GraphStore::Memory(graph) => {
                for triple in &complete {
                    graph.merge(triple, source);
                }
            }
        }

        Ok(complete.len())
    }

    /// Edges whose head or tail name matches `term`, at most `limit`.
    pub async fn search(
        &self,
        term: &str,
        policy: MatchPolicy,
        limit: usize,
    ) -> Result<Vec<GraphEdge>> {
        match self {
            GraphStore::Neo4j(graph) => graph.search(term, policy, limit).await,
            GraphStore::Memory(graph) => Ok(graph.search(term, policy, limit)),
        }
    }

    pub async fn stats(&self) -> Result<GraphStats> {
        match self {
            GraphStore::Neo4j(graph) => graph.stats().await,
            GraphStore::Memory(graph) => Ok(GraphStats {
                entities: graph.entity_count() as u64,
                relations: graph.edge_count() as u64,
            }),
        }
    }

    /// Connectivity check.
    pub async fn ping(&self) -> Result<()> {
        match self {
            GraphStore::Neo4j(graph) => graph.ping().await,
            GraphStore::Memory(_) => Ok(()),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self {
            GraphStore::Neo4j(_) => Ok(()),
            GraphStore::Memory(graph) => graph.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_line_format() {
        let edge = GraphEdge {
            head: "RTX 2080 Ti".into(),
            relation: "生產商".into(),
            tail: "NVIDIA".into(),
            source: "doc_001".into(),
        };
        assert_eq!(edge.line(), "RTX 2080 Ti --[生產商]--> NVIDIA");
    }

    #[test]
    fn merge_query_keeps_first_source() {
        assert!(MERGE_RELATIONS.contains("UNWIND $rows"));
        assert!(MERGE_RELATIONS.contains("ON CREATE SET r.source = $source"));
    }

    #[tokio::test]
    async fn merge_triples_persists_only_complete_ones() {
        let mut store = GraphStore::Memory(MemoryGraph::new());
        let triples = vec![
            RawTriple::new("A", "r", "B"),
            RawTriple {
                head: Some("A".into()),
                relation: None,
                tail: Some("C".into()),
            },
            RawTriple::new("B", "r", ""),
            RawTriple::new("C", "r", "D"),
        ];

        let written = store.merge_triples(&triples, "doc_part_0").await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            store.stats().await.unwrap(),
            GraphStats {
                entities: 4,
                relations: 2
            }
        );
    }

    #[tokio::test]
    async fn merge_triples_is_idempotent() {
        let mut store = GraphStore::Memory(MemoryGraph::new());
        let triples = vec![RawTriple::new("A", "r", "B")];

        store.merge_triples(&triples, "s").await.unwrap();
        store.merge_triples(&triples, "s").await.unwrap();

        assert_eq!(store.stats().await.unwrap().relations, 1);
    }

    #[tokio::test]
    async fn empty_batch_writes_nothing() {
        let mut store = GraphStore::Memory(MemoryGraph::new());
        assert_eq!(store.merge_triples(&[], "s").await.unwrap(), 0);
        assert!(store.ping().await.is_ok());
    }
}
