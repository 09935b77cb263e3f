//! Bolt driver
//!
//! Implements the togm session traits on top of a pooled [`neo4rs::Graph`].
//! Each togm transaction is one explicit Bolt transaction.

use crate::config::Neo4jConfig;
use crate::convert::{from_bolt, to_bolt};
use crate::error::{Neo4jError, Neo4jResult};
use async_trait::async_trait;
use neo4rs::{BoltType, Graph, Txn};
use togm::cypher::Statement;
use togm::session::{AccessMode, Driver, Row, Session, Transaction};
use togm::OgmResult;
use tracing::{debug, info};

/// Driver backed by a neo4rs connection pool
#[derive(Clone)]
pub struct Neo4jDriver {
    graph: Graph,
    uri: String,
}

impl Neo4jDriver {
    /// Connect using `config`
    pub async fn connect(config: &Neo4jConfig) -> Neo4jResult<Self> {
        let graph = Graph::connect(config.to_bolt_config()?).await?;
        info!(
            "Connected to {} (database: {})",
            config.uri,
            config.database.as_deref().unwrap_or("default")
        );
        Ok(Self { graph, uri: config.uri.clone() })
    }

    /// Wrap an already connected pool
    pub fn from_graph(graph: Graph, uri: impl Into<String>) -> Self {
        Self { graph, uri: uri.into() }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Debug for Neo4jDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jDriver").field("uri", &self.uri).finish()
    }
}

#[async_trait]
impl Driver for Neo4jDriver {
    async fn session(&self) -> OgmResult<Box<dyn Session>> {
        debug!("Opening session on {}", self.uri);
        Ok(Box::new(Neo4jSession { graph: self.graph.clone() }))
    }
}

struct Neo4jSession {
    graph: Graph,
}

#[async_trait]
impl Session for Neo4jSession {
    async fn begin_transaction(&mut self, mode: AccessMode) -> OgmResult<Box<dyn Transaction>> {
        // Pooled connections do not route by access mode; the mode is informational here.
        let txn = self.graph.start_txn().await.map_err(Neo4jError::from)?;
        debug!("Began {} transaction", mode);
        Ok(Box::new(Neo4jTransaction { txn }))
    }

    async fn close(self: Box<Self>) -> OgmResult<()> {
        debug!("Closed session");
        Ok(())
    }
}

struct Neo4jTransaction {
    txn: Txn,
}

impl Neo4jTransaction {
    async fn collect(&mut self, statement: &Statement) -> Neo4jResult<Vec<Row>> {
        let mut query = neo4rs::query(&statement.text);
        for (name, value) in &statement.parameters {
            query = query.param(name, to_bolt(value));
        }

        let mut stream = self.txn.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(self.txn.handle()).await? {
            let mut decoded = Row::new();
            for key in row.keys() {
                let bolt: BoltType = row
                    .get(&key.value)
                    .map_err(|e| Neo4jError::Conversion(format!("column '{}': {}", key.value, e)))?;
                decoded.insert(key.value.clone(), from_bolt(&bolt)?);
            }
            rows.push(decoded);
        }
        Ok(rows)
    }
}

#[async_trait]
impl Transaction for Neo4jTransaction {
    async fn run(&mut self, statement: &Statement) -> OgmResult<Vec<Row>> {
        Ok(self.collect(statement).await?)
    }

    async fn commit(self: Box<Self>) -> OgmResult<()> {
        self.txn.commit().await.map_err(Neo4jError::from)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> OgmResult<()> {
        self.txn.rollback().await.map_err(Neo4jError::from)?;
        Ok(())
    }
}
