//! Driver boundary and transaction scoping
//!
//! The OGM never talks to a database directly. It issues [`Statement`]s
//! through the [`Driver`] / [`Session`] / [`Transaction`] traits, implemented by:
//! - `Neo4jDriver` in the `togm-neo4j` crate (Bolt, via neo4rs)
//! - [`RecordingDriver`] (in-process, scripted; for tests)
//!
//! [`context`] scopes one transaction to one async block and makes it the
//! task's current transaction.

pub mod context;
pub mod recording;

use crate::cypher::Statement;
use crate::error::OgmResult;
use crate::graph::PropertyMap;
use async_trait::async_trait;
use std::fmt;

pub use context::{
    current_transaction, read_transaction, run_query, run_session, with_transaction,
    write_transaction, SessionHandle, TransactionHandle,
};
pub use recording::{RecordedStatement, RecordingDriver, SessionEvent};

/// One result row, keyed by column name
pub type Row = PropertyMap;

/// Transaction access mode, passed through to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    Read,
    #[default]
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "read"),
            AccessMode::Write => write!(f, "write"),
        }
    }
}

/// Source of sessions
#[async_trait]
pub trait Driver: Send + Sync {
    async fn session(&self) -> OgmResult<Box<dyn Session>>;
}

/// Scoped connection; closed once its block finishes
#[async_trait]
pub trait Session: Send {
    async fn begin_transaction(&mut self, mode: AccessMode) -> OgmResult<Box<dyn Transaction>>;

    async fn close(self: Box<Self>) -> OgmResult<()>;
}

/// Open transaction
#[async_trait]
pub trait Transaction: Send {
    /// Run one statement and collect all of its rows
    async fn run(&mut self, statement: &Statement) -> OgmResult<Vec<Row>>;

    async fn commit(self: Box<Self>) -> OgmResult<()>;

    async fn rollback(self: Box<Self>) -> OgmResult<()>;
}
