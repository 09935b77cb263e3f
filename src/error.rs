//! Error types for the OGM

use crate::graph::SchemaError;
use crate::query::shape::ValidationError;
use thiserror::Error;

/// Errors surfaced by compilation, execution and decoding
#[derive(Error, Debug)]
pub enum OgmError {
    /// Invalid graph schema
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A query was issued with no transaction in scope
    #[error("Not in a transaction")]
    NotInTransaction,

    /// A session handle was used after its block returned
    #[error("Session is closed")]
    SessionClosed,

    /// A command refers to an identity that has not been resolved
    #[error("Unresolved id: {0}")]
    UnresolvedId(String),

    /// A batched statement matched fewer rows than commands were submitted
    #[error("Partial match while running {phase}: expected {expected} rows, got {actual}")]
    PartialMatch {
        phase: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A returned row does not fit the selection's result shape
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Condition does not fit the schema
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// Selection does not fit the schema
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Property value does not fit its declaration
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Label not declared in the graph
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Relationship type not declared in the graph
    #[error("Unknown relationship type: {0}")]
    UnknownRelationshipType(String),

    /// Error reported by the database driver
    #[error("Driver error: {0}")]
    Driver(String),
}

pub type OgmResult<T> = Result<T, OgmError>;
