//! Error types for the Neo4j driver

use thiserror::Error;
use togm::OgmError;

/// Errors that can occur when talking to Neo4j
#[derive(Error, Debug)]
pub enum Neo4jError {
    /// Error reported by the Bolt client
    #[error("Bolt error: {0}")]
    Bolt(#[from] neo4rs::Error),

    /// A value has no counterpart on the other side
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Neo4jResult<T> = Result<T, Neo4jError>;

impl From<Neo4jError> for OgmError {
    fn from(e: Neo4jError) -> Self {
        OgmError::Driver(e.to_string())
    }
}
