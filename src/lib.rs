//! togm: typed object-graph mapper for Cypher databases
//!
//! Declare node types, relationship types, properties and references once,
//! then compile finds, nested selections, conditions and bulk updates into
//! parameterized Cypher.
//!
//! # Layers
//!
//! - [`graph`]: schema definitions, validated eagerly when a graph is built
//! - [`cypher`]: fragment tree IR, flattened into text plus parameters
//! - [`query`]: condition and selection compilers, find queries, result shapes
//! - [`update`]: command batches executed in dependency-respecting phases
//! - [`session`]: driver traits and the task-local current transaction
//!
//! ## Example Usage
//!
//! ```rust
//! use togm::graph::{GraphDefinition, NodeDefinition, Property, Reference, RelationshipDefinition};
//! use togm::query::{Condition, FindQuery, PropertyCondition, Selection};
//!
//! let graph = GraphDefinition::builder()
//!     .node(
//!         "Movie",
//!         NodeDefinition::new()
//!             .property("title", Property::string())
//!             .property("released", Property::number())
//!             .reference("actors", Reference::many("ACTED_IN", "Person").incoming()),
//!     )
//!     .node("Person", NodeDefinition::new().property("name", Property::string()))
//!     .relationship("ACTED_IN", RelationshipDefinition::new())
//!     .build()
//!     .unwrap();
//!
//! let query = FindQuery::new(
//!     &graph,
//!     "Movie",
//!     &Selection::new().follow("actors", Selection::new()),
//!     &Condition::new().property("released", PropertyCondition::gt(1999)),
//! )
//! .unwrap();
//!
//! let statement = query.statement();
//! assert!(statement.text.starts_with("MATCH (`v0`:`Movie`) WHERE `v0`.`released` > $p0 RETURN"));
//! assert_eq!(statement.parameters.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod cypher;
pub mod error;
pub mod graph;
pub mod query;
pub mod session;
pub mod update;

// Re-export main types for convenience
pub use error::{OgmError, OgmResult};

pub use graph::{
    Direction, GraphDefinition, Multiplicity, NodeDefinition, NodeId, Property, PropertyMap,
    PropertyType, Reference, RelationshipDefinition, RelationshipId, SchemaError, Value,
};

pub use cypher::{Fragment, Identifier, Parameter, Statement};

pub use query::{
    decode, find, find_one, Condition, FindQuery, Model, PropertyCondition, RelationshipModel,
    ResultShape, Selection, ValidationError,
};

pub use session::{
    current_transaction, read_transaction, run_query, run_session, write_transaction, AccessMode,
    Driver, RecordingDriver, Row, Session, SessionHandle, Transaction, TransactionHandle,
};

pub use update::{
    run_commands, Command, CommandBatch, CommandId, EntityKind, EntityRef, RunSummary,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
