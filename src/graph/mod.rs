//! Graph schema and value model
//!
//! This module describes what may be stored:
//! - Node types with typed properties and typed references
//! - Relationship types with typed properties
//! - A validated graph tying both together
//!
//! It also holds the runtime [`Value`] tree and the store identity types.

pub mod definition;
pub mod property;
pub mod reference;
pub mod types;
pub mod value;

// Re-export main types
pub use definition::{
    GraphBuilder, GraphDefinition, GraphDocument, NodeDefinition, RelationshipDefinition,
    SchemaError, SchemaResult,
};
pub use property::{integer_like, Property, PropertyType};
pub use reference::{Direction, Multiplicity, Reference};
pub use types::{NodeId, RelationshipId};
pub use value::{Duration, Point, PropertyMap, Value};
