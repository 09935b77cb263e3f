//! Node, relationship and graph definitions
//!
//! A [`GraphDefinition`] is built once and validated eagerly: every reference
//! must point at a declared label through a declared relationship type, and
//! member names must be usable as result fields. Construction either returns
//! a fully valid graph or a [`SchemaError`].

use super::property::Property;
use super::reference::Reference;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Schema construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Member name starts with `$`
    #[error("Reserved member name '{name}' on {owner}: names starting with '$' are reserved")]
    ReservedName { owner: String, name: String },

    /// Empty member, label or type name
    #[error("Empty name on {0}")]
    EmptyName(String),

    /// Same name used for a property and a reference
    #[error("Member '{name}' on {owner} is declared both as a property and as a reference")]
    DuplicateMember { owner: String, name: String },

    /// Label declared twice
    #[error("Node label '{0}' is declared more than once")]
    DuplicateLabel(String),

    /// Relationship type declared twice
    #[error("Relationship type '{0}' is declared more than once")]
    DuplicateRelationshipType(String),

    /// Reference to an undeclared label
    #[error("Reference {owner}.{reference} targets undeclared label '{label}'")]
    UnknownLabel { owner: String, reference: String, label: String },

    /// Reference through an undeclared relationship type
    #[error("Reference {owner}.{reference} uses undeclared relationship type '{relationship_type}'")]
    UnknownRelationshipType { owner: String, reference: String, relationship_type: String },

    /// Unreadable or malformed schema document
    #[error("Invalid schema document: {0}")]
    Document(String),
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Declared node type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    #[serde(default)]
    pub properties: IndexMap<String, Property>,
    #[serde(default)]
    pub references: IndexMap<String, Reference>,
}

impl NodeDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    pub fn reference(mut self, name: impl Into<String>, reference: Reference) -> Self {
        self.references.insert(name.into(), reference);
        self
    }

    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn get_reference(&self, name: &str) -> Option<&Reference> {
        self.references.get(name)
    }

    fn validate(&self, label: &str) -> SchemaResult<()> {
        let owner = format!("node '{}'", label);
        for name in self.properties.keys().chain(self.references.keys()) {
            check_member_name(&owner, name)?;
        }
        if let Some(name) = self.references.keys().find(|n| self.properties.contains_key(*n)) {
            return Err(SchemaError::DuplicateMember { owner, name: name.clone() });
        }
        Ok(())
    }
}

/// Declared relationship type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    #[serde(default)]
    pub properties: IndexMap<String, Property>,
}

impl RelationshipDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    fn validate(&self, relationship_type: &str) -> SchemaResult<()> {
        let owner = format!("relationship '{}'", relationship_type);
        for name in self.properties.keys() {
            check_member_name(&owner, name)?;
        }
        Ok(())
    }
}

fn check_member_name(owner: &str, name: &str) -> SchemaResult<()> {
    if name.is_empty() {
        return Err(SchemaError::EmptyName(owner.to_string()));
    }
    if name.starts_with('$') {
        return Err(SchemaError::ReservedName { owner: owner.to_string(), name: name.to_string() });
    }
    Ok(())
}

/// Validated graph schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument", into = "GraphDocument")]
pub struct GraphDefinition {
    nodes: IndexMap<String, NodeDefinition>,
    relationships: IndexMap<String, RelationshipDefinition>,
}

impl GraphDefinition {
    /// Validate and build a graph from complete maps.
    pub fn new(
        nodes: IndexMap<String, NodeDefinition>,
        relationships: IndexMap<String, RelationshipDefinition>,
    ) -> SchemaResult<Self> {
        for (relationship_type, definition) in &relationships {
            if relationship_type.is_empty() {
                return Err(SchemaError::EmptyName("relationship type".to_string()));
            }
            definition.validate(relationship_type)?;
        }

        for (label, definition) in &nodes {
            if label.is_empty() {
                return Err(SchemaError::EmptyName("node label".to_string()));
            }
            definition.validate(label)?;

            for (name, reference) in &definition.references {
                if !nodes.contains_key(&reference.label) {
                    return Err(SchemaError::UnknownLabel {
                        owner: label.clone(),
                        reference: name.clone(),
                        label: reference.label.clone(),
                    });
                }
                if !relationships.contains_key(&reference.relationship_type) {
                    return Err(SchemaError::UnknownRelationshipType {
                        owner: label.clone(),
                        reference: name.clone(),
                        relationship_type: reference.relationship_type.clone(),
                    });
                }
            }
        }

        Ok(Self { nodes, relationships })
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn node(&self, label: &str) -> Option<&NodeDefinition> {
        self.nodes.get(label)
    }

    pub fn relationship(&self, relationship_type: &str) -> Option<&RelationshipDefinition> {
        self.relationships.get(relationship_type)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeDefinition)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn relationships(&self) -> impl Iterator<Item = (&str, &RelationshipDefinition)> {
        self.relationships.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Load a schema from YAML
    pub fn from_yaml_str(input: &str) -> SchemaResult<Self> {
        serde_yaml::from_str(input).map_err(|e| SchemaError::Document(e.to_string()))
    }

    /// Load a schema from JSON
    pub fn from_json_str(input: &str) -> SchemaResult<Self> {
        serde_json::from_str(input).map_err(|e| SchemaError::Document(e.to_string()))
    }

    /// Load a schema file; `.json` files are read as JSON, everything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Document(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&input),
            _ => Self::from_yaml_str(&input),
        }
    }
}

/// Incremental graph construction; validation happens in [`GraphBuilder::build`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<(String, NodeDefinition)>,
    relationships: Vec<(String, RelationshipDefinition)>,
}

impl GraphBuilder {
    pub fn node(mut self, label: impl Into<String>, definition: NodeDefinition) -> Self {
        self.nodes.push((label.into(), definition));
        self
    }

    pub fn relationship(
        mut self,
        relationship_type: impl Into<String>,
        definition: RelationshipDefinition,
    ) -> Self {
        self.relationships.push((relationship_type.into(), definition));
        self
    }

    pub fn build(self) -> SchemaResult<GraphDefinition> {
        let mut nodes = IndexMap::with_capacity(self.nodes.len());
        for (label, definition) in self.nodes {
            if nodes.contains_key(&label) {
                return Err(SchemaError::DuplicateLabel(label));
            }
            nodes.insert(label, definition);
        }

        let mut relationships = IndexMap::with_capacity(self.relationships.len());
        for (relationship_type, definition) in self.relationships {
            if relationships.contains_key(&relationship_type) {
                return Err(SchemaError::DuplicateRelationshipType(relationship_type));
            }
            relationships.insert(relationship_type, definition);
        }

        GraphDefinition::new(nodes, relationships)
    }
}

/// Serialized form of a graph schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: IndexMap<String, NodeDefinition>,
    #[serde(default)]
    pub relationships: IndexMap<String, RelationshipDefinition>,
}

impl TryFrom<GraphDocument> for GraphDefinition {
    type Error = SchemaError;

    fn try_from(document: GraphDocument) -> Result<Self, Self::Error> {
        GraphDefinition::new(document.nodes, document.relationships)
    }
}

impl From<GraphDefinition> for GraphDocument {
    fn from(graph: GraphDefinition) -> Self {
        GraphDocument { nodes: graph.nodes, relationships: graph.relationships }
    }
}
