//! Typed references between node types
//!
//! A reference says "nodes of this type may be reached from here through
//! relationships of type T, in direction D, with multiplicity M". It holds no
//! data; selections use it to build traversal patterns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge direction, seen from the declaring node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `(self)-[:T]->(target)`
    #[default]
    Outgoing,
    /// `(self)<-[:T]-(target)`
    Incoming,
    /// `(self)-[:T]-(target)`
    Undirected,
}

/// How many targets a reference resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    /// Exactly one target, returned as a single object
    One,
    /// Any number of targets, returned as a list
    Many,
    /// Zero or one target, returned as an object or null
    Optional,
}

impl Multiplicity {
    /// Whether the traversal result is a list rather than its first element
    pub fn is_list(&self) -> bool {
        matches!(self, Multiplicity::Many)
    }
}

/// Declared reference from one node type to another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(alias = "relationship", alias = "type")]
    pub relationship_type: String,
    pub label: String,
    #[serde(default)]
    pub direction: Direction,
    pub multiplicity: Multiplicity,
}

impl Reference {
    pub fn new(
        relationship_type: impl Into<String>,
        label: impl Into<String>,
        multiplicity: Multiplicity,
    ) -> Self {
        Self {
            relationship_type: relationship_type.into(),
            label: label.into(),
            direction: Direction::Outgoing,
            multiplicity,
        }
    }

    pub fn one(relationship_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(relationship_type, label, Multiplicity::One)
    }

    pub fn many(relationship_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(relationship_type, label, Multiplicity::Many)
    }

    pub fn optional(relationship_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(relationship_type, label, Multiplicity::Optional)
    }

    pub fn outgoing(mut self) -> Self {
        self.direction = Direction::Outgoing;
        self
    }

    pub fn incoming(mut self) -> Self {
        self.direction = Direction::Incoming;
        self
    }

    pub fn undirected(mut self) -> Self {
        self.direction = Direction::Undirected;
        self
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = match self.direction {
            Direction::Outgoing => ("-", "->"),
            Direction::Incoming => ("<-", "-"),
            Direction::Undirected => ("-", "-"),
        };
        let suffix = match self.multiplicity {
            Multiplicity::One => "",
            Multiplicity::Many => "[]",
            Multiplicity::Optional => "?",
        };
        write!(f, "{}[:{}]{}({}){}", left, self.relationship_type, right, self.label, suffix)
    }
}
