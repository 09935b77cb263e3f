//! Bulk update commands
//!
//! Commands live in a [`CommandBatch`] arena. Pushing a command returns its
//! [`CommandId`]; later commands refer to an entity created earlier in the
//! same batch through that id instead of a database id. The batch keeps a
//! side table of resolved database ids, filled in as creation phases run.

use crate::error::{OgmError, OgmResult};
use crate::graph::{NodeId, PropertyMap, RelationshipId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BATCH: AtomicU64 = AtomicU64::new(0);

/// Handle to a command inside the batch that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId {
    batch: u64,
    index: usize,
}

impl CommandId {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command #{}", self.index)
    }
}

/// Target of a command: a stored entity, or one created by an earlier command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Id(i64),
    Command(CommandId),
}

impl From<i64> for EntityRef {
    fn from(id: i64) -> Self {
        EntityRef::Id(id)
    }
}

impl From<NodeId> for EntityRef {
    fn from(id: NodeId) -> Self {
        EntityRef::Id(id.as_i64())
    }
}

impl From<RelationshipId> for EntityRef {
    fn from(id: RelationshipId) -> Self {
        EntityRef::Id(id.as_i64())
    }
}

impl From<CommandId> for EntityRef {
    fn from(id: CommandId) -> Self {
        EntityRef::Command(id)
    }
}

/// Kind of stored entity; node and relationship ids are separate spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Relationship,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Node => write!(f, "node"),
            EntityKind::Relationship => write!(f, "relationship"),
        }
    }
}

/// One graph mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateNode {
        labels: Vec<String>,
        properties: PropertyMap,
    },
    CreateRelationship {
        relationship_type: String,
        start: EntityRef,
        end: EntityRef,
        properties: PropertyMap,
    },
    /// `null` values remove the property; absent keys are left untouched
    UpdateNode {
        id: EntityRef,
        properties: PropertyMap,
    },
    UpdateRelationship {
        id: EntityRef,
        properties: PropertyMap,
    },
    DeleteNode {
        id: EntityRef,
    },
    DeleteRelationship {
        id: EntityRef,
    },
}

impl Command {
    pub fn is_create(&self) -> bool {
        self.created_kind().is_some()
    }

    /// Kind of entity this command creates, if any
    pub fn created_kind(&self) -> Option<EntityKind> {
        match self {
            Command::CreateNode { .. } => Some(EntityKind::Node),
            Command::CreateRelationship { .. } => Some(EntityKind::Relationship),
            _ => None,
        }
    }
}

/// Ordered list of commands plus the resolved-id side table
#[derive(Debug)]
pub struct CommandBatch {
    id: u64,
    commands: Vec<Command>,
    resolved: Vec<Option<i64>>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self {
            id: NEXT_BATCH.fetch_add(1, Ordering::Relaxed),
            commands: Vec::new(),
            resolved: Vec::new(),
        }
    }

    pub fn push(&mut self, command: Command) -> CommandId {
        self.commands.push(command);
        self.resolved.push(None);
        CommandId { batch: self.id, index: self.commands.len() - 1 }
    }

    pub fn create_node<L, S>(&mut self, labels: L, properties: PropertyMap) -> CommandId
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Command::CreateNode {
            labels: labels.into_iter().map(Into::into).collect(),
            properties,
        })
    }

    pub fn create_relationship(
        &mut self,
        relationship_type: impl Into<String>,
        start: impl Into<EntityRef>,
        end: impl Into<EntityRef>,
        properties: PropertyMap,
    ) -> CommandId {
        self.push(Command::CreateRelationship {
            relationship_type: relationship_type.into(),
            start: start.into(),
            end: end.into(),
            properties,
        })
    }

    pub fn update_node(&mut self, id: impl Into<EntityRef>, properties: PropertyMap) -> CommandId {
        self.push(Command::UpdateNode { id: id.into(), properties })
    }

    pub fn update_relationship(&mut self, id: impl Into<EntityRef>, properties: PropertyMap) -> CommandId {
        self.push(Command::UpdateRelationship { id: id.into(), properties })
    }

    pub fn delete_node(&mut self, id: impl Into<EntityRef>) -> CommandId {
        self.push(Command::DeleteNode { id: id.into() })
    }

    pub fn delete_relationship(&mut self, id: impl Into<EntityRef>) -> CommandId {
        self.push(Command::DeleteRelationship { id: id.into() })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in submission order, with their ids
    pub fn commands(&self) -> impl Iterator<Item = (CommandId, &Command)> {
        let batch = self.id;
        self.commands
            .iter()
            .enumerate()
            .map(move |(index, command)| (CommandId { batch, index }, command))
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        if id.batch != self.id {
            return None;
        }
        self.commands.get(id.index)
    }

    /// Database id assigned to the entity created by `id`, once its phase ran
    pub fn id_of(&self, id: CommandId) -> Option<i64> {
        if id.batch != self.id {
            return None;
        }
        self.resolved.get(id.index).copied().flatten()
    }

    pub fn node_id(&self, id: CommandId) -> Option<NodeId> {
        match self.get(id)? {
            Command::CreateNode { .. } => self.id_of(id).map(NodeId::new),
            _ => None,
        }
    }

    pub fn relationship_id(&self, id: CommandId) -> Option<RelationshipId> {
        match self.get(id)? {
            Command::CreateRelationship { .. } => self.id_of(id).map(RelationshipId::new),
            _ => None,
        }
    }

    /// Database id behind `entity`, which must denote a `kind` entity.
    ///
    /// Plain ids are taken as given. Command ids must come from this batch,
    /// create an entity of `kind` and have run already.
    pub fn resolve(&self, entity: EntityRef, kind: EntityKind) -> OgmResult<i64> {
        let command = match entity {
            EntityRef::Id(id) => return Ok(id),
            EntityRef::Command(command) => command,
        };
        let unresolved = |reason: String| {
            OgmError::UnresolvedId(format!("{} cannot be used as a {} id: {}", command, kind, reason))
        };
        match self.get(command).map(Command::created_kind) {
            None => Err(unresolved("it belongs to another batch".to_string())),
            Some(None) => Err(unresolved("it does not create an entity".to_string())),
            Some(Some(created)) if created != kind => {
                Err(unresolved(format!("it creates a {}", created)))
            }
            Some(Some(_)) => self
                .id_of(command)
                .ok_or_else(|| unresolved("it has not run yet".to_string())),
        }
    }

    pub(crate) fn set_resolved(&mut self, id: CommandId, value: i64) {
        if let Some(slot) = self.resolved.get_mut(id.index) {
            *slot = Some(value);
        }
    }
}

impl Default for CommandBatch {
    fn default() -> Self {
        Self::new()
    }
}
