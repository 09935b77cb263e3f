//! Per-label and per-type helpers
//!
//! A [`Model`] binds a graph definition to one label: finds are compiled for
//! that label and create / update commands are checked against its declared
//! properties before they enter a batch. [`RelationshipModel`] does the same
//! for one relationship type.

use super::{FindQuery, Condition, Selection};
use crate::error::{OgmError, OgmResult};
use crate::graph::{GraphDefinition, NodeDefinition, Property, PropertyMap, RelationshipDefinition, Value};
use crate::session::TransactionHandle;
use crate::update::{CommandBatch, CommandId, EntityRef};
use indexmap::IndexMap;

impl GraphDefinition {
    /// Helper for the node type `label`
    pub fn model(&self, label: &str) -> OgmResult<Model<'_>> {
        let definition = self
            .node(label)
            .ok_or_else(|| OgmError::UnknownLabel(label.to_string()))?;
        Ok(Model { graph: self, label: label.to_string(), definition })
    }

    /// Helper for the relationship type `relationship_type`
    pub fn relationship_model(&self, relationship_type: &str) -> OgmResult<RelationshipModel<'_>> {
        let definition = self
            .relationship(relationship_type)
            .ok_or_else(|| OgmError::UnknownRelationshipType(relationship_type.to_string()))?;
        Ok(RelationshipModel { relationship_type: relationship_type.to_string(), definition })
    }
}

/// Finds and validated commands for one label
#[derive(Debug, Clone)]
pub struct Model<'g> {
    graph: &'g GraphDefinition,
    label: String,
    definition: &'g NodeDefinition,
}

impl<'g> Model<'g> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn definition(&self) -> &'g NodeDefinition {
        self.definition
    }

    pub fn compile_find(&self, selection: &Selection, condition: &Condition) -> OgmResult<FindQuery> {
        FindQuery::new(self.graph, &self.label, selection, condition)
    }

    pub async fn find(
        &self,
        selection: &Selection,
        condition: &Condition,
        transaction: Option<&TransactionHandle>,
    ) -> OgmResult<Vec<Value>> {
        self.compile_find(selection, condition)?.fetch(transaction).await
    }

    pub async fn find_one(
        &self,
        selection: &Selection,
        condition: &Condition,
        transaction: Option<&TransactionHandle>,
    ) -> OgmResult<Option<Value>> {
        let query = self.compile_find(selection, condition)?.first();
        Ok(query.fetch(transaction).await?.into_iter().next())
    }

    /// Queue a node creation; every non-nullable property must be present
    pub fn create(&self, batch: &mut CommandBatch, properties: PropertyMap) -> OgmResult<CommandId> {
        let owner = format!("node '{}'", self.label);
        let properties = checked_for_create(&owner, &self.definition.properties, properties)?;
        Ok(batch.create_node([self.label.as_str()], properties))
    }

    /// Queue a partial update; `null` removes a nullable property
    pub fn update(
        &self,
        batch: &mut CommandBatch,
        id: impl Into<EntityRef>,
        properties: PropertyMap,
    ) -> OgmResult<CommandId> {
        let owner = format!("node '{}'", self.label);
        let properties = checked_for_update(&owner, &self.definition.properties, properties)?;
        Ok(batch.update_node(id, properties))
    }

    pub fn delete(&self, batch: &mut CommandBatch, id: impl Into<EntityRef>) -> CommandId {
        batch.delete_node(id)
    }
}

/// Validated commands for one relationship type
#[derive(Debug, Clone)]
pub struct RelationshipModel<'g> {
    relationship_type: String,
    definition: &'g RelationshipDefinition,
}

impl<'g> RelationshipModel<'g> {
    pub fn relationship_type(&self) -> &str {
        &self.relationship_type
    }

    pub fn definition(&self) -> &'g RelationshipDefinition {
        self.definition
    }

    pub fn create(
        &self,
        batch: &mut CommandBatch,
        start: impl Into<EntityRef>,
        end: impl Into<EntityRef>,
        properties: PropertyMap,
    ) -> OgmResult<CommandId> {
        let owner = format!("relationship '{}'", self.relationship_type);
        let properties = checked_for_create(&owner, &self.definition.properties, properties)?;
        Ok(batch.create_relationship(self.relationship_type.as_str(), start, end, properties))
    }

    pub fn update(
        &self,
        batch: &mut CommandBatch,
        id: impl Into<EntityRef>,
        properties: PropertyMap,
    ) -> OgmResult<CommandId> {
        let owner = format!("relationship '{}'", self.relationship_type);
        let properties = checked_for_update(&owner, &self.definition.properties, properties)?;
        Ok(batch.update_relationship(id, properties))
    }

    pub fn delete(&self, batch: &mut CommandBatch, id: impl Into<EntityRef>) -> CommandId {
        batch.delete_relationship(id)
    }
}

fn undeclared(owner: &str, name: &str) -> OgmError {
    OgmError::InvalidValue(format!("{} has no property '{}'", owner, name))
}

/// Coerced properties in declaration order; nulls and absent nullable
/// properties are left out
fn checked_for_create(
    owner: &str,
    declared: &IndexMap<String, Property>,
    mut properties: PropertyMap,
) -> OgmResult<PropertyMap> {
    if let Some(name) = properties.keys().find(|name| !declared.contains_key(name.as_str())) {
        return Err(undeclared(owner, name));
    }
    let mut checked = PropertyMap::with_capacity(properties.len());
    for (name, property) in declared {
        match properties.shift_remove(name) {
            Some(Value::Null) | None if property.nullable => {}
            Some(value) => {
                let value = property
                    .coerce(value)
                    .map_err(|e| OgmError::InvalidValue(format!("{}.{}: {}", owner, name, e)))?;
                checked.insert(name.clone(), value);
            }
            None => {
                return Err(OgmError::InvalidValue(format!(
                    "{}.{} ({}) is required",
                    owner, name, property
                )))
            }
        }
    }
    Ok(checked)
}

/// Coerced properties in the caller's order; `null` only for nullable ones
fn checked_for_update(
    owner: &str,
    declared: &IndexMap<String, Property>,
    properties: PropertyMap,
) -> OgmResult<PropertyMap> {
    properties
        .into_iter()
        .map(|(name, value)| {
            let property = declared.get(&name).ok_or_else(|| undeclared(owner, &name))?;
            let value = property
                .coerce(value)
                .map_err(|e| OgmError::InvalidValue(format!("{}.{}: {}", owner, name, e)))?;
            Ok::<_, OgmError>((name, value))
        })
        .collect()
}
