//! Selection trees and their compilation to nested map projections
//!
//! A [`Selection`] names the references to follow from a node type, each with
//! its own nested selection and optional `$where` condition. Compiling it
//! walks the schema once and yields both the Cypher map expression and the
//! [`ResultShape`] that validates what the server sends back.

use super::condition::{compile_condition, Condition, Mode, Scope};
use super::shape::ResultShape;
use crate::cypher::{kw, Fragment, Identifier};
use crate::error::{OgmError, OgmResult};
use crate::graph::{Direction, GraphDefinition, Multiplicity, NodeDefinition, RelationshipDefinition};
use indexmap::IndexMap;

/// Synthetic field holding the node identity
pub const ID_FIELD: &str = "$id";
/// Synthetic field holding the identity of the relationship that was followed
pub const RELATIONSHIP_ID_FIELD: &str = "$rid";
/// Key of a per-reference condition in the document form
pub const WHERE_KEY: &str = "$where";

/// References to follow from one node type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    references: IndexMap<String, ReferenceSelection>,
}

/// One followed reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSelection {
    pub selection: Selection,
    pub condition: Option<Condition>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn references(&self) -> impl Iterator<Item = (&str, &ReferenceSelection)> {
        self.references.iter().map(|(name, reference)| (name.as_str(), reference))
    }

    /// Follow `reference`, selecting `nested` on the target
    pub fn follow(mut self, reference: impl Into<String>, nested: Selection) -> Self {
        self.references
            .insert(reference.into(), ReferenceSelection { selection: nested, condition: None });
        self
    }

    /// Follow `reference`, keeping only targets matching `condition`
    pub fn follow_where(
        mut self,
        reference: impl Into<String>,
        nested: Selection,
        condition: Condition,
    ) -> Self {
        self.references.insert(
            reference.into(),
            ReferenceSelection { selection: nested, condition: Some(condition) },
        );
        self
    }

    /// Parse the document form: `{"actors": {"moviesActedIn": {}, "$where": {...}}}`.
    /// `true` is accepted as an empty nested selection.
    pub fn from_json(json: &serde_json::Value) -> OgmResult<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| OgmError::InvalidSelection(format!("expected an object, got {}", json)))?;

        let mut selection = Self::new();
        for (name, value) in object {
            if name.starts_with('$') {
                return Err(OgmError::InvalidSelection(format!("unknown key '{}'", name)));
            }
            let reference = match value {
                serde_json::Value::Bool(true) => ReferenceSelection::default(),
                serde_json::Value::Object(fields) => {
                    let condition = fields.get(WHERE_KEY).map(Condition::from_json).transpose()?;
                    let nested: serde_json::Map<String, serde_json::Value> = fields
                        .iter()
                        .filter(|(key, _)| key.as_str() != WHERE_KEY)
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect();
                    ReferenceSelection {
                        selection: Self::from_json(&serde_json::Value::Object(nested))?,
                        condition,
                    }
                }
                other => {
                    return Err(OgmError::InvalidSelection(format!(
                        "reference '{}' expects an object, got {}",
                        name, other
                    )))
                }
            };
            selection.references.insert(name.clone(), reference);
        }
        Ok(selection)
    }
}

/// Compile the map returned for each root node of `label`.
///
/// Root maps carry the declared properties, the followed references and
/// `$id`. The shape is built in the same walk as the fragment.
pub fn compile_selection(
    graph: &GraphDefinition,
    label: &str,
    selection: &Selection,
    root: &Identifier,
) -> OgmResult<(Fragment, ResultShape)> {
    let definition = graph
        .node(label)
        .ok_or_else(|| OgmError::UnknownLabel(label.to_string()))?;
    compile_map(graph, label, definition, root, None, selection)
}

fn compile_map(
    graph: &GraphDefinition,
    label: &str,
    definition: &NodeDefinition,
    node: &Identifier,
    relationship: Option<(&Identifier, &RelationshipDefinition)>,
    selection: &Selection,
) -> OgmResult<(Fragment, ResultShape)> {
    let mut fields: IndexMap<String, (Fragment, ResultShape)> = IndexMap::new();

    if let Some((variable, relationship_definition)) = relationship {
        for (name, property) in &relationship_definition.properties {
            fields.insert(
                name.clone(),
                (Fragment::property(variable, name.as_str()), ResultShape::Property(*property)),
            );
        }
    }
    for (name, property) in &definition.properties {
        fields.insert(
            name.clone(),
            (Fragment::property(node, name.as_str()), ResultShape::Property(*property)),
        );
    }
    for (name, followed) in selection.references() {
        if definition.get_property(name).is_some() {
            return Err(OgmError::InvalidSelection(format!(
                "'{}' on '{}' is a property, not a reference",
                name, label
            )));
        }
        fields.insert(name.to_string(), compile_traversal(graph, label, definition, node, name, followed)?);
    }
    fields.insert(ID_FIELD.to_string(), (Fragment::call("id", node), ResultShape::Identity));
    if let Some((variable, _)) = relationship {
        fields.insert(
            RELATIONSHIP_ID_FIELD.to_string(),
            (Fragment::call("id", variable), ResultShape::Identity),
        );
    }

    let mut entries = Vec::with_capacity(fields.len());
    let mut shapes = IndexMap::with_capacity(fields.len());
    for (name, (fragment, shape)) in fields {
        entries.push((name.clone(), fragment));
        shapes.insert(name, shape);
    }
    Ok((Fragment::Map(entries), ResultShape::Object(shapes)))
}

/// `[(src)-[rel:TYPE]->(dst:Label) WHERE ... | {...}]`, indexed with `[0]`
/// unless the reference is a list
fn compile_traversal(
    graph: &GraphDefinition,
    label: &str,
    definition: &NodeDefinition,
    source: &Identifier,
    name: &str,
    followed: &ReferenceSelection,
) -> OgmResult<(Fragment, ResultShape)> {
    let reference = definition.get_reference(name).ok_or_else(|| {
        OgmError::InvalidSelection(format!("'{}' has no reference named '{}'", label, name))
    })?;
    let target = graph
        .node(&reference.label)
        .ok_or_else(|| OgmError::UnknownLabel(reference.label.clone()))?;
    let relationship_definition = graph
        .relationship(&reference.relationship_type)
        .ok_or_else(|| OgmError::UnknownRelationshipType(reference.relationship_type.clone()))?;

    let relationship = Identifier::new();
    let node = Identifier::new();
    let (left, right) = match reference.direction {
        Direction::Outgoing => ("-", "->"),
        Direction::Incoming => ("<-", "-"),
        Direction::Undirected => ("-", "-"),
    };

    let filter = match &followed.condition {
        Some(condition) => {
            let scope = Scope::node(&node, target).with_relationship(&relationship, relationship_definition);
            compile_condition(Mode::All, condition, &scope)?
        }
        None => None,
    };
    let (map, shape) = compile_map(
        graph,
        &reference.label,
        target,
        &node,
        Some((&relationship, relationship_definition)),
        &followed.selection,
    )?;

    let mut comprehension = vec![
        Fragment::text("[("),
        source.into(),
        Fragment::text(")"),
        Fragment::text(left),
        Fragment::text("["),
        relationship.into(),
        Fragment::text(":"),
        Fragment::name(reference.relationship_type.as_str()),
        Fragment::text("]"),
        Fragment::text(right),
        Fragment::text("("),
        node.into(),
        Fragment::text(":"),
        Fragment::name(reference.label.as_str()),
        Fragment::text(")"),
    ];
    if let Some(filter) = filter {
        comprehension.push(kw("WHERE"));
        comprehension.push(filter);
    }
    comprehension.push(Fragment::text(" | "));
    comprehension.push(map);
    comprehension.push(Fragment::text("]"));

    let shape = match reference.multiplicity {
        Multiplicity::Many => ResultShape::list(shape),
        Multiplicity::Optional => ResultShape::optional(shape),
        Multiplicity::One => shape,
    };
    if !reference.multiplicity.is_list() {
        comprehension.push(Fragment::text("[0]"));
    }
    Ok((Fragment::Seq(comprehension), shape))
}
