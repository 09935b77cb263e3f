//! Declarative conditions and their compilation to Cypher boolean expressions
//!
//! A [`Condition`] is a list of terms over one entity namespace (a node, or
//! a node plus the relationship that reached it). Terms are combined with AND
//! by default; `$any` switches a nested group to OR and `$not` negates a
//! nested conjunction. Property terms carry a [`PropertyCondition`] with the
//! comparison operators and the same combinators.
//!
//! The `$`-prefixed keys of the document form are parsed once into these
//! enums; compilation only matches on variants.

use crate::cypher::{kw, Fragment, Identifier, Parameter};
use crate::error::{OgmError, OgmResult};
use crate::graph::{NodeDefinition, Property, PropertyType, RelationshipDefinition, Value};

/// How sibling sub-expressions are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    Any,
}

/// Comparison operator of a leaf predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "=" => Some(Comparison::Eq),
            "<" => Some(Comparison::Lt),
            ">" => Some(Comparison::Gt),
            "<=" => Some(Comparison::Le),
            ">=" => Some(Comparison::Ge),
            _ => None,
        }
    }
}

/// One predicate on a property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyPredicate {
    Compare(Comparison, Value),
    /// Substring for strings, membership for array properties
    Contains(Value),
    StartsWith(Value),
    EndsWith(Value),
    /// `true` for IS NULL, `false` for IS NOT NULL
    Null(bool),
    All(PropertyCondition),
    Any(PropertyCondition),
    Not(PropertyCondition),
}

/// Conjunction of predicates on a single property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyCondition {
    predicates: Vec<PropertyPredicate>,
}

impl PropertyCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: PropertyPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// AND the predicates of `other` into this condition
    pub fn merge(mut self, other: PropertyCondition) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    pub fn eq(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::Compare(Comparison::Eq, value.into()))
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::Compare(Comparison::Lt, value.into()))
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::Compare(Comparison::Gt, value.into()))
    }

    pub fn le(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::Compare(Comparison::Le, value.into()))
    }

    pub fn ge(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::Compare(Comparison::Ge, value.into()))
    }

    pub fn contains(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::Contains(value.into()))
    }

    pub fn starts_with(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::StartsWith(value.into()))
    }

    pub fn ends_with(value: impl Into<Value>) -> Self {
        Self::new().with(PropertyPredicate::EndsWith(value.into()))
    }

    pub fn is_null() -> Self {
        Self::new().with(PropertyPredicate::Null(true))
    }

    pub fn is_not_null() -> Self {
        Self::new().with(PropertyPredicate::Null(false))
    }

    /// Add an OR group
    pub fn any(self, group: PropertyCondition) -> Self {
        self.with(PropertyPredicate::Any(group))
    }

    /// Add an explicit AND group
    pub fn all(self, group: PropertyCondition) -> Self {
        self.with(PropertyPredicate::All(group))
    }

    /// Add a negated AND group
    pub fn not(self, group: PropertyCondition) -> Self {
        self.with(PropertyPredicate::Not(group))
    }

    pub fn predicates(&self) -> &[PropertyPredicate] {
        &self.predicates
    }

    /// Parse the document form: an operator object, or a bare value meaning `=`
    /// (`null` meaning IS NULL).
    pub fn from_json(json: &serde_json::Value) -> OgmResult<Self> {
        let object = match json {
            serde_json::Value::Object(object) => object,
            serde_json::Value::Null => return Ok(Self::is_null()),
            other => return Ok(Self::eq(Value::from_json(other))),
        };

        let mut condition = Self::new();
        for (key, value) in object {
            let predicate = match key.as_str() {
                "$all" => PropertyPredicate::All(Self::group_from_json(value)?),
                "$any" => PropertyPredicate::Any(Self::group_from_json(value)?),
                "$not" => PropertyPredicate::Not(Self::from_json(value)?),
                "contains" => PropertyPredicate::Contains(Value::from_json(value)),
                "startsWith" => PropertyPredicate::StartsWith(Value::from_json(value)),
                "endsWith" => PropertyPredicate::EndsWith(Value::from_json(value)),
                "null" => match value {
                    serde_json::Value::Bool(b) => PropertyPredicate::Null(*b),
                    _ => {
                        return Err(OgmError::InvalidCondition(
                            "'null' expects true or false".to_string(),
                        ))
                    }
                },
                op => match Comparison::from_key(op) {
                    Some(comparison) => PropertyPredicate::Compare(comparison, Value::from_json(value)),
                    None => {
                        return Err(OgmError::InvalidCondition(format!("unknown operator '{}'", op)))
                    }
                },
            };
            condition.predicates.push(predicate);
        }
        Ok(condition)
    }

    /// A group is one object, or a list of objects each ANDed internally
    fn group_from_json(json: &serde_json::Value) -> OgmResult<Self> {
        match json {
            serde_json::Value::Array(items) => {
                let mut group = Self::new();
                for item in items {
                    group.predicates.push(PropertyPredicate::All(Self::from_json(item)?));
                }
                Ok(group)
            }
            other => Self::from_json(other),
        }
    }
}

/// Identity match: one id or membership in a list
#[derive(Debug, Clone, PartialEq)]
pub enum IdMatch {
    One(i64),
    Many(Vec<i64>),
}

impl From<i64> for IdMatch {
    fn from(id: i64) -> Self {
        IdMatch::One(id)
    }
}

impl From<Vec<i64>> for IdMatch {
    fn from(ids: Vec<i64>) -> Self {
        IdMatch::Many(ids)
    }
}

impl IdMatch {
    fn from_json(json: &serde_json::Value) -> OgmResult<Self> {
        let invalid = || OgmError::InvalidCondition(format!("expected an id or a list of ids, got {}", json));
        match json {
            serde_json::Value::Number(n) => n.as_i64().map(IdMatch::One).ok_or_else(invalid),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_i64().ok_or_else(invalid))
                .collect::<OgmResult<Vec<_>>>()
                .map(IdMatch::Many),
            _ => Err(invalid()),
        }
    }
}

/// One term of an entity-level condition
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Property(String, PropertyCondition),
    /// `$id`: identity of the node
    Id(IdMatch),
    /// `$rid`: identity of the relationship that reached the node
    RelationshipId(IdMatch),
    All(Condition),
    Any(Condition),
    Not(Condition),
}

/// Entity-level condition; terms are ANDed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    terms: Vec<Term>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn with(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn property(self, name: impl Into<String>, condition: PropertyCondition) -> Self {
        self.with(Term::Property(name.into(), condition))
    }

    /// Shorthand for `property(name, PropertyCondition::eq(value))`
    pub fn eq(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.property(name, PropertyCondition::eq(value))
    }

    pub fn id(self, ids: impl Into<IdMatch>) -> Self {
        self.with(Term::Id(ids.into()))
    }

    pub fn relationship_id(self, ids: impl Into<IdMatch>) -> Self {
        self.with(Term::RelationshipId(ids.into()))
    }

    /// Add an OR group over the terms of `group`
    pub fn any(self, group: Condition) -> Self {
        self.with(Term::Any(group))
    }

    /// Add an explicit AND group
    pub fn all(self, group: Condition) -> Self {
        self.with(Term::All(group))
    }

    /// Add a negated AND group
    pub fn not(self, group: Condition) -> Self {
        self.with(Term::Not(group))
    }

    /// Parse the document form, e.g.
    /// `{"title": {"startsWith": "The"}, "$any": {"released": {">": 2000}, "$id": [1, 2]}}`.
    pub fn from_json(json: &serde_json::Value) -> OgmResult<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| OgmError::InvalidCondition(format!("expected an object, got {}", json)))?;

        let mut condition = Self::new();
        for (key, value) in object {
            let term = match key.as_str() {
                "$all" => Term::All(Self::group_from_json(value)?),
                "$any" => Term::Any(Self::group_from_json(value)?),
                "$not" => Term::Not(Self::from_json(value)?),
                "$id" => Term::Id(IdMatch::from_json(value)?),
                "$rid" => Term::RelationshipId(IdMatch::from_json(value)?),
                reserved if reserved.starts_with('$') => {
                    return Err(OgmError::InvalidCondition(format!("unknown key '{}'", reserved)))
                }
                name => Term::Property(name.to_string(), PropertyCondition::from_json(value)?),
            };
            condition.terms.push(term);
        }
        Ok(condition)
    }

    fn group_from_json(json: &serde_json::Value) -> OgmResult<Self> {
        match json {
            serde_json::Value::Array(items) => {
                let mut group = Self::new();
                for item in items {
                    group.terms.push(Term::All(Self::from_json(item)?));
                }
                Ok(group)
            }
            other => Self::from_json(other),
        }
    }
}

/// Variables and declarations a condition is compiled against
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub node: &'a Identifier,
    pub node_definition: &'a NodeDefinition,
    pub relationship: Option<(&'a Identifier, &'a RelationshipDefinition)>,
}

impl<'a> Scope<'a> {
    pub fn node(node: &'a Identifier, node_definition: &'a NodeDefinition) -> Self {
        Self { node, node_definition, relationship: None }
    }

    pub fn with_relationship(
        mut self,
        relationship: &'a Identifier,
        relationship_definition: &'a RelationshipDefinition,
    ) -> Self {
        self.relationship = Some((relationship, relationship_definition));
        self
    }

    /// Node properties shadow relationship properties of the same name.
    fn resolve(&self, name: &str) -> OgmResult<(&'a Identifier, &'a Property)> {
        if let Some(property) = self.node_definition.get_property(name) {
            return Ok((self.node, property));
        }
        if let Some((variable, definition)) = self.relationship {
            if let Some(property) = definition.get_property(name) {
                return Ok((variable, property));
            }
        }
        Err(OgmError::InvalidCondition(format!("unknown property '{}'", name)))
    }
}

/// Compile `condition` joined by `mode`. `None` means "no filter": the caller
/// leaves out the WHERE clause entirely.
pub fn compile_condition(
    mode: Mode,
    condition: &Condition,
    scope: &Scope<'_>,
) -> OgmResult<Option<Fragment>> {
    let mut parts = Vec::with_capacity(condition.terms.len());
    for term in &condition.terms {
        let part = match term {
            Term::All(group) => compile_condition(Mode::All, group, scope)?,
            Term::Any(group) => compile_condition(Mode::Any, group, scope)?,
            Term::Not(group) => compile_condition(Mode::All, group, scope)?.map(negate),
            Term::Id(ids) => Some(compile_id(scope.node, ids)),
            Term::RelationshipId(ids) => {
                let (relationship, _) = scope.relationship.ok_or_else(|| {
                    OgmError::InvalidCondition("'$rid' used where no relationship is in scope".to_string())
                })?;
                Some(compile_id(relationship, ids))
            }
            Term::Property(name, property_condition) => {
                let (variable, property) = scope.resolve(name)?;
                let target = PropertyTarget { variable, name, property };
                compile_property(Mode::All, property_condition, &target)?
            }
        };
        parts.extend(part);
    }
    Ok(combine(mode, parts))
}

struct PropertyTarget<'a> {
    variable: &'a Identifier,
    name: &'a str,
    property: &'a Property,
}

impl PropertyTarget<'_> {
    fn access(&self) -> Fragment {
        Fragment::property(self.variable, self.name)
    }

    fn invalid(&self, message: impl std::fmt::Display) -> OgmError {
        OgmError::InvalidCondition(format!("property '{}' ({}): {}", self.name, self.property, message))
    }

    fn coerce(&self, value: &Value) -> OgmResult<Value> {
        if value.is_null() {
            return Err(self.invalid("compare against null with the 'null' operator"));
        }
        self.property.coerce(value.clone()).map_err(|e| self.invalid(e))
    }

    fn coerce_string(&self, value: &Value, operator: &str) -> OgmResult<Value> {
        if self.property.property_type != PropertyType::String || self.property.array {
            return Err(self.invalid(format!("'{}' needs a string property", operator)));
        }
        self.coerce(value)
    }
}

fn compile_property(
    mode: Mode,
    condition: &PropertyCondition,
    target: &PropertyTarget<'_>,
) -> OgmResult<Option<Fragment>> {
    let mut parts = Vec::with_capacity(condition.predicates.len());
    for predicate in &condition.predicates {
        let part = match predicate {
            PropertyPredicate::All(group) => compile_property(Mode::All, group, target)?,
            PropertyPredicate::Any(group) => compile_property(Mode::Any, group, target)?,
            PropertyPredicate::Not(group) => compile_property(Mode::All, group, target)?.map(negate),
            PropertyPredicate::Compare(comparison, value) => {
                if *comparison != Comparison::Eq
                    && (target.property.array || !target.property.property_type.is_ordered())
                {
                    return Err(target.invalid(format!("'{}' needs an ordered property", comparison.symbol())));
                }
                let value = target.coerce(value)?;
                Some(crate::cypher![
                    target.access(),
                    format!(" {} ", comparison.symbol()),
                    Parameter::new(value)
                ])
            }
            PropertyPredicate::Contains(value) if target.property.array => {
                if value.is_null() {
                    return Err(target.invalid("array membership of null is never true"));
                }
                let element = target
                    .property
                    .coerce_element(value.clone())
                    .map_err(|e| target.invalid(e))?;
                Some(crate::cypher![Parameter::new(element), kw("IN"), target.access()])
            }
            PropertyPredicate::Contains(value) => {
                let value = target.coerce_string(value, "contains")?;
                Some(crate::cypher![target.access(), kw("CONTAINS"), Parameter::new(value)])
            }
            PropertyPredicate::StartsWith(value) => {
                let value = target.coerce_string(value, "startsWith")?;
                Some(crate::cypher![target.access(), kw("STARTS"), kw("WITH"), Parameter::new(value)])
            }
            PropertyPredicate::EndsWith(value) => {
                let value = target.coerce_string(value, "endsWith")?;
                Some(crate::cypher![target.access(), kw("ENDS"), kw("WITH"), Parameter::new(value)])
            }
            PropertyPredicate::Null(is_null) => {
                if !target.property.nullable {
                    return Err(target.invalid("'null' needs a nullable property"));
                }
                if *is_null {
                    Some(crate::cypher![target.access(), kw("IS"), kw("NULL")])
                } else {
                    Some(crate::cypher![target.access(), kw("IS"), kw("NOT"), kw("NULL")])
                }
            }
        };
        parts.extend(part);
    }
    Ok(combine(mode, parts))
}

fn compile_id(variable: &Identifier, ids: &IdMatch) -> Fragment {
    let id = Fragment::call("id", variable);
    match ids {
        IdMatch::One(id_value) => crate::cypher![id, " = ", Parameter::new(*id_value)],
        IdMatch::Many(id_values) => {
            crate::cypher![id, kw("IN"), Parameter::new(Value::from(id_values.clone()))]
        }
    }
}

/// A lone sub-expression is returned as is; the parent parenthesizes it when
/// it joins or negates.
fn combine(mode: Mode, mut parts: Vec<Fragment>) -> Option<Fragment> {
    if parts.len() <= 1 {
        return parts.pop();
    }
    let joiner = match mode {
        Mode::All => kw("AND"),
        Mode::Any => kw("OR"),
    };
    Some(Fragment::join(parts.into_iter().map(Fragment::parenthesized), joiner))
}

fn negate(inner: Fragment) -> Fragment {
    crate::cypher![kw("NOT"), Fragment::parenthesized(inner)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cypher::Statement;
    use crate::graph::Property;
    use serde_json::json;

    fn person() -> NodeDefinition {
        NodeDefinition::new()
            .property("name", Property::string())
            .property("born", Property::number().nullable())
            .property("nicknames", Property::string().array())
            .property("active", Property::boolean())
    }

    fn acted_in() -> RelationshipDefinition {
        RelationshipDefinition::new()
            .property("roles", Property::string().array())
            .property("name", Property::number())
    }

    fn render(condition: &Condition) -> OgmResult<Option<Statement>> {
        let node = Identifier::new();
        let definition = person();
        let scope = Scope::node(&node, &definition);
        Ok(compile_condition(Mode::All, condition, &scope)?.map(|f| Statement::build(&f)))
    }

    #[test]
    fn test_empty_condition_is_no_filter() {
        assert_eq!(render(&Condition::new()).unwrap(), None);
        assert_eq!(render(&Condition::new().not(Condition::new())).unwrap(), None);
        assert_eq!(
            render(&Condition::new().property("name", PropertyCondition::new())).unwrap(),
            None
        );
    }

    #[test]
    fn test_simple_conjunction() {
        let condition = Condition::new()
            .eq("name", "Keanu Reeves")
            .property("born", PropertyCondition::gt(1960).merge(PropertyCondition::le(1970)));
        let statement = render(&condition).unwrap().unwrap();
        assert_eq!(
            statement.text,
            "(`v0`.`name` = $p0) AND ((`v0`.`born` > $p1) AND (`v0`.`born` <= $p2))"
        );
        assert_eq!(statement.parameter("p0"), Some(&Value::from("Keanu Reeves")));
        assert_eq!(statement.parameter("p2"), Some(&Value::Integer(1970)));
    }

    #[test]
    fn test_any_and_not() {
        let condition = Condition::new().any(
            Condition::new()
                .eq("name", "Carrie")
                .not(Condition::new().eq("active", true)),
        );
        let statement = render(&condition).unwrap().unwrap();
        assert_eq!(
            statement.text,
            "(`v0`.`name` = $p0) OR (NOT (`v0`.`active` = $p1))"
        );
    }

    #[test]
    fn test_double_negation_wraps_twice() {
        let inner = Condition::new().eq("name", "Neo");
        let doubled = Condition::new().not(Condition::new().not(inner.clone()));
        let statement = render(&doubled).unwrap().unwrap();
        assert_eq!(statement.text, "NOT (NOT (`v0`.`name` = $p0))");
        assert_eq!(statement.parameters, render(&inner).unwrap().unwrap().parameters);
    }

    #[test]
    fn test_string_and_array_predicates() {
        let condition = Condition::new()
            .property("name", PropertyCondition::starts_with("Ke").merge(PropertyCondition::ends_with("es")))
            .property("nicknames", PropertyCondition::contains("The One"));
        let statement = render(&condition).unwrap().unwrap();
        assert_eq!(
            statement.text,
            "((`v0`.`name` STARTS WITH $p0) AND (`v0`.`name` ENDS WITH $p1)) AND ($p2 IN `v0`.`nicknames`)"
        );
    }

    #[test]
    fn test_null_checks() {
        let statement = render(&Condition::new().property("born", PropertyCondition::is_not_null()))
            .unwrap()
            .unwrap();
        assert_eq!(statement.text, "`v0`.`born` IS NOT NULL");

        let err = render(&Condition::new().property("name", PropertyCondition::is_null())).unwrap_err();
        assert!(matches!(err, OgmError::InvalidCondition(_)));
    }

    #[test]
    fn test_null_check_inside_group() {
        let condition = Condition::new()
            .property("born", PropertyCondition::is_null())
            .eq("name", "Neo");
        let statement = render(&condition).unwrap().unwrap();
        assert_eq!(statement.text, "(`v0`.`born` IS NULL) AND (`v0`.`name` = $p0)");

        let negated = Condition::new().not(Condition::new().property("born", PropertyCondition::is_not_null()));
        let statement = render(&negated).unwrap().unwrap();
        assert_eq!(statement.text, "NOT (`v0`.`born` IS NOT NULL)");
    }

    #[test]
    fn test_identity_terms() {
        let statement = render(&Condition::new().id(vec![1, 2, 3])).unwrap().unwrap();
        assert_eq!(statement.text, "id(`v0`) IN $p0");
        assert_eq!(statement.parameter("p0"), Some(&Value::from(vec![1i64, 2, 3])));

        let err = render(&Condition::new().relationship_id(4)).unwrap_err();
        assert!(matches!(err, OgmError::InvalidCondition(_)));
    }

    #[test]
    fn test_invalid_operators() {
        assert!(render(&Condition::new().property("active", PropertyCondition::gt(true))).is_err());
        assert!(render(&Condition::new().property("born", PropertyCondition::contains("1"))).is_err());
        assert!(render(&Condition::new().eq("name", 42)).is_err());
        assert!(render(&Condition::new().eq("missing", 1)).is_err());
        assert!(render(&Condition::new().eq("name", Value::Null)).is_err());
    }

    #[test]
    fn test_relationship_scope() {
        let node = Identifier::new();
        let relationship = Identifier::new();
        let node_definition = person();
        let relationship_definition = acted_in();
        let scope = Scope::node(&node, &node_definition)
            .with_relationship(&relationship, &relationship_definition);

        let condition = Condition::new()
            .property("roles", PropertyCondition::contains("Neo"))
            .eq("name", "Keanu")
            .relationship_id(7);
        let fragment = compile_condition(Mode::All, &condition, &scope).unwrap().unwrap();
        let statement = Statement::build(&fragment);
        // relationship visited first; `name` resolves to the node, not the relationship
        assert_eq!(
            statement.text,
            "($p0 IN `v0`.`roles`) AND (`v1`.`name` = $p1) AND (id(`v0`) = $p2)"
        );
    }

    #[test]
    fn test_from_json() {
        let condition = Condition::from_json(&json!({
            "name": "Tom Hanks",
            "born": {">=": 1950, "$not": {"=": 1956}},
            "$any": [{"active": true}, {"$id": [1, 2]}]
        }))
        .unwrap();

        let expected = Condition::new()
            .eq("name", "Tom Hanks")
            .property(
                "born",
                PropertyCondition::ge(1950).not(PropertyCondition::eq(1956)),
            )
            .any(
                Condition::new()
                    .all(Condition::new().eq("active", true))
                    .all(Condition::new().id(vec![1, 2])),
            );
        assert_eq!(condition, expected);

        assert!(Condition::from_json(&json!({"$none": {}})).is_err());
        assert!(Condition::from_json(&json!({"born": {"~": 1}})).is_err());
        assert!(Condition::from_json(&json!([1])).is_err());
    }

    #[test]
    fn test_durations_compare_only_for_equality() {
        let node = Identifier::new();
        let definition = NodeDefinition::new().property("runtime", Property::duration());
        let scope = Scope::node(&node, &definition);

        let ordered = Condition::new().property("runtime", PropertyCondition::lt("PT2H"));
        let err = compile_condition(Mode::All, &ordered, &scope).unwrap_err();
        assert!(matches!(err, OgmError::InvalidCondition(ref message) if message.contains("'<'")));

        let equal = Condition::new().eq("runtime", "PT2H");
        let fragment = compile_condition(Mode::All, &equal, &scope).unwrap().unwrap();
        let statement = Statement::build(&fragment);
        assert_eq!(statement.text, "`v0`.`runtime` = $p0");
        assert_eq!(statement.parameter("p0").map(Value::type_name), Some("Duration"));
    }

    #[test]
    fn test_temporal_values_coerced_from_strings() {
        let node = Identifier::new();
        let definition = NodeDefinition::new().property("released", Property::date());
        let scope = Scope::node(&node, &definition);
        let condition = Condition::from_json(&json!({"released": {"<": "2000-01-01"}})).unwrap();
        let fragment = compile_condition(Mode::All, &condition, &scope).unwrap().unwrap();
        let statement = Statement::build(&fragment);
        assert_eq!(statement.parameter("p0").map(Value::type_name), Some("Date"));
    }
}
