//! Phased execution of a command batch
//!
//! Commands run in a fixed phase order regardless of submission order:
//! create nodes, create relationships, update nodes, update relationships,
//! delete relationships, delete nodes. Each phase batches its commands into
//! `UNWIND` statements (one per label list or relationship type for
//! creations, one per phase otherwise). Empty phases issue nothing.

use super::command::{Command, CommandBatch, CommandId, EntityKind, EntityRef};
use crate::cypher::{kw, Fragment, Identifier, Parameter};
use crate::error::{OgmError, OgmResult};
use crate::graph::{integer_like, PropertyMap, Value};
use crate::session::{current_transaction, Row, TransactionHandle};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Execution phase, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    CreateNodes,
    CreateRelationships,
    UpdateNodes,
    UpdateRelationships,
    DeleteRelationships,
    DeleteNodes,
}

impl Phase {
    pub const ORDER: [Phase; 6] = [
        Phase::CreateNodes,
        Phase::CreateRelationships,
        Phase::UpdateNodes,
        Phase::UpdateRelationships,
        Phase::DeleteRelationships,
        Phase::DeleteNodes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::CreateNodes => "create nodes",
            Phase::CreateRelationships => "create relationships",
            Phase::UpdateNodes => "update nodes",
            Phase::UpdateRelationships => "update relationships",
            Phase::DeleteRelationships => "delete relationships",
            Phase::DeleteNodes => "delete nodes",
        }
    }

    /// Kind of entity the phase writes to
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Phase::CreateNodes | Phase::UpdateNodes | Phase::DeleteNodes => EntityKind::Node,
            _ => EntityKind::Relationship,
        }
    }

    fn of(command: &Command) -> Phase {
        match command {
            Command::CreateNode { .. } => Phase::CreateNodes,
            Command::CreateRelationship { .. } => Phase::CreateRelationships,
            Command::UpdateNode { .. } => Phase::UpdateNodes,
            Command::UpdateRelationship { .. } => Phase::UpdateRelationships,
            Command::DeleteRelationship { .. } => Phase::DeleteRelationships,
            Command::DeleteNode { .. } => Phase::DeleteNodes,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a [`run_commands`] call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub statements: usize,
    pub nodes_created: usize,
    pub relationships_created: usize,
    pub nodes_updated: usize,
    pub relationships_updated: usize,
    pub relationships_deleted: usize,
    pub nodes_deleted: usize,
}

/// Execute `batch` in `transaction`, or in the current transaction when `None`.
///
/// Ids generated by creations are written to the batch's side table
/// ([`CommandBatch::id_of`]). The first error stops the remaining phases;
/// undoing what already ran is left to the enclosing transaction.
pub async fn run_commands(
    batch: &mut CommandBatch,
    transaction: Option<&TransactionHandle>,
) -> OgmResult<RunSummary> {
    let mut summary = RunSummary::default();
    if batch.is_empty() {
        return Ok(summary);
    }
    let handle = match transaction {
        Some(handle) => handle.clone(),
        None => current_transaction()?,
    };
    let mut executor = Executor { handle, summary: &mut summary };

    for phase in Phase::ORDER {
        let members: Vec<CommandId> = batch
            .commands()
            .filter(|(_, command)| Phase::of(command) == phase)
            .map(|(id, _)| id)
            .collect();
        if members.is_empty() {
            continue;
        }
        debug!("Running {} phase with {} commands", phase, members.len());
        match phase {
            Phase::CreateNodes => executor.create_nodes(batch, &members).await?,
            Phase::CreateRelationships => executor.create_relationships(batch, &members).await?,
            Phase::UpdateNodes | Phase::UpdateRelationships => {
                executor.update(batch, phase, &members).await?
            }
            Phase::DeleteRelationships | Phase::DeleteNodes => {
                executor.delete(batch, phase, &members).await?
            }
        }
    }
    Ok(summary)
}

struct Executor<'a> {
    handle: TransactionHandle,
    summary: &'a mut RunSummary,
}

impl Executor<'_> {
    async fn run(&mut self, fragment: Fragment) -> OgmResult<Vec<Row>> {
        self.summary.statements += 1;
        self.handle.run_fragment(&fragment).await
    }

    /// One statement per distinct label list, in first-seen order
    async fn create_nodes(&mut self, batch: &mut CommandBatch, members: &[CommandId]) -> OgmResult<()> {
        let mut groups: IndexMap<Vec<String>, Vec<(CommandId, PropertyMap)>> = IndexMap::new();
        for id in members {
            if let Some(Command::CreateNode { labels, properties }) = batch.get(*id) {
                groups.entry(labels.clone()).or_default().push((*id, properties.clone()));
            }
        }

        for (labels, group) in groups {
            let rows: Vec<Value> = group.iter().map(|(_, properties)| Value::Map(properties.clone())).collect();
            let row = Identifier::new();
            let node = Identifier::new();
            let mut pattern = vec![Fragment::text("("), node.clone().into()];
            for label in &labels {
                pattern.push(Fragment::text(":"));
                pattern.push(Fragment::name(label.as_str()));
            }
            pattern.push(Fragment::text(")"));

            let statement = crate::cypher![
                kw("UNWIND"), Parameter::new(rows), kw("AS"), &row,
                kw("CREATE"), pattern,
                kw("SET"), &node, " = ", &row,
                kw("RETURN"), Fragment::call("id", &node), kw("AS"), "id"
            ];
            let returned = self.run(statement).await?;
            let ids = returned_ids(Phase::CreateNodes, group.len(), &returned)?;
            for ((id, _), value) in group.iter().zip(ids) {
                batch.set_resolved(*id, value);
            }
            self.summary.nodes_created += group.len();
        }
        Ok(())
    }

    /// One statement per relationship type; endpoints must already be resolved
    async fn create_relationships(
        &mut self,
        batch: &mut CommandBatch,
        members: &[CommandId],
    ) -> OgmResult<()> {
        let mut groups: IndexMap<String, Vec<(CommandId, Value)>> = IndexMap::new();
        for id in members {
            if let Some(Command::CreateRelationship { relationship_type, start, end, properties }) =
                batch.get(*id)
            {
                let row = crate::props! {
                    "start" => batch.resolve(*start, EntityKind::Node)?,
                    "end" => batch.resolve(*end, EntityKind::Node)?,
                    "properties" => properties.clone(),
                };
                groups.entry(relationship_type.clone()).or_default().push((*id, Value::Map(row)));
            }
        }

        for (relationship_type, group) in groups {
            let rows: Vec<Value> = group.iter().map(|(_, row)| row.clone()).collect();
            let row = Identifier::new();
            let start = Identifier::new();
            let end = Identifier::new();
            let relationship = Identifier::new();

            let statement = crate::cypher![
                kw("UNWIND"), Parameter::new(rows), kw("AS"), &row,
                kw("MATCH"), "(", &start, ")", kw("WHERE"), Fragment::call("id", &start), " = ", Fragment::property(&row, "start"),
                kw("MATCH"), "(", &end, ")", kw("WHERE"), Fragment::call("id", &end), " = ", Fragment::property(&row, "end"),
                kw("CREATE"), "(", &start, ")-[", &relationship, ":", Fragment::name(relationship_type.as_str()), "]->(", &end, ")",
                kw("SET"), &relationship, " = ", Fragment::property(&row, "properties"),
                kw("RETURN"), Fragment::call("id", &relationship), kw("AS"), "id"
            ];
            let returned = self.run(statement).await?;
            let ids = returned_ids(Phase::CreateRelationships, group.len(), &returned)?;
            for ((id, _), value) in group.iter().zip(ids) {
                batch.set_resolved(*id, value);
            }
            self.summary.relationships_created += group.len();
        }
        Ok(())
    }

    /// `SET e += row.properties`: null removes, values overwrite, absent keys stay
    async fn update(&mut self, batch: &CommandBatch, phase: Phase, members: &[CommandId]) -> OgmResult<()> {
        let mut rows = Vec::with_capacity(members.len());
        for id in members {
            let (target, properties) = match batch.get(*id) {
                Some(Command::UpdateNode { id, properties })
                | Some(Command::UpdateRelationship { id, properties }) => (*id, properties),
                _ => continue,
            };
            rows.push(Value::Map(crate::props! {
                "id" => batch.resolve(target, phase.entity_kind())?,
                "properties" => properties.clone(),
            }));
        }
        let expected = rows.len();

        let row = Identifier::new();
        let entity = Identifier::new();
        let statement = crate::cypher![
            kw("UNWIND"), Parameter::new(rows), kw("AS"), &row,
            kw("MATCH"), entity_pattern(phase, &entity),
            kw("WHERE"), Fragment::call("id", &entity), " = ", Fragment::property(&row, "id"),
            kw("SET"), &entity, " += ", Fragment::property(&row, "properties"),
            kw("RETURN"), Fragment::call("id", &entity), kw("AS"), "id"
        ];
        let returned = self.run(statement).await?;
        if returned.len() < expected {
            return Err(partial_match(phase, expected, returned.len()));
        }
        match phase {
            Phase::UpdateNodes => self.summary.nodes_updated += expected,
            _ => self.summary.relationships_updated += expected,
        }
        Ok(())
    }

    /// `id(e) IN $ids`, nodes detached first
    async fn delete(&mut self, batch: &CommandBatch, phase: Phase, members: &[CommandId]) -> OgmResult<()> {
        let mut ids: Vec<i64> = Vec::with_capacity(members.len());
        let mut seen = HashSet::new();
        for id in members {
            let target: EntityRef = match batch.get(*id) {
                Some(Command::DeleteNode { id }) | Some(Command::DeleteRelationship { id }) => *id,
                _ => continue,
            };
            let resolved = batch.resolve(target, phase.entity_kind())?;
            if seen.insert(resolved) {
                ids.push(resolved);
            }
        }
        let expected = ids.len();

        let entity = Identifier::new();
        let delete = match phase {
            Phase::DeleteNodes => crate::cypher![kw("DETACH"), kw("DELETE")],
            _ => kw("DELETE"),
        };
        let statement = crate::cypher![
            kw("MATCH"), entity_pattern(phase, &entity),
            kw("WHERE"), Fragment::call("id", &entity), kw("IN"), Parameter::new(ids),
            delete, &entity,
            kw("RETURN"), "count(*)", kw("AS"), "count"
        ];
        let returned = self.run(statement).await?;
        let matched = returned
            .first()
            .and_then(|row| row.get("count"))
            .and_then(integer_like)
            .unwrap_or(0);
        let matched = usize::try_from(matched).unwrap_or(0);
        if matched < expected {
            return Err(partial_match(phase, expected, matched));
        }
        match phase {
            Phase::DeleteNodes => self.summary.nodes_deleted += expected,
            _ => self.summary.relationships_deleted += expected,
        }
        Ok(())
    }
}

/// `(e)` for node phases, `()-[e]->()` for relationship phases
fn entity_pattern(phase: Phase, entity: &Identifier) -> Fragment {
    match phase {
        Phase::UpdateNodes | Phase::DeleteNodes | Phase::CreateNodes => crate::cypher!["(", entity, ")"],
        _ => crate::cypher!["()-[", entity, "]->()"],
    }
}

fn returned_ids(phase: Phase, expected: usize, rows: &[Row]) -> OgmResult<Vec<i64>> {
    if rows.len() < expected {
        return Err(partial_match(phase, expected, rows.len()));
    }
    rows.iter()
        .take(expected)
        .map(|row| {
            row.get("id").and_then(integer_like).ok_or_else(|| {
                OgmError::Driver(format!("{} returned a row without an integer 'id' column", phase))
            })
        })
        .collect()
}

fn partial_match(phase: Phase, expected: usize, actual: usize) -> OgmError {
    OgmError::PartialMatch { phase: phase.name(), expected, actual }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::session::{write_transaction, RecordingDriver, SessionEvent};

    fn id_rows(ids: &[i64]) -> Vec<Row> {
        ids.iter().map(|id| props! { "id" => *id }).collect()
    }

    #[tokio::test]
    async fn test_empty_batch_issues_nothing() {
        let mut batch = CommandBatch::new();
        // no transaction needed when there is nothing to run
        let summary = run_commands(&mut batch, None).await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_create_nodes_grouped_by_labels() {
        let driver = RecordingDriver::new();
        driver.respond(id_rows(&[10, 12])).respond(id_rows(&[11]));

        let mut batch = CommandBatch::new();
        let a = batch.create_node(["Person"], props! { "name" => "Alice" });
        let b = batch.create_node(["Person", "Director"], props! { "name" => "Bob" });
        let c = batch.create_node(["Person"], props! { "name" => "Carol" });

        let batch = write_transaction(&driver, |tx| async move {
            run_commands(&mut batch, Some(&tx)).await?;
            Ok(batch)
        })
        .await
        .unwrap();
        assert_eq!(batch.id_of(a), Some(10));
        assert_eq!(batch.id_of(b), Some(11));
        assert_eq!(batch.id_of(c), Some(12));

        let statements = driver.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].text,
            "UNWIND $p0 AS `v0` CREATE (`v1`:`Person`) SET `v1` = `v0` RETURN id(`v1`) AS id"
        );
        assert_eq!(
            statements[1].text,
            "UNWIND $p0 AS `v0` CREATE (`v1`:`Person`:`Director`) SET `v1` = `v0` RETURN id(`v1`) AS id"
        );
        assert_eq!(
            statements[0].parameter_rows(),
            vec![props! { "name" => "Alice" }, props! { "name" => "Carol" }]
        );
    }

    #[tokio::test]
    async fn test_phase_order_and_id_back_fill() {
        let driver = RecordingDriver::new();
        driver
            .respond(id_rows(&[1, 2]))
            .respond(id_rows(&[100]))
            .respond(id_rows(&[2]))
            .respond(vec![props! { "count" => 1i64 }]);

        let mut batch = CommandBatch::new();
        let a = batch.create_node(["Node"], props! {});
        let b = batch.create_node(["Node"], props! {});
        // submitted out of phase order on purpose
        batch.delete_node(a);
        batch.update_node(b, props! { "x" => 1i64 });
        let r = batch.create_relationship("LINK", a, b, props! { "weight" => 0.5 });

        let batch = write_transaction(&driver, |tx| async move {
            let summary = run_commands(&mut batch, Some(&tx)).await?;
            assert_eq!(summary.statements, 4);
            assert_eq!(summary.nodes_deleted, 1);
            Ok(batch)
        })
        .await
        .unwrap();

        assert_eq!(batch.relationship_id(r).map(|id| id.as_i64()), Some(100));
        let texts: Vec<String> = driver.statements().into_iter().map(|s| s.text).collect();
        assert!(texts[0].contains("CREATE (`v1`:`Node`)"));
        assert!(texts[1].contains("CREATE (`v1`)-[`v3`:`LINK`]->(`v2`)"));
        assert!(texts[2].contains("SET `v1` += `v0`.`properties`"));
        assert!(texts[3].starts_with("MATCH (`v0`) WHERE id(`v0`) IN $p0 DETACH DELETE `v0`"));

        let relationship_rows = driver.statements()[1].parameter_rows();
        assert_eq!(relationship_rows[0].get("start"), Some(&Value::Integer(1)));
        assert_eq!(relationship_rows[0].get("end"), Some(&Value::Integer(2)));
        let delete_ids = driver.statements()[3].parameters.get("p0").cloned();
        assert_eq!(delete_ids, Some(Value::from(vec![1i64])));
    }

    #[tokio::test]
    async fn test_partial_match_aborts_remaining_phases() {
        let driver = RecordingDriver::new();
        driver.respond(id_rows(&[]));

        let mut batch = CommandBatch::new();
        batch.create_relationship("LINK", 1, 999, props! {});
        batch.delete_node(1);

        let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OgmError::PartialMatch { phase: "create relationships", expected: 1, actual: 0 }
        ));
        assert_eq!(driver.statements().len(), 1);
        assert!(driver.events().contains(&SessionEvent::RolledBack));
    }

    #[tokio::test]
    async fn test_update_null_passed_through_and_row_count_checked() {
        let driver = RecordingDriver::new();
        driver.respond(id_rows(&[5]));

        let mut batch = CommandBatch::new();
        batch.update_node(5, props! { "tagline" => Value::Null, "title" => "Speed" });
        batch.update_node(6, props! { "title" => "Speed 2" });

        let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
            .await
            .unwrap_err();
        assert!(matches!(err, OgmError::PartialMatch { phase: "update nodes", expected: 2, actual: 1 }));

        let rows = driver.statements()[0].parameter_rows();
        assert_eq!(
            rows[0].get("properties"),
            Some(&Value::Map(props! { "tagline" => Value::Null, "title" => "Speed" }))
        );
    }

    #[tokio::test]
    async fn test_unresolved_reference_fails_before_running() {
        let driver = RecordingDriver::new();
        let mut other = CommandBatch::new();
        let foreign = other.create_node(["Node"], props! {});

        let mut batch = CommandBatch::new();
        batch.delete_node(foreign);
        let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
            .await
            .unwrap_err();
        assert!(matches!(err, OgmError::UnresolvedId(_)));
        assert!(driver.statements().is_empty());
    }

    #[tokio::test]
    async fn test_relationship_command_id_rejected_as_node() {
        let driver = RecordingDriver::new();
        driver.respond(id_rows(&[1, 2])).respond(id_rows(&[77]));

        let mut batch = CommandBatch::new();
        let a = batch.create_node(["Node"], props! {});
        let b = batch.create_node(["Node"], props! {});
        let link = batch.create_relationship("LINK", a, b, props! {});
        batch.delete_node(link);

        let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
            .await
            .unwrap_err();
        assert!(matches!(err, OgmError::UnresolvedId(ref m) if m.contains("it creates a relationship")));
        // the delete never reached the store
        assert_eq!(driver.statements().len(), 2);
        assert!(!driver.statements().iter().any(|s| s.text.contains("DELETE")));
    }

    #[tokio::test]
    async fn test_node_command_id_rejected_as_relationship() {
        let driver = RecordingDriver::new();
        driver.respond(id_rows(&[5]));

        let mut batch = CommandBatch::new();
        let a = batch.create_node(["Node"], props! {});
        batch.update_relationship(a, props! { "weight" => 1i64 });

        let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
            .await
            .unwrap_err();
        assert!(matches!(err, OgmError::UnresolvedId(ref m) if m.contains("relationship id: it creates a node")));
        assert_eq!(driver.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_relationship_endpoint_must_be_node() {
        let driver = RecordingDriver::new();
        driver.respond(id_rows(&[1, 2])).respond(id_rows(&[10]));

        let mut batch = CommandBatch::new();
        let a = batch.create_node(["Node"], props! {});
        let b = batch.create_node(["Node"], props! {});
        let first = batch.create_relationship("LINK", a, b, props! {});
        batch.create_relationship("LINK", first, b, props! {});

        let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
            .await
            .unwrap_err();
        assert!(matches!(err, OgmError::UnresolvedId(_)));
        assert_eq!(driver.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_uses_current_transaction() {
        let driver = RecordingDriver::new();
        driver.respond(vec![props! { "count" => 2i64 }]);

        let mut batch = CommandBatch::new();
        batch.delete_relationship(3);
        batch.delete_relationship(4);
        batch.delete_relationship(3);

        let summary = write_transaction(&driver, |_tx| async move { run_commands(&mut batch, None).await })
            .await
            .unwrap();
        assert_eq!(summary.relationships_deleted, 2);
        assert_eq!(
            driver.statements()[0].text,
            "MATCH ()-[`v0`]->() WHERE id(`v0`) IN $p0 DELETE `v0` RETURN count(*) AS count"
        );
    }

    #[tokio::test]
    async fn test_missing_transaction() {
        let mut batch = CommandBatch::new();
        batch.delete_node(1);
        let err = run_commands(&mut batch, None).await.unwrap_err();
        assert!(matches!(err, OgmError::NotInTransaction));
    }
}
