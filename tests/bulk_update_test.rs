//! Integration tests for bulk command execution
//!
//! Commands are queued in arbitrary order and must run in phase order, with
//! ids created earlier in the batch visible to later phases.

use togm::session::{write_transaction, RecordingDriver, SessionEvent};
use togm::{props, run_commands, CommandBatch, OgmError, Row, Value};

fn ids(ids: &[i64]) -> Vec<Row> {
    ids.iter().map(|id| props! { "id" => *id }).collect()
}

fn count(n: i64) -> Vec<Row> {
    vec![props! { "count" => n }]
}

#[tokio::test]
async fn test_phase_order_ignores_submission_order() {
    let driver = RecordingDriver::new();
    driver
        .respond(ids(&[1, 2]))
        .respond(ids(&[50]))
        .respond(ids(&[2]))
        .respond(count(1));

    let mut batch = CommandBatch::new();
    let a = batch.create_node(["Person"], props! { "name" => "A" });
    let b = batch.create_node(["Person"], props! { "name" => "B" });
    batch.create_relationship("KNOWS", a, b, props! {});
    batch.update_node(b, props! { "x" => 1i64 });
    batch.delete_node(a);

    let summary = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
        .await
        .unwrap();

    assert_eq!(summary.statements, 4);
    assert_eq!(summary.nodes_created, 2);
    assert_eq!(summary.relationships_created, 1);
    assert_eq!(summary.nodes_updated, 1);
    assert_eq!(summary.nodes_deleted, 1);

    let texts: Vec<String> = driver.statements().into_iter().map(|s| s.text).collect();
    assert!(texts[0].contains(" CREATE (`v1`:`Person`) "));
    assert!(texts[1].contains(":`KNOWS`]->"));
    assert!(texts[2].contains(" += "));
    assert!(texts[3].contains("DETACH DELETE"));
}

#[tokio::test]
async fn test_reordered_submission_gives_same_statements() {
    async fn run(reverse: bool) -> Vec<String> {
        let driver = RecordingDriver::new();
        driver.respond(ids(&[1, 2])).respond(ids(&[10])).respond(count(1));

        let mut batch = CommandBatch::new();
        let a = batch.create_node(["Tag"], props! { "name" => "a" });
        let b = batch.create_node(["Tag"], props! { "name" => "b" });
        if reverse {
            batch.delete_relationship(7);
            batch.create_relationship("RELATED", a, b, props! {});
        } else {
            batch.create_relationship("RELATED", a, b, props! {});
            batch.delete_relationship(7);
        }

        write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
            .await
            .unwrap();
        driver.statements().into_iter().map(|s| s.text).collect()
    }

    assert_eq!(run(false).await, run(true).await);
}

#[tokio::test]
async fn test_update_rows_keep_null_for_removal() {
    let driver = RecordingDriver::new();
    driver.respond(ids(&[3]));

    let mut batch = CommandBatch::new();
    batch.update_node(3, props! { "tagline" => Value::Null, "title" => "Heat" });

    write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
        .await
        .unwrap();

    let rows = driver.statements()[0].parameter_rows();
    let properties = rows[0].get("properties").and_then(Value::as_map).cloned().unwrap();
    assert_eq!(properties.get("tagline"), Some(&Value::Null));
    assert_eq!(properties.get("title"), Some(&Value::from("Heat")));
    assert!(!properties.contains_key("released"));
}

#[tokio::test]
async fn test_missing_delete_rolls_back() {
    let driver = RecordingDriver::new();
    driver.respond(count(1));

    let mut batch = CommandBatch::new();
    batch.delete_node(1);
    batch.delete_node(2);
    batch.delete_node(2);

    let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
        .await
        .unwrap_err();

    assert!(matches!(err, OgmError::PartialMatch { expected: 2, actual: 1, .. }));
    assert_eq!(
        driver.statements()[0].parameters.get("p0"),
        Some(&Value::from(vec![1i64, 2]))
    );
    let events = driver.events();
    assert!(events.contains(&SessionEvent::RolledBack));
    assert_eq!(events.last(), Some(&SessionEvent::SessionClosed));
}

#[tokio::test]
async fn test_foreign_command_id_is_unresolved() {
    let mut other = CommandBatch::new();
    let foreign = other.create_node(["Person"], props! {});

    let driver = RecordingDriver::new();
    let mut batch = CommandBatch::new();
    batch.update_node(foreign, props! { "name" => "X" });

    let err = write_transaction(&driver, |tx| async move { run_commands(&mut batch, Some(&tx)).await })
        .await
        .unwrap_err();

    assert!(matches!(err, OgmError::UnresolvedId(_)));
    assert!(driver.statements().is_empty());
}

#[tokio::test]
async fn test_commands_outside_transaction() {
    let mut batch = CommandBatch::new();
    batch.delete_node(1);
    let err = run_commands(&mut batch, None).await.unwrap_err();
    assert!(matches!(err, OgmError::NotInTransaction));
}
