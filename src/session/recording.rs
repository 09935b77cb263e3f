//! RecordingDriver: scripted in-process driver
//!
//! Records every statement and lifecycle event and answers statements with
//! queued rows (or queued errors), in order. Statements with nothing queued
//! return no rows. Used by the test suites of this crate and of code built on
//! it; no database is involved.

use super::{AccessMode, Driver, Row, Session, Transaction};
use crate::cypher::Statement;
use crate::error::{OgmError, OgmResult};
use crate::graph::{PropertyMap, Value};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle event seen by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SessionOpened,
    TransactionBegun(AccessMode),
    Ran,
    Committed,
    RolledBack,
    SessionClosed,
}

/// Statement as received by the driver
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub text: String,
    pub parameters: PropertyMap,
    pub mode: AccessMode,
}

impl RecordedStatement {
    /// Maps inside the list parameter `p0`, i.e. the rows of a batched `UNWIND`
    pub fn parameter_rows(&self) -> Vec<PropertyMap> {
        self.parameters
            .get("p0")
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_map).cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct RecordingState {
    responses: VecDeque<Result<Vec<Row>, String>>,
    statements: Vec<RecordedStatement>,
    events: Vec<SessionEvent>,
}

/// Scripted driver; clones share the same script and recordings
#[derive(Clone, Default)]
pub struct RecordingDriver {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the rows returned by the next unanswered statement
    pub fn respond(&self, rows: Vec<Row>) -> &Self {
        self.state().responses.push_back(Ok(rows));
        self
    }

    /// Queue a driver error for the next unanswered statement
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.state().responses.push_back(Err(message.into()));
        self
    }

    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state().statements.clone()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.state().events.clone()
    }

    /// Number of queued responses not consumed yet
    pub fn pending_responses(&self) -> usize {
        self.state().responses.len()
    }

    fn record(&self, event: SessionEvent) {
        self.state().events.push(event);
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn session(&self) -> OgmResult<Box<dyn Session>> {
        self.record(SessionEvent::SessionOpened);
        Ok(Box::new(RecordingSession { driver: self.clone() }))
    }
}

struct RecordingSession {
    driver: RecordingDriver,
}

#[async_trait]
impl Session for RecordingSession {
    async fn begin_transaction(&mut self, mode: AccessMode) -> OgmResult<Box<dyn Transaction>> {
        self.driver.record(SessionEvent::TransactionBegun(mode));
        Ok(Box::new(RecordingTransaction { driver: self.driver.clone(), mode }))
    }

    async fn close(self: Box<Self>) -> OgmResult<()> {
        self.driver.record(SessionEvent::SessionClosed);
        Ok(())
    }
}

struct RecordingTransaction {
    driver: RecordingDriver,
    mode: AccessMode,
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn run(&mut self, statement: &Statement) -> OgmResult<Vec<Row>> {
        let mut state = self.driver.state();
        state.events.push(SessionEvent::Ran);
        state.statements.push(RecordedStatement {
            text: statement.text.clone(),
            parameters: statement.parameters.clone(),
            mode: self.mode,
        });
        match state.responses.pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(OgmError::Driver(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn commit(self: Box<Self>) -> OgmResult<()> {
        self.driver.record(SessionEvent::Committed);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> OgmResult<()> {
        self.driver.record(SessionEvent::RolledBack);
        Ok(())
    }
}
