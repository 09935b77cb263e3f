//! Task-local current transaction
//!
//! [`run_session`] opens a session, hands it to a block and closes it when the
//! block returns, whether it succeeded or not. A transaction block receives
//! its [`TransactionHandle`] explicitly and also runs with that handle as the
//! task's current transaction, so query functions called without an explicit
//! handle pick it up. `Ok` from the block commits, `Err` rolls back.
//!
//! The current transaction is a `tokio::task_local!`: tasks spawned from
//! inside a block do not see it unless it is passed on with
//! [`with_transaction`], and concurrent blocks never see each other's.

use super::{AccessMode, Driver, Row, Session, Transaction};
use crate::cypher::{Fragment, Statement};
use crate::error::{OgmError, OgmResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

tokio::task_local! {
    static CURRENT_TRANSACTION: TransactionHandle;
}

/// Shared handle to an open transaction.
///
/// Cloning is cheap; all clones refer to the same transaction. After the
/// owning block finishes, every clone reports [`OgmError::NotInTransaction`].
#[derive(Clone)]
pub struct TransactionHandle {
    inner: Arc<Mutex<Option<Box<dyn Transaction>>>>,
    mode: AccessMode,
}

impl TransactionHandle {
    fn new(transaction: Box<dyn Transaction>, mode: AccessMode) -> Self {
        Self { inner: Arc::new(Mutex::new(Some(transaction))), mode }
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Run a flattened statement
    pub async fn run(&self, statement: &Statement) -> OgmResult<Vec<Row>> {
        let mut guard = self.inner.lock().await;
        let transaction = guard.as_mut().ok_or(OgmError::NotInTransaction)?;
        debug!(
            "Running statement ({} parameters): {}",
            statement.parameters.len(),
            statement.text
        );
        let rows = transaction.run(statement).await?;
        debug!("Statement returned {} rows", rows.len());
        Ok(rows)
    }

    /// Flatten and run a fragment
    pub async fn run_fragment(&self, fragment: &Fragment) -> OgmResult<Vec<Row>> {
        self.run(&Statement::build(fragment)).await
    }

    async fn commit(&self) -> OgmResult<()> {
        match self.inner.lock().await.take() {
            Some(transaction) => transaction.commit().await,
            None => Err(OgmError::NotInTransaction),
        }
    }

    async fn rollback(&self) -> OgmResult<()> {
        match self.inner.lock().await.take() {
            Some(transaction) => transaction.rollback().await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle").field("mode", &self.mode).finish()
    }
}

/// The task's current transaction
pub fn current_transaction() -> OgmResult<TransactionHandle> {
    CURRENT_TRANSACTION
        .try_with(|handle| handle.clone())
        .map_err(|_| OgmError::NotInTransaction)
}

/// Run `fragment` in `transaction`, or in the current transaction when `None`
pub async fn run_query(
    fragment: &Fragment,
    transaction: Option<&TransactionHandle>,
) -> OgmResult<Vec<Row>> {
    match transaction {
        Some(handle) => handle.run_fragment(fragment).await,
        None => current_transaction()?.run_fragment(fragment).await,
    }
}

/// Run `future` with `handle` as its current transaction, e.g. inside a
/// spawned task
pub async fn with_transaction<F: Future>(handle: TransactionHandle, future: F) -> F::Output {
    CURRENT_TRANSACTION.scope(handle, future).await
}

/// Shared handle to an open session, passed to [`run_session`] blocks.
///
/// The session closes when the block returns; clones kept past that point
/// report [`OgmError::SessionClosed`].
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Option<Box<dyn Session>>>>,
}

impl SessionHandle {
    /// Run `block` in a new transaction of this session
    pub async fn transaction<F, Fut, T>(&self, mode: AccessMode, block: F) -> OgmResult<T>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = OgmResult<T>>,
    {
        let transaction = {
            let mut guard = self.inner.lock().await;
            let session = guard.as_mut().ok_or(OgmError::SessionClosed)?;
            session.begin_transaction(mode).await?
        };
        debug!("Began {} transaction", mode);
        let handle = TransactionHandle::new(transaction, mode);

        let outcome = with_transaction(handle.clone(), block(handle.clone())).await;
        match outcome {
            Ok(value) => {
                handle.commit().await?;
                debug!("Committed {} transaction", mode);
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_error) = handle.rollback().await {
                    warn!("Rollback after failed transaction block also failed: {}", rollback_error);
                }
                debug!("Rolled back {} transaction", mode);
                Err(e)
            }
        }
    }

    pub async fn read_transaction<F, Fut, T>(&self, block: F) -> OgmResult<T>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = OgmResult<T>>,
    {
        self.transaction(AccessMode::Read, block).await
    }

    pub async fn write_transaction<F, Fut, T>(&self, block: F) -> OgmResult<T>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = OgmResult<T>>,
    {
        self.transaction(AccessMode::Write, block).await
    }

    async fn close(&self) -> OgmResult<()> {
        match self.inner.lock().await.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

/// Open a session, run `block` with it and close it afterwards.
///
/// The session is closed even when the block fails; the block's error wins
/// over a close error.
pub async fn run_session<D, F, Fut, T>(driver: &D, block: F) -> OgmResult<T>
where
    D: Driver + ?Sized,
    F: FnOnce(SessionHandle) -> Fut,
    Fut: Future<Output = OgmResult<T>>,
{
    let session = driver.session().await?;
    let handle = SessionHandle { inner: Arc::new(Mutex::new(Some(session))) };
    let result = block(handle.clone()).await;
    let closed = handle.close().await;
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_error)) => {
            warn!("Closing session after failed block also failed: {}", close_error);
            Err(e)
        }
    }
}

/// One read transaction in its own session
pub async fn read_transaction<D, F, Fut, T>(driver: &D, block: F) -> OgmResult<T>
where
    D: Driver + ?Sized,
    F: FnOnce(TransactionHandle) -> Fut,
    Fut: Future<Output = OgmResult<T>>,
{
    run_session(driver, |session| async move { session.read_transaction(block).await }).await
}

/// One write transaction in its own session
pub async fn write_transaction<D, F, Fut, T>(driver: &D, block: F) -> OgmResult<T>
where
    D: Driver + ?Sized,
    F: FnOnce(TransactionHandle) -> Fut,
    Fut: Future<Output = OgmResult<T>>,
{
    run_session(driver, |session| async move { session.write_transaction(block).await }).await
}
