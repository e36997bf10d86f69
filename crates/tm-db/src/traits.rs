//! Command and transaction traits the migrator is written against

use crate::error::DbResult;
use crate::value::{Row, SqlValue};
use async_trait::async_trait;

/// Statement execution against a connection or an open transaction.
///
/// Implementations must be Send + Sync for async operation. Placeholder
/// syntax for `params` is whatever the driver accepts (`$1` / `?`).
#[async_trait]
pub trait Commands: Send + Sync {
    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize>;

    /// Execute one or more semicolon-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and collect every row
    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    /// Run a query and return its first row, if any
    async fn query_row(&self, sql: &str, params: &[SqlValue]) -> DbResult<Option<Row>> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// A live connection that can open transactions.
#[async_trait]
pub trait Connection: Commands {
    /// View this connection as a plain command handle
    fn as_commands(&self) -> &dyn Commands;

    /// Open a new transaction on this connection
    async fn begin(&self) -> DbResult<Box<dyn Transaction + '_>>;
}

/// An open transaction.
///
/// Statements issued through the [`Commands`] half of the handle become
/// visible only once [`Transaction::commit`] succeeds. Both `commit` and
/// `rollback` consume the handle.
#[async_trait]
pub trait Transaction: Commands {
    /// View this transaction as a plain command handle
    fn as_commands(&self) -> &dyn Commands;

    /// Make every statement issued through this handle durable
    async fn commit(self: Box<Self>) -> DbResult<()>;

    /// Discard every statement issued through this handle
    async fn rollback(self: Box<Self>) -> DbResult<()>;
}
