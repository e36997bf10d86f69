//! DuckDB implementation of the command/transaction contract

use crate::error::{DbError, DbResult};
use crate::row_helpers::read_row;
use crate::traits::{Commands, Connection as DbConnection, Transaction};
use crate::value::{Row, SqlValue};
use async_trait::async_trait;
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
///
/// A single connection behind a mutex. Transactions opened with
/// [`DbConnection::begin`] run on that same connection, so the backend
/// must not be shared between concurrent migrators.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute a single statement synchronously
    fn execute_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        log::debug!("execute: {sql}");
        let conn = self.lock()?;
        conn.execute(sql, params_from_iter(params.iter()))
            .map_err(DbError::from)
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        log::debug!("execute_batch: {sql}");
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Run a query synchronously, collecting every row
    fn query_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        log::debug!("query: {sql}");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| Ok(read_row(row)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn transaction_statement(&self, stmt: &str) -> DbResult<()> {
        self.execute_batch_sync(stmt)
            .map_err(|e| DbError::TransactionError(format!("{stmt} failed: {e}")))
    }
}

#[async_trait]
impl Commands for DuckDbBackend {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.execute_sync(sql, params)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        self.query_sync(sql, params)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[async_trait]
impl DbConnection for DuckDbBackend {
    fn as_commands(&self) -> &dyn Commands {
        self
    }

    async fn begin(&self) -> DbResult<Box<dyn Transaction + '_>> {
        self.transaction_statement("BEGIN TRANSACTION")?;
        Ok(Box::new(DuckDbTransaction {
            backend: self,
            finished: false,
        }))
    }
}

/// An open DuckDB transaction.
///
/// Dropping the handle without calling `commit` or `rollback` (for example
/// when the owning future is cancelled) issues a best-effort `ROLLBACK`.
pub struct DuckDbTransaction<'a> {
    backend: &'a DuckDbBackend,
    finished: bool,
}

#[async_trait]
impl Commands for DuckDbTransaction<'_> {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.backend.execute_sync(sql, params)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.backend.execute_batch_sync(sql)
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        self.backend.query_sync(sql, params)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[async_trait]
impl Transaction for DuckDbTransaction<'_> {
    fn as_commands(&self) -> &dyn Commands {
        self
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        let mut this = self;
        // On failure `finished` stays false and Drop rolls back.
        this.backend.transaction_statement("COMMIT")?;
        this.finished = true;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        let mut this = self;
        this.finished = true;
        this.backend.transaction_statement("ROLLBACK")
    }
}

impl Drop for DuckDbTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.backend.transaction_statement("ROLLBACK") {
            log::warn!("Rollback of abandoned transaction failed: {e}");
        }
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
