//! Ledger table access.
//!
//! The ledger records one row per applied migration: `id` is the migration's
//! 0-based position in the list, `version` its name. Rows are only ever
//! inserted, one per migration, inside that migration's transaction.

use crate::error::MigrateResult;
use serde::Serialize;
use tm_db::{Commands, DbResult, SqlValue};

/// Ledger table used when no name is configured.
pub const DEFAULT_TABLE_NAME: &str = "__migrations";

/// Longest migration name the `version` column stores.
pub(crate) const MAX_VERSION_LEN: usize = 255;

/// One persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub version: String,
}

/// Whether `name` is safe to splice into DDL as a table name.
///
/// Accepts `table` or `schema.table`, each part `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INT8 NOT NULL,
            version VARCHAR({MAX_VERSION_LEN}) NOT NULL,
            PRIMARY KEY (id)
        )"
    )
}

/// Create the ledger table if it does not exist yet.
///
/// Runs as its own auto-committed statement, outside any migration
/// transaction.
pub(crate) async fn ensure_table(conn: &dyn Commands, table: &str) -> DbResult<()> {
    conn.execute_batch(&create_table_sql(table)).await
}

/// Number of rows in the ledger.
pub(crate) async fn count_rows(conn: &dyn Commands, table: &str) -> DbResult<usize> {
    let row = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .await?;
    match row {
        Some(row) => Ok(row.get_i64(0)?.max(0) as usize),
        None => Ok(0),
    }
}

/// Record migration `id` as applied, through the caller's transaction.
pub(crate) async fn insert_row(
    tx: &dyn Commands,
    table: &str,
    id: usize,
    version: &str,
) -> DbResult<()> {
    tx.execute(
        &format!("INSERT INTO {table} (id, version) VALUES ($1, $2)"),
        &[SqlValue::from(id), SqlValue::from(version)],
    )
    .await?;
    Ok(())
}

/// Every ledger row, ordered by `id`.
pub(crate) async fn read_entries(conn: &dyn Commands, table: &str) -> MigrateResult<Vec<LedgerEntry>> {
    let rows = conn
        .query(&format!("SELECT id, version FROM {table} ORDER BY id"), &[])
        .await?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        entries.push(LedgerEntry {
            id: row.get_i64(0)?,
            version: row.get_str(1)?.to_string(),
        });
    }
    Ok(entries)
}
