//! The migrator: applies pending migrations one transaction at a time.
//!
//! Progress is never held in memory. Every call re-reads the ledger row count
//! and treats it as the index of the first migration still to apply, so a
//! failed run can simply be repeated once the cause is fixed.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{self, LedgerEntry, DEFAULT_TABLE_NAME, MAX_VERSION_LEN};
use crate::logger::{log_fields, MigrationLogger, StdoutLogger};
use crate::migration::Migration;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tm_db::{Commands, Connection, Transaction};

/// One migration applied by a [`Migrator::migrate`] call.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedMigration {
    pub id: usize,
    pub name: String,
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

fn serialize_duration_ms<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Outcome of a successful [`Migrator::migrate`] call.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    /// Ledger rows found before this run
    pub previously_applied: usize,
    /// Migrations applied by this run, in order
    pub applied: Vec<AppliedMigration>,
}

/// Applies an ordered migration list, recording progress in a ledger table.
///
/// Safe to reuse across calls, but two concurrent `migrate` calls against the
/// same ledger race on the starting index; serialize them externally.
pub struct Migrator {
    table_name: String,
    logger: Arc<dyn MigrationLogger>,
    migrations: Vec<Migration>,
    verify_history: bool,
}

/// Builder for [`Migrator`]. Setters apply in call order over the defaults.
pub struct MigratorBuilder {
    table_name: String,
    logger: Arc<dyn MigrationLogger>,
    migrations: Vec<Migration>,
    verify_history: bool,
}

impl Default for MigratorBuilder {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            logger: Arc::new(StdoutLogger),
            migrations: Vec::new(),
            verify_history: true,
        }
    }
}

impl MigratorBuilder {
    /// Ledger table name (default `__migrations`).
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Progress sink (default [`StdoutLogger`]).
    pub fn logger(mut self, logger: impl MigrationLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Progress sink shared with the caller.
    pub fn shared_logger(mut self, logger: Arc<dyn MigrationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the migration list.
    pub fn migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
        self.migrations = migrations.into_iter().collect();
        self
    }

    /// Append one migration to the list.
    pub fn migration(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }

    /// Check recorded ledger names against the list before migrating (default on).
    pub fn verify_history(mut self, verify: bool) -> Self {
        self.verify_history = verify;
        self
    }

    pub fn build(self) -> MigrateResult<Migrator> {
        if !ledger::is_valid_table_name(&self.table_name) {
            return Err(MigrateError::InvalidTableName {
                name: self.table_name,
            });
        }

        let mut seen = HashSet::new();
        for migration in &self.migrations {
            let name = migration.name();
            if name.trim().is_empty() {
                return Err(MigrateError::InvalidMigrationName {
                    name: name.to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }
            if name.chars().count() > MAX_VERSION_LEN {
                return Err(MigrateError::InvalidMigrationName {
                    name: name.to_string(),
                    reason: format!("name exceeds {MAX_VERSION_LEN} characters"),
                });
            }
            if !seen.insert(name) {
                return Err(MigrateError::DuplicateMigration {
                    name: name.to_string(),
                });
            }
        }

        Ok(Migrator {
            table_name: self.table_name,
            logger: self.logger,
            migrations: self.migrations,
            verify_history: self.verify_history,
        })
    }
}

impl Migrator {
    pub fn builder() -> MigratorBuilder {
        MigratorBuilder::default()
    }

    /// Migrator over `migrations` with every other option at its default.
    pub fn new(migrations: impl IntoIterator<Item = Migration>) -> MigrateResult<Self> {
        Self::builder().migrations(migrations).build()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Ensure the ledger table exists, then return its row count.
    ///
    /// The table creation auto-commits on its own; driver errors from either
    /// statement are returned unchanged.
    pub async fn count_applied(&self, conn: &dyn Commands) -> MigrateResult<usize> {
        ledger::ensure_table(conn, &self.table_name).await?;
        Ok(ledger::count_rows(conn, &self.table_name).await?)
    }

    /// Ledger count, rejected when it exceeds the known migration list.
    async fn checked_count(&self, conn: &dyn Commands) -> MigrateResult<usize> {
        let count = self.count_applied(conn).await?;
        if count > self.migrations.len() {
            return Err(MigrateError::TooManyApplied {
                applied: count,
                known: self.migrations.len(),
            });
        }
        Ok(count)
    }

    /// Every ledger row, ordered by id.
    pub async fn history(&self, conn: &dyn Commands) -> MigrateResult<Vec<LedgerEntry>> {
        ledger::ensure_table(conn, &self.table_name).await?;
        ledger::read_entries(conn, &self.table_name).await
    }

    /// Check that each ledger row names the migration at its position.
    pub async fn verify_history(&self, conn: &dyn Commands) -> MigrateResult<()> {
        let entries = self.history(conn).await?;
        self.check_history(&entries)
    }

    /// Reject a ledger longer than the list, or one whose rows name
    /// different migrations than the list holds at those positions.
    fn check_history(&self, entries: &[LedgerEntry]) -> MigrateResult<()> {
        let too_many = || MigrateError::TooManyApplied {
            applied: entries.len(),
            known: self.migrations.len(),
        };
        if entries.len() > self.migrations.len() {
            return Err(too_many());
        }
        for entry in entries {
            let expected = usize::try_from(entry.id)
                .ok()
                .and_then(|id| self.migrations.get(id))
                .ok_or_else(too_many)?;
            if expected.name() != entry.version {
                return Err(MigrateError::HistoryMismatch {
                    id: entry.id as usize,
                    recorded: entry.version.clone(),
                    expected: expected.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Migrations not yet recorded in the ledger, in list order.
    ///
    /// Writes nothing beyond the idempotent ledger table creation.
    pub async fn pending(&self, conn: &dyn Commands) -> MigrateResult<&[Migration]> {
        let count = self.checked_count(conn).await?;
        Ok(&self.migrations[count..])
    }

    /// Apply every pending migration, each in its own transaction.
    ///
    /// Stops at the first failure; migrations committed before it stay
    /// applied and the rest are left for the next call.
    ///
    /// # Panics
    ///
    /// Panics if rolling back a failed migration's transaction fails, since
    /// the connection is then in an unknown state.
    pub async fn migrate(&self, conn: &dyn Connection) -> MigrateResult<MigrationSummary> {
        let count = if self.verify_history {
            let entries = self.history(conn.as_commands()).await?;
            self.check_history(&entries)?;
            entries.len()
        } else {
            self.checked_count(conn.as_commands()).await?
        };

        self.logger.log(
            "Running missing migrations...",
            &log_fields! { "missing" => self.migrations.len() - count },
        );

        let mut applied = Vec::with_capacity(self.migrations.len() - count);
        for (id, migration) in self.migrations.iter().enumerate().skip(count) {
            let duration = self.apply_one(conn, id, migration).await?;
            applied.push(AppliedMigration {
                id,
                name: migration.name().to_string(),
                duration,
            });
        }

        Ok(MigrationSummary {
            previously_applied: count,
            applied,
        })
    }

    async fn apply_one(
        &self,
        conn: &dyn Connection,
        id: usize,
        migration: &Migration,
    ) -> MigrateResult<Duration> {
        let name = migration.name();
        let tx = conn.begin().await.map_err(|source| MigrateError::Begin {
            id,
            name: name.to_string(),
            source,
        })?;

        self.logger.log(
            "applying migration",
            &log_fields! { "id" => id, "name" => name },
        );
        let start = Instant::now();

        let outcome = migration.run(tx.as_commands()).await;
        if let Err(source) = outcome {
            rollback_or_abort(tx, id, name).await;
            return Err(MigrateError::Migration {
                id,
                name: name.to_string(),
                source,
            });
        }

        let recorded = ledger::insert_row(tx.as_commands(), &self.table_name, id, name).await;
        if let Err(source) = recorded {
            rollback_or_abort(tx, id, name).await;
            return Err(MigrateError::RecordLedger {
                id,
                name: name.to_string(),
                source,
            });
        }

        tx.commit().await.map_err(|source| MigrateError::Commit {
            id,
            name: name.to_string(),
            source,
        })?;

        let took = start.elapsed();
        self.logger.log(
            "applied migration",
            &log_fields! { "id" => id, "name" => name, "took" => format!("{took:?}") },
        );
        Ok(took)
    }
}

/// Roll back a failed migration's transaction.
///
/// A failed rollback leaves the transaction in an unknown state; carrying on
/// could skip or double-apply work, so it aborts instead of returning.
async fn rollback_or_abort(tx: Box<dyn Transaction + '_>, id: usize, name: &str) {
    if let Err(e) = tx.rollback().await {
        panic!("migrator: rollback of migration {id} ({name}) failed: {e}");
    }
    log::debug!("Rolled back migration {id} ({name})");
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
