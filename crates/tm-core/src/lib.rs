//! tm-core - Core library for Tidemark
//!
//! Applies an ordered, append-only list of migrations exactly once each.
//! Progress is recorded in a ledger table keyed by list position, one row per
//! applied migration, written in the same transaction as the migration itself.

pub mod config;
pub mod error;
pub mod ledger;
pub mod logger;
pub mod migration;
pub mod migrator;
pub mod source;

pub use config::Config;
pub use error::{ConfigError, ConfigResult, MigrateError, MigrateResult, StepError};
pub use ledger::{LedgerEntry, DEFAULT_TABLE_NAME};
pub use logger::{LogFacadeLogger, LogFields, MigrationLogger, StdoutLogger};
pub use migration::{BoxFuture, Migration, MigrationAction, Procedure};
pub use migrator::{AppliedMigration, MigrationSummary, Migrator, MigratorBuilder};
pub use source::load_migrations_from_dir;
