//! Error types for tm-core

use thiserror::Error;
use tm_db::DbError;

/// Error returned by a migration's own action.
///
/// Procedures may fail with any error type; [`DbError`] converts into it
/// with `?`.
pub type StepError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from building a migrator or applying migrations
#[derive(Error, Debug)]
pub enum MigrateError {
    /// MG001: The ledger records more migrations than the list defines
    #[error("[MG001] Too many applied migrations: ledger has {applied}, only {known} defined")]
    TooManyApplied { applied: usize, known: usize },

    /// MG002: Could not start the transaction for a migration
    #[error("[MG002] Failed to start transaction for migration {id} ({name})")]
    Begin {
        id: usize,
        name: String,
        #[source]
        source: DbError,
    },

    /// MG003: The migration's action failed; its transaction was rolled back
    #[error("[MG003] Migration {id} ({name}) failed")]
    Migration {
        id: usize,
        name: String,
        #[source]
        source: StepError,
    },

    /// MG004: The ledger row could not be written; the transaction was rolled back
    #[error("[MG004] Failed to record migration {id} ({name}) in the ledger")]
    RecordLedger {
        id: usize,
        name: String,
        #[source]
        source: DbError,
    },

    /// MG005: Commit failed; the migration is not applied and will be retried
    #[error("[MG005] Failed to commit transaction for migration {id} ({name})")]
    Commit {
        id: usize,
        name: String,
        #[source]
        source: DbError,
    },

    /// MG006: A ledger row names a different migration than the list holds at that position
    #[error("[MG006] Ledger row {id} records '{recorded}' but migration {id} is '{expected}'")]
    HistoryMismatch {
        id: usize,
        recorded: String,
        expected: String,
    },

    /// MG007: Two migrations share a name
    #[error("[MG007] Duplicate migration name: {name}")]
    DuplicateMigration { name: String },

    /// MG008: Migration name cannot be stored in the ledger
    #[error("[MG008] Invalid migration name '{name}': {reason}")]
    InvalidMigrationName { name: String, reason: String },

    /// MG009: Ledger table name is not a plain SQL identifier
    #[error("[MG009] Invalid ledger table name: '{name}'")]
    InvalidTableName { name: String },

    /// Ledger bootstrap or count query failed
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Result type alias for [`MigrateError`]
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Configuration and migration-source errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Migrations directory not found
    #[error("[C004] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// C005: IO error with the offending path
    #[error("[C005] IO error at {path}: {source}")]
    IoWithPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for [`ConfigError`]
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ConfigParseError {
            message: err.to_string(),
        }
    }
}
