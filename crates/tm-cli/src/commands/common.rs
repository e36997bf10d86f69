//! Shared utilities for CLI commands

use serde::Serialize;
use std::fmt;
use tm_core::{LogFields, MigrationLogger, StdoutLogger};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: main.rs exits with the code and prints nothing for it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Whether a known migration is recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MigrationStatus {
    Applied,
    Pending,
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationStatus::Applied => write!(f, "applied"),
            MigrationStatus::Pending => write!(f, "pending"),
        }
    }
}

/// One migration as listed by `pending` and `status`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MigrationRow {
    pub id: usize,
    pub name: String,
    pub status: MigrationStatus,
}

/// Migrator logger for CLI runs: progress lines in verbose mode, silence otherwise.
pub(crate) fn cli_logger(verbose: bool) -> impl Fn(&str, &LogFields) + Send + Sync + 'static {
    move |message: &str, fields: &LogFields| {
        if verbose {
            StdoutLogger.log(message, fields);
        }
        log::debug!("{message}");
    }
}

/// Print rows as a fixed-width table
pub(crate) fn print_rows(rows: &[MigrationRow]) {
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);
    println!("{:>4}  {:<width$}  STATUS", "ID", "NAME");
    for row in rows {
        println!("{:>4}  {:<width$}  {}", row.id, row.name, row.status);
    }
}
