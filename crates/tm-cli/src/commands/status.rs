//! Status command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use tm_core::MigrateError;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::{cli_logger, print_rows, ExitCode, MigrationRow, MigrationStatus};
use crate::context::RuntimeContext;

#[derive(Debug, Serialize)]
struct StatusReport {
    ledger_table: String,
    applied: usize,
    pending: usize,
    migrations: Vec<MigrationRow>,
    error: Option<String>,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global, cli_logger(global.verbose))?;

    let history = ctx
        .migrator
        .history(&ctx.db)
        .await
        .context("Failed to read migration ledger")?;

    // Only ledger problems are reported; driver errors abort.
    let error = match ctx.migrator.verify_history(&ctx.db).await {
        Ok(()) => None,
        Err(e @ (MigrateError::HistoryMismatch { .. } | MigrateError::TooManyApplied { .. })) => {
            Some(e.to_string())
        }
        Err(e) => return Err(e).context("Failed to verify migration ledger"),
    };

    let migrations: Vec<MigrationRow> = ctx
        .migrator
        .migrations()
        .iter()
        .enumerate()
        .map(|(id, m)| MigrationRow {
            id,
            name: m.name().to_string(),
            status: if id < history.len() {
                MigrationStatus::Applied
            } else {
                MigrationStatus::Pending
            },
        })
        .collect();
    let applied = history.len().min(migrations.len());

    let report = StatusReport {
        ledger_table: ctx.config.ledger_table.clone(),
        applied,
        pending: migrations.len() - applied,
        migrations,
        error,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_rows(&report.migrations);
        println!();
        println!(
            "{} applied, {} pending (ledger: {})",
            report.applied, report.pending, report.ledger_table
        );
        if let Some(error) = &report.error {
            eprintln!("{error}");
        }
    }

    if report.error.is_some() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
