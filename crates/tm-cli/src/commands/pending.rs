//! Pending command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, PendingArgs};
use crate::commands::common::{cli_logger, print_rows, MigrationRow, MigrationStatus};
use crate::context::RuntimeContext;

/// Execute the pending command
pub async fn execute(args: &PendingArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global, cli_logger(global.verbose))?;

    let pending = ctx
        .migrator
        .pending(&ctx.db)
        .await
        .context("Failed to read migration ledger")?;
    let first = ctx.migrator.migrations().len() - pending.len();

    let rows: Vec<MigrationRow> = pending
        .iter()
        .enumerate()
        .map(|(offset, m)| MigrationRow {
            id: first + offset,
            name: m.name().to_string(),
            status: MigrationStatus::Pending,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No pending migrations");
    } else {
        print_rows(&rows);
    }

    Ok(())
}
