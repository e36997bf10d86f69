//! Migrate command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::cli_logger;
use crate::context::RuntimeContext;

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global, cli_logger(global.verbose))?;

    if args.dry_run {
        let pending = ctx
            .migrator
            .pending(&ctx.db)
            .await
            .context("Failed to read migration ledger")?;
        if pending.is_empty() {
            println!("Dry run - database is up to date");
            return Ok(());
        }
        let first = ctx.migrator.migrations().len() - pending.len();
        println!(
            "Dry run - would apply {} migration{}:",
            pending.len(),
            if pending.len() == 1 { "" } else { "s" }
        );
        for (offset, migration) in pending.iter().enumerate() {
            println!("  [{}] {}", first + offset, migration.name());
        }
        return Ok(());
    }

    let summary = ctx
        .migrator
        .migrate(&ctx.db)
        .await
        .context("Migration failed")?;

    for applied in &summary.applied {
        println!(
            "  Applied [{}] {} ({:.1}ms)",
            applied.id,
            applied.name,
            applied.duration.as_secs_f64() * 1000.0
        );
    }

    println!();
    if summary.applied.is_empty() {
        println!(
            "Database is up to date ({} migration{} applied)",
            summary.previously_applied,
            if summary.previously_applied == 1 { "" } else { "s" }
        );
    } else {
        println!(
            "Applied {} migration{} ({} previously applied)",
            summary.applied.len(),
            if summary.applied.len() == 1 { "" } else { "s" },
            summary.previously_applied
        );
    }

    Ok(())
}
