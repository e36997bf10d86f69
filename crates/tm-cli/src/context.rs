//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tm_core::{load_migrations_from_dir, Config, MigrationLogger, Migrator};
use tm_db::DuckDbBackend;

use crate::cli::GlobalArgs;

/// Runtime context containing loaded config, migrations and database connection
pub struct RuntimeContext {
    /// Effective configuration after CLI overrides
    pub config: Config,

    /// Migrator over the project's migration files
    pub migrator: Migrator,

    /// Database connection
    pub db: DuckDbBackend,

    /// Verbose output enabled
    pub verbose: bool,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub fn new(args: &GlobalArgs, logger: impl MigrationLogger + 'static) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);

        let mut config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&root).context("Failed to load project configuration")?
        };

        if let Some(path) = &args.database {
            config.database.path = path.clone();
        }
        if let Some(table) = &args.table {
            config.ledger_table = table.clone();
        }
        config.validate().context("Invalid command-line override")?;

        let migrations_dir = config.migrations_dir_absolute(&root);
        let migrations = load_migrations_from_dir(&migrations_dir)
            .context("Failed to load migration files")?;

        let migrator = Migrator::builder()
            .migrations(migrations)
            .table_name(config.ledger_table.clone())
            .verify_history(config.verify_history)
            .logger(logger)
            .build()
            .context("Invalid migration list")?;

        let db_path = config.database_path_absolute(&root);
        let db = DuckDbBackend::new(&db_path).context("Failed to connect to database")?;

        let ctx = Self {
            config,
            migrator,
            db,
            verbose: args.verbose,
        };
        ctx.verbose(&format!(
            "database {db_path}, ledger {}, {} migration(s) in {}",
            ctx.config.ledger_table,
            ctx.migrator.migrations().len(),
            migrations_dir.display()
        ));
        Ok(ctx)
    }

    /// Print verbose output if enabled
    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }
}
