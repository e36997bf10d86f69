//! Configuration types and parsing for tidemark.yml

use crate::error::{ConfigError, ConfigResult};
use crate::ledger::{is_valid_table_name, DEFAULT_TABLE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names searched by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["tidemark.yml", "tidemark.yaml"];

/// Project configuration from tidemark.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Ledger table recording applied migrations
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Directory of `*.sql` migration files, relative to the project root
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Compare ledger names against the migration list before migrating
    #[serde(default = "default_true")]
    pub verify_history: bool,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file path relative to the project root, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            ledger_table: default_ledger_table(),
            migrations_dir: default_migrations_dir(),
            verify_history: true,
        }
    }
}

/// Database file used when `database.path` is not set.
pub const DEFAULT_DB_PATH: &str = "tidemark.duckdb";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_ledger_table() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for tidemark.yml or tidemark.yaml
    pub fn load_from_dir(dir: &Path) -> ConfigResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(ConfigError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        if self.ledger_table.trim().is_empty() {
            return Err(ConfigError::ConfigInvalid {
                message: "ledger_table cannot be empty".to_string(),
            });
        }

        if !is_valid_table_name(&self.ledger_table) {
            return Err(ConfigError::ConfigInvalid {
                message: format!(
                    "ledger_table '{}' must be an identifier or schema.identifier",
                    self.ledger_table
                ),
            });
        }

        Ok(())
    }

    /// Migrations directory resolved against the project root
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Database path resolved against the project root; `:memory:` is kept as is
    pub fn database_path_absolute(&self, root: &Path) -> String {
        if self.database.path == ":memory:" || Path::new(&self.database.path).is_absolute() {
            self.database.path.clone()
        } else {
            root.join(&self.database.path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
