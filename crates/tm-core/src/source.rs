//! Loading SQL migrations from a directory.

use crate::error::{ConfigError, ConfigResult};
use crate::migration::Migration;
use std::path::{Path, PathBuf};

/// Load every `*.sql` file in `dir` as a SQL migration.
///
/// Files are ordered by file name and named by their stem, so a
/// `0001_create_users.sql` prefix scheme fixes the list order. Other files
/// and subdirectories are ignored.
pub fn load_migrations_from_dir(dir: &Path) -> ConfigResult<Vec<Migration>> {
    if !dir.is_dir() {
        return Err(ConfigError::MigrationsDirNotFound {
            path: dir.display().to_string(),
        });
    }

    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |source| ConfigError::IoWithPath { path, source }
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut migrations = Vec::with_capacity(files.len());
    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            return Err(ConfigError::ConfigInvalid {
                message: format!("migration file name is not UTF-8: {}", path.display()),
            });
        };
        let sql = std::fs::read_to_string(&path).map_err(io_err(&path))?;
        log::debug!("Loaded migration '{name}' from {}", path.display());
        migrations.push(Migration::sql(name, sql));
    }

    Ok(migrations)
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
