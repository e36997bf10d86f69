use super::*;
use crate::migration::MigrationAction;
use std::fs;
use tempfile::TempDir;

#[test]
fn loads_sql_files_sorted_by_name() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("0002_add_email.sql"), "ALTER TABLE users ADD COLUMN email VARCHAR").unwrap();
    fs::write(dir.path().join("0001_create_users.sql"), "CREATE TABLE users (id INT)").unwrap();
    fs::write(dir.path().join("0010_index.sql"), "CREATE INDEX idx ON users (id)").unwrap();

    let migrations = load_migrations_from_dir(dir.path()).unwrap();

    let names: Vec<&str> = migrations.iter().map(|m| m.name()).collect();
    assert_eq!(
        names,
        vec!["0001_create_users", "0002_add_email", "0010_index"]
    );
    assert!(matches!(
        migrations[0].action(),
        MigrationAction::Sql(sql) if sql == "CREATE TABLE users (id INT)"
    ));
}

#[test]
fn ignores_other_files_and_subdirectories() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("0001_init.sql"), "SELECT 1").unwrap();
    fs::write(dir.path().join("README.md"), "# notes").unwrap();
    fs::write(dir.path().join("0002_draft.sql.bak"), "SELECT 2").unwrap();
    fs::create_dir(dir.path().join("archive.sql")).unwrap();
    fs::write(dir.path().join("archive.sql").join("0000_old.sql"), "SELECT 0").unwrap();

    let migrations = load_migrations_from_dir(dir.path()).unwrap();

    assert_eq!(migrations.len(), 1);
    assert_eq!(migrations[0].name(), "0001_init");
}

#[test]
fn empty_directory_yields_no_migrations() {
    let dir = TempDir::new().unwrap();
    assert!(load_migrations_from_dir(dir.path()).unwrap().is_empty());
}

#[test]
fn missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_migrations_from_dir(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, ConfigError::MigrationsDirNotFound { .. }));
}
