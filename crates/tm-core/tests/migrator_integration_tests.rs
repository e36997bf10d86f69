//! End-to-end migrator runs against real DuckDB databases

use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tm_core::{
    load_migrations_from_dir, LedgerEntry, LogFields, MigrateError, Migration, Migrator,
    StepError,
};
use tm_db::{Commands, DuckDbBackend};

fn quiet(migrations: Vec<Migration>) -> Migrator {
    Migrator::builder()
        .migrations(migrations)
        .logger(|_: &str, _: &LogFields| {})
        .build()
        .unwrap()
}

fn sample_migrations() -> Vec<Migration> {
    vec![
        Migration::sql("create foo", "CREATE TABLE foo (id INT PRIMARY KEY)"),
        Migration::sql(
            "create bar, alter bar",
            "CREATE TABLE bar (id INT PRIMARY KEY); ALTER TABLE bar ADD COLUMN name VARCHAR(255)",
        ),
        Migration::from_fn("fn: create foobar, insert", |tx| {
            Box::pin(async move {
                tx.execute_batch("CREATE TABLE foobar (id INT PRIMARY KEY)")
                    .await?;
                tx.execute("INSERT INTO foobar (id) VALUES ($1)", &[1i64.into()])
                    .await?;
                Ok::<_, StepError>(())
            })
        }),
    ]
}

async fn ledger(db: &DuckDbBackend, table: &str) -> Vec<(i64, String)> {
    db.query(&format!("SELECT id, version FROM {table} ORDER BY id"), &[])
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.get_i64(0).unwrap(), row.get_str(1).unwrap().to_string()))
        .collect()
}

async fn table_exists(db: &DuckDbBackend, table: &str) -> bool {
    let row = db
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = $1",
            &[table.into()],
        )
        .await
        .unwrap()
        .unwrap();
    row.get_i64(0).unwrap() == 1
}

#[tokio::test]
async fn applies_sample_list_then_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = quiet(sample_migrations());

    let summary = migrator.migrate(&db).await.unwrap();
    assert_eq!(summary.applied.len(), 3);

    assert_eq!(
        ledger(&db, "__migrations").await,
        vec![
            (0, "create foo".to_string()),
            (1, "create bar, alter bar".to_string()),
            (2, "fn: create foobar, insert".to_string()),
        ]
    );
    for table in ["foo", "bar", "foobar"] {
        assert!(table_exists(&db, table).await, "{table} missing");
    }

    let summary = migrator.migrate(&db).await.unwrap();
    assert_eq!(summary.previously_applied, 3);
    assert!(summary.applied.is_empty());
    assert_eq!(ledger(&db, "__migrations").await.len(), 3);
}

#[tokio::test]
async fn appended_migrations_apply_on_next_run() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut migrations = sample_migrations();
    let fourth = Migration::sql("create baz", "CREATE TABLE baz (id INT)");

    quiet(sample_migrations()).migrate(&db).await.unwrap();
    migrations.push(fourth);
    let summary = quiet(migrations).migrate(&db).await.unwrap();

    assert_eq!(summary.previously_applied, 3);
    assert_eq!(summary.applied.len(), 1);
    assert_eq!(summary.applied[0].id, 3);
    assert!(table_exists(&db, "baz").await);
}

#[tokio::test]
async fn failed_migration_leaves_no_partial_state() {
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = quiet(vec![
        Migration::sql("create foo", "CREATE TABLE foo (id INT)"),
        Migration::sql(
            "half broken",
            "CREATE TABLE partial (id INT); INSERT INTO no_such_table VALUES (1)",
        ),
        Migration::sql("create later", "CREATE TABLE later (id INT)"),
    ]);

    let err = migrator.migrate(&db).await.unwrap_err();

    assert!(matches!(err, MigrateError::Migration { id: 1, .. }), "got {err:?}");
    assert_eq!(ledger(&db, "__migrations").await, vec![(0, "create foo".to_string())]);
    assert!(table_exists(&db, "foo").await);
    assert!(!table_exists(&db, "partial").await);
    assert!(!table_exists(&db, "later").await);
}

#[tokio::test]
async fn fixed_migration_resumes_at_failed_index() {
    let db = DuckDbBackend::in_memory().unwrap();
    let broken = quiet(vec![
        Migration::sql("create foo", "CREATE TABLE foo (id INT)"),
        Migration::sql("create bar", "CREATE TABLE bar (id INT"),
    ]);
    assert!(broken.migrate(&db).await.is_err());

    let fixed = quiet(vec![
        Migration::sql("create foo", "CREATE TABLE foo (id INT)"),
        Migration::sql("create bar", "CREATE TABLE bar (id INT)"),
    ]);
    let summary = fixed.migrate(&db).await.unwrap();

    assert_eq!(summary.previously_applied, 1);
    assert_eq!(summary.applied[0].name, "create bar");
}

#[tokio::test]
async fn too_many_applied_touches_nothing() {
    let db = DuckDbBackend::in_memory().unwrap();
    quiet(sample_migrations()).migrate(&db).await.unwrap();

    let shorter = quiet(vec![Migration::sql(
        "create foo",
        "CREATE TABLE foo (id INT PRIMARY KEY)",
    )]);
    let err = shorter.migrate(&db).await.unwrap_err();

    assert!(matches!(
        err,
        MigrateError::TooManyApplied {
            applied: 3,
            known: 1
        }
    ));
    assert_eq!(ledger(&db, "__migrations").await.len(), 3);
}

#[tokio::test]
async fn custom_table_name_is_used() {
    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = Migrator::builder()
        .migrations(sample_migrations())
        .table_name("custom_table_name")
        .logger(|_: &str, _: &LogFields| {})
        .build()
        .unwrap();

    migrator.migrate(&db).await.unwrap();

    assert_eq!(ledger(&db, "custom_table_name").await.len(), 3);
    assert!(!table_exists(&db, "__migrations").await);
}

#[tokio::test]
async fn pending_and_history_reflect_ledger() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut migrations = sample_migrations();
    migrations.truncate(1);
    quiet(migrations).migrate(&db).await.unwrap();

    let migrator = quiet(sample_migrations());
    let pending: Vec<&str> = migrator
        .pending(&db)
        .await
        .unwrap()
        .iter()
        .map(|m| m.name())
        .collect();
    assert_eq!(pending, vec!["create bar, alter bar", "fn: create foobar, insert"]);

    assert_eq!(
        migrator.history(&db).await.unwrap(),
        vec![LedgerEntry {
            id: 0,
            version: "create foo".to_string()
        }]
    );
    assert_eq!(migrator.count_applied(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn reordered_list_is_caught_by_history_check() {
    let db = DuckDbBackend::in_memory().unwrap();
    quiet(vec![Migration::sql("create foo", "CREATE TABLE foo (id INT)")])
        .migrate(&db)
        .await
        .unwrap();

    let reordered = quiet(vec![
        Migration::sql("create bar", "CREATE TABLE bar (id INT)"),
        Migration::sql("create foo", "CREATE TABLE foo (id INT)"),
    ]);
    let err = reordered.migrate(&db).await.unwrap_err();

    assert!(matches!(err, MigrateError::HistoryMismatch { id: 0, .. }));
    assert!(!table_exists(&db, "bar").await);
}

#[tokio::test]
async fn logger_sees_each_migration() {
    let db = DuckDbBackend::in_memory().unwrap();
    let names: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&names);
    let migrator = Migrator::builder()
        .migrations(sample_migrations())
        .logger(move |message: &str, fields: &LogFields| {
            if message == "applied migration" {
                let name = fields["name"].as_str().unwrap_or_default().to_string();
                sink.lock().unwrap().push(name);
            }
        })
        .build()
        .unwrap();

    migrator.migrate(&db).await.unwrap();

    assert_eq!(
        *names.lock().unwrap(),
        vec!["create foo", "create bar, alter bar", "fn: create foobar, insert"]
    );
}

#[tokio::test]
async fn progress_survives_reopening_database_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.duckdb");

    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        let mut first_two = sample_migrations();
        first_two.truncate(2);
        quiet(first_two).migrate(&db).await.unwrap();
    }

    let db = DuckDbBackend::from_path(&path).unwrap();
    let summary = quiet(sample_migrations()).migrate(&db).await.unwrap();
    assert_eq!(summary.previously_applied, 2);
    assert_eq!(summary.applied.len(), 1);
    assert_eq!(ledger(&db, "__migrations").await.len(), 3);
}

#[tokio::test]
async fn directory_migrations_apply_in_file_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("0002_seed.sql"),
        "INSERT INTO users (id) VALUES (1), (2);",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("0001_users.sql"),
        "CREATE TABLE users (id INT PRIMARY KEY);",
    )
    .unwrap();

    let db = DuckDbBackend::in_memory().unwrap();
    let migrator = quiet(load_migrations_from_dir(dir.path()).unwrap());
    migrator.migrate(&db).await.unwrap();

    assert_eq!(
        ledger(&db, "__migrations").await,
        vec![(0, "0001_users".to_string()), (1, "0002_seed".to_string())]
    );
    let row = db
        .query_row("SELECT COUNT(*) FROM users", &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get_i64(0).unwrap(), 2);
}

#[tokio::test]
async fn numeric_looking_names_survive_ledger_round_trip() {
    let names = ["001", "1.5", "true", "20240101"];
    let build = || {
        quiet(
            names
                .iter()
                .map(|name| Migration::sql(*name, "SELECT 1"))
                .collect(),
        )
    };
    let db = DuckDbBackend::in_memory().unwrap();

    let first = build().migrate(&db).await.unwrap();
    assert_eq!(first.applied.len(), 4);

    let migrator = build();
    let history: Vec<String> = migrator
        .history(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.version)
        .collect();
    assert_eq!(history, names);
    migrator.verify_history(&db).await.unwrap();

    let second = migrator.migrate(&db).await.unwrap();
    assert_eq!(second.previously_applied, 4);
    assert!(second.applied.is_empty());
}
