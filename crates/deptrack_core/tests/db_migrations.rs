use deptrack_core::db::migrations::{apply_migrations, latest_version, MigrationOutcome};
use deptrack_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "library_vendors",
        "libraries",
        "library_versions",
        "applications",
        "application_versions",
        "application_dependencies",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn open_db_enables_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deptrack.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO applications (name) VALUES ('Portal');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM applications;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn apply_migrations_reports_versions_and_is_noop_when_current() {
    let mut conn = Connection::open_in_memory().unwrap();

    let first = apply_migrations(&mut conn).unwrap();
    assert_eq!(
        first,
        MigrationOutcome {
            from_version: 0,
            to_version: latest_version()
        }
    );
    assert!(!first.is_noop());

    let second = apply_migrations(&mut conn).unwrap();
    assert!(second.is_noop());
    assert_eq!(second.to_version, latest_version());
}

#[test]
fn failed_migration_is_named_and_keeps_previous_version() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE library_vendors (id INTEGER PRIMARY KEY);")
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert!(matches!(
        err,
        DbError::Migration {
            version: 1,
            name: "library_catalog",
            ..
        }
    ));
    assert!(err.to_string().contains("library_catalog"));
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn migration_resumes_from_partially_migrated_database() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(include_str!(
        "../src/db/migrations/0001_library_catalog.sql"
    ))
    .unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();

    let outcome = apply_migrations(&mut conn).unwrap();
    assert_eq!(outcome.from_version, 1);
    assert_eq!(outcome.to_version, latest_version());
    assert_table_exists(&conn, "application_dependencies");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
