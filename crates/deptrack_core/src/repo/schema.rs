//! Connection readiness checks shared by all SQLite repositories.

use crate::db::migrations::{current_user_version, latest_version};
use crate::repo::application_repo::{RepoError, RepoResult};
use rusqlite::Connection;

/// Table name plus the columns a repository reads or writes.
pub(crate) type TableShape = (&'static str, &'static [&'static str]);

pub(crate) const LIBRARY_VENDORS: TableShape = ("library_vendors", &["id", "vendor"]);
pub(crate) const LIBRARIES: TableShape =
    ("libraries", &["id", "library_vendor_id", "library_name"]);
pub(crate) const LIBRARY_VERSIONS: TableShape =
    ("library_versions", &["id", "library_id", "library_version"]);
pub(crate) const APPLICATIONS: TableShape = ("applications", &["id", "name"]);
pub(crate) const APPLICATION_VERSIONS: TableShape =
    ("application_versions", &["id", "application_id", "version"]);
pub(crate) const APPLICATION_DEPENDENCIES: TableShape = (
    "application_dependencies",
    &["id", "application_version_id", "library_version_id"],
);

/// Rejects connections that were not opened through `db::open_db*` or that
/// lack the tables/columns the caller depends on.
pub(crate) fn ensure_connection_ready(conn: &Connection, shapes: &[TableShape]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in shapes {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
