//! Ordered schema migrations for the dependency catalog.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per entry.
//! - Each migration commits together with its `user_version` bump, so a
//!   failure leaves the schema at the last fully applied version.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "library_catalog",
        sql: include_str!("0001_library_catalog.sql"),
    },
    Migration {
        version: 2,
        name: "applications",
        sql: include_str!("0002_applications.sql"),
    },
];

/// Schema versions before and after [`apply_migrations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub from_version: u32,
    pub to_version: u32,
}

impl MigrationOutcome {
    /// Returns whether the schema was already current.
    pub fn is_noop(&self) -> bool {
        self.from_version == self.to_version
    }
}

/// Highest schema version this build can migrate to.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the catalog schema up to [`latest_version`].
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the database is ahead of
///   this build.
/// - [`DbError::Migration`] naming the first migration that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationOutcome> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version);
    for migration in pending {
        run_migration(conn, migration)?;
    }

    let outcome = MigrationOutcome {
        from_version,
        to_version: current_user_version(conn)?,
    };
    if !outcome.is_noop() {
        info!(
            "event=db_migrate module=db status=ok from_version={} to_version={}",
            outcome.from_version, outcome.to_version
        );
    }
    Ok(outcome)
}

/// Reads the schema version mirrored in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn run_migration(conn: &mut Connection, migration: &Migration) -> DbResult<()> {
    let failed = |source: rusqlite::Error| DbError::Migration {
        version: migration.version,
        name: migration.name,
        source,
    };

    let tx = conn.transaction().map_err(failed)?;
    tx.execute_batch(migration.sql).map_err(failed)?;
    tx.pragma_update(None, "user_version", migration.version)
        .map_err(failed)?;
    tx.commit().map_err(failed)?;

    debug!(
        "event=db_migration_step module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}
