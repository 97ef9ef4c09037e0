//! Application dependency links between application and library versions.
//!
//! # Invariants
//! - A dependency references exactly one existing application version and
//!   one existing library version; both are checked in the same write scope
//!   as the insert.

use crate::model::application::{
    ApplicationDependency, ApplicationDependencyId, ApplicationVersionId,
};
use crate::model::library::LibraryVersionId;
use crate::repo::application_repo::{RepoError, RepoResult};
use crate::repo::catalog_repo::row_exists;
use crate::repo::schema::{
    ensure_connection_ready, APPLICATION_DEPENDENCIES, APPLICATION_VERSIONS, LIBRARY_VERSIONS,
};
use crate::repo::scope::in_write_scope;
use rusqlite::{params, Connection};

/// Repository interface for dependency links.
pub trait DependencyRepository {
    /// Records that `application_version_id` depends on `library_version_id`.
    fn add_dependency(
        &self,
        application_version_id: ApplicationVersionId,
        library_version_id: LibraryVersionId,
    ) -> RepoResult<ApplicationDependency>;
    /// Removes one dependency link.
    fn remove_dependency(&self, id: ApplicationDependencyId) -> RepoResult<()>;
    /// Lists dependency links of one application version sorted by id.
    fn list_dependencies(
        &self,
        application_version_id: ApplicationVersionId,
    ) -> RepoResult<Vec<ApplicationDependency>>;
}

/// SQLite-backed dependency repository.
pub struct SqliteDependencyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDependencyRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[APPLICATION_DEPENDENCIES, APPLICATION_VERSIONS, LIBRARY_VERSIONS],
        )?;
        Ok(Self { conn })
    }
}

impl DependencyRepository for SqliteDependencyRepository<'_> {
    fn add_dependency(
        &self,
        application_version_id: ApplicationVersionId,
        library_version_id: LibraryVersionId,
    ) -> RepoResult<ApplicationDependency> {
        let id = in_write_scope(self.conn, |conn| {
            if !row_exists(conn, "application_versions", application_version_id)? {
                return Err(RepoError::NotFound {
                    entity: "application version",
                    id: application_version_id,
                });
            }
            if !row_exists(conn, "library_versions", library_version_id)? {
                return Err(RepoError::NotFound {
                    entity: "library version",
                    id: library_version_id,
                });
            }

            conn.execute(
                "INSERT INTO application_dependencies (application_version_id, library_version_id)
                 VALUES (?1, ?2);",
                params![application_version_id, library_version_id],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(ApplicationDependency {
            id,
            application_version_id,
            library_version_id,
        })
    }

    fn remove_dependency(&self, id: ApplicationDependencyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM application_dependencies WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "application dependency",
                id,
            });
        }
        Ok(())
    }

    fn list_dependencies(
        &self,
        application_version_id: ApplicationVersionId,
    ) -> RepoResult<Vec<ApplicationDependency>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, application_version_id, library_version_id
             FROM application_dependencies
             WHERE application_version_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([application_version_id])?;
        let mut dependencies = Vec::new();
        while let Some(row) = rows.next()? {
            dependencies.push(ApplicationDependency {
                id: row.get("id")?,
                application_version_id: row.get("application_version_id")?,
                library_version_id: row.get("library_version_id")?,
            });
        }
        Ok(dependencies)
    }
}
