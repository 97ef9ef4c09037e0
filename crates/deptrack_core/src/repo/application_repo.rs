//! Application repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `applications` and their versions.
//! - Answer "which applications depend on X" by walking
//!   `application_versions -> application_dependencies -> library_versions
//!   -> libraries -> library_vendors`.
//!
//! # Invariants
//! - Multi-statement operations are atomic and join a caller-held
//!   transaction when one is open.
//! - Application deletion removes dependencies, then versions, then the
//!   application row. Foreign keys reject any other order.
//! - Searches bind exactly one key; the traversal runs as a subquery so
//!   scope size never reaches SQLite's bind-variable limit.
//! - Write paths normalize labels before SQL mutations.

use crate::db::DbError;
use crate::model::application::{
    Application, ApplicationId, ApplicationVersion, ApplicationVersionId,
};
use crate::model::library::{LibraryId, LibraryVendorId, LibraryVersionId};
use crate::model::{normalize_label, ModelValidationError};
use crate::repo::schema::{
    ensure_connection_ready, APPLICATIONS, APPLICATION_DEPENDENCIES, APPLICATION_VERSIONS,
    LIBRARIES, LIBRARY_VERSIONS,
};
use crate::repo::scope::{in_read_scope, in_write_scope};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Input label failed validation before reaching SQL.
    Validation(ModelValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No row of `entity` has the given id.
    NotFound { entity: &'static str, id: i64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Starting point of a dependency traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// One library version.
    LibraryVersion(LibraryVersionId),
    /// Every version of one library.
    Library(LibraryId),
    /// Every version of every library published by one vendor.
    Vendor(LibraryVendorId),
}

impl SearchScope {
    /// Subquery selecting ids of application versions that depend on any
    /// library version in scope, keyed on `?1`.
    fn dependent_versions_sql(self) -> &'static str {
        match self {
            Self::LibraryVersion(_) => {
                "SELECT d.application_version_id
                 FROM application_dependencies d
                 WHERE d.library_version_id = ?1"
            }
            Self::Library(_) => {
                "SELECT d.application_version_id
                 FROM application_dependencies d
                 INNER JOIN library_versions lv ON lv.id = d.library_version_id
                 WHERE lv.library_id = ?1"
            }
            Self::Vendor(_) => {
                "SELECT d.application_version_id
                 FROM application_dependencies d
                 INNER JOIN library_versions lv ON lv.id = d.library_version_id
                 INNER JOIN libraries l ON l.id = lv.library_id
                 WHERE l.library_vendor_id = ?1"
            }
        }
    }

    fn key(self) -> i64 {
        match self {
            Self::LibraryVersion(id) | Self::Library(id) | Self::Vendor(id) => id,
        }
    }
}

/// Both search forms for one scope, read from the same snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeMatches {
    /// Distinct dependent applications.
    pub applications: BTreeSet<Application>,
    /// Dependent application versions ordered by id.
    pub versions: Vec<ApplicationVersion>,
}

/// Repository interface for application CRUD and dependency search.
pub trait ApplicationRepository {
    /// Lists all applications sorted by name ascending.
    fn list_applications(&self) -> RepoResult<Vec<Application>>;
    /// Loads one application by id.
    fn get_application(&self, id: ApplicationId) -> RepoResult<Option<Application>>;
    /// Creates an application together with its initial version.
    fn create_application(&self, name: &str, version: &str) -> RepoResult<Application>;
    /// Renames one application.
    fn update_application(&self, id: ApplicationId, name: &str) -> RepoResult<()>;
    /// Deletes one application with all its versions and their dependencies.
    fn delete_application(&self, id: ApplicationId) -> RepoResult<()>;
    /// Lists versions of one application sorted by id.
    fn list_application_versions(
        &self,
        application_id: ApplicationId,
    ) -> RepoResult<Vec<ApplicationVersion>>;
    /// Adds another version to an existing application.
    fn add_application_version(
        &self,
        application_id: ApplicationId,
        version: &str,
    ) -> RepoResult<ApplicationVersion>;
    /// Distinct applications depending on any library version in `scope`.
    fn search_scope_applications(&self, scope: SearchScope) -> RepoResult<BTreeSet<Application>>;
    /// Application versions depending on any library version in `scope`.
    fn search_scope_application_versions(
        &self,
        scope: SearchScope,
    ) -> RepoResult<Vec<ApplicationVersion>>;
    /// Both search forms for `scope` in one read transaction.
    fn search_scope(&self, scope: SearchScope) -> RepoResult<ScopeMatches>;

    /// Applications depending on one library version.
    fn search_applications(
        &self,
        library_version_id: LibraryVersionId,
    ) -> RepoResult<BTreeSet<Application>> {
        self.search_scope_applications(SearchScope::LibraryVersion(library_version_id))
    }

    /// Application versions depending on one library version.
    fn search_application_versions(
        &self,
        library_version_id: LibraryVersionId,
    ) -> RepoResult<Vec<ApplicationVersion>> {
        self.search_scope_application_versions(SearchScope::LibraryVersion(library_version_id))
    }

    /// Applications depending on any version of one library.
    fn search_applications_by_library(
        &self,
        library_id: LibraryId,
    ) -> RepoResult<BTreeSet<Application>> {
        self.search_scope_applications(SearchScope::Library(library_id))
    }

    /// Application versions depending on any version of one library.
    fn search_application_versions_by_library(
        &self,
        library_id: LibraryId,
    ) -> RepoResult<Vec<ApplicationVersion>> {
        self.search_scope_application_versions(SearchScope::Library(library_id))
    }

    /// Applications depending on any library of one vendor.
    fn coarse_search_applications(
        &self,
        vendor_id: LibraryVendorId,
    ) -> RepoResult<BTreeSet<Application>> {
        self.search_scope_applications(SearchScope::Vendor(vendor_id))
    }

    /// Application versions depending on any library of one vendor.
    fn coarse_search_application_versions(
        &self,
        vendor_id: LibraryVendorId,
    ) -> RepoResult<Vec<ApplicationVersion>> {
        self.search_scope_application_versions(SearchScope::Vendor(vendor_id))
    }
}

/// SQLite-backed application repository.
pub struct SqliteApplicationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteApplicationRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                APPLICATIONS,
                APPLICATION_VERSIONS,
                APPLICATION_DEPENDENCIES,
                LIBRARY_VERSIONS,
                LIBRARIES,
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ApplicationRepository for SqliteApplicationRepository<'_> {
    fn list_applications(&self) -> RepoResult<Vec<Application>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM applications ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut applications = Vec::new();
        while let Some(row) = rows.next()? {
            applications.push(parse_application_row(row)?);
        }
        Ok(applications)
    }

    fn get_application(&self, id: ApplicationId) -> RepoResult<Option<Application>> {
        load_application(self.conn, id)
    }

    fn create_application(&self, name: &str, version: &str) -> RepoResult<Application> {
        let name = normalize_label("application name", name)?;
        let version = normalize_label("application version", version)?;

        let id = in_write_scope(self.conn, |conn| {
            conn.execute("INSERT INTO applications (name) VALUES (?1);", [name.as_str()])?;
            let id = conn.last_insert_rowid();
            conn.execute(
                "INSERT INTO application_versions (application_id, version) VALUES (?1, ?2);",
                params![id, version.as_str()],
            )?;
            Ok(id)
        })?;

        debug!("event=application_create module=repo status=ok application_id={id}");
        Ok(Application { id, name })
    }

    fn update_application(&self, id: ApplicationId, name: &str) -> RepoResult<()> {
        let name = normalize_label("application name", name)?;

        let changed = self.conn.execute(
            "UPDATE applications SET name = ?2 WHERE id = ?1;",
            params![id, name.as_str()],
        )?;
        if changed == 0 {
            return Err(not_found_application(id));
        }
        Ok(())
    }

    fn delete_application(&self, id: ApplicationId) -> RepoResult<()> {
        let (removed_versions, removed_dependencies) = in_write_scope(self.conn, |conn| {
            if load_application(conn, id)?.is_none() {
                return Err(not_found_application(id));
            }

            let version_ids = application_version_ids(conn, id)?;
            let mut removed_dependencies = 0;
            for version_id in &version_ids {
                removed_dependencies += conn.execute(
                    "DELETE FROM application_dependencies WHERE application_version_id = ?1;",
                    [version_id],
                )?;
                conn.execute("DELETE FROM application_versions WHERE id = ?1;", [version_id])?;
            }
            conn.execute("DELETE FROM applications WHERE id = ?1;", [id])?;
            Ok((version_ids.len(), removed_dependencies))
        })?;

        info!(
            "event=application_delete module=repo status=ok application_id={} versions={} dependencies={}",
            id, removed_versions, removed_dependencies
        );
        Ok(())
    }

    fn list_application_versions(
        &self,
        application_id: ApplicationId,
    ) -> RepoResult<Vec<ApplicationVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, application_id, version
             FROM application_versions
             WHERE application_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([application_id])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(parse_application_version_row(row)?);
        }
        Ok(versions)
    }

    fn add_application_version(
        &self,
        application_id: ApplicationId,
        version: &str,
    ) -> RepoResult<ApplicationVersion> {
        let version = normalize_label("application version", version)?;

        let id = in_write_scope(self.conn, |conn| {
            if load_application(conn, application_id)?.is_none() {
                return Err(not_found_application(application_id));
            }
            conn.execute(
                "INSERT INTO application_versions (application_id, version) VALUES (?1, ?2);",
                params![application_id, version.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(ApplicationVersion {
            id,
            application_id,
            version,
        })
    }

    fn search_scope_applications(&self, scope: SearchScope) -> RepoResult<BTreeSet<Application>> {
        let applications = dependent_applications(self.conn, scope)?;
        if applications.is_empty() {
            debug!("event=application_search module=repo status=empty scope={scope:?}");
        }
        Ok(applications)
    }

    fn search_scope_application_versions(
        &self,
        scope: SearchScope,
    ) -> RepoResult<Vec<ApplicationVersion>> {
        let versions = dependent_versions(self.conn, scope)?;
        if versions.is_empty() {
            debug!("event=application_version_search module=repo status=empty scope={scope:?}");
        }
        Ok(versions)
    }

    fn search_scope(&self, scope: SearchScope) -> RepoResult<ScopeMatches> {
        let matches = in_read_scope(self.conn, |conn| {
            Ok(ScopeMatches {
                applications: dependent_applications(conn, scope)?,
                versions: dependent_versions(conn, scope)?,
            })
        })?;
        debug!(
            "event=scope_search module=repo status=ok scope={:?} applications={} versions={}",
            scope,
            matches.applications.len(),
            matches.versions.len()
        );
        Ok(matches)
    }
}

fn dependent_applications(
    conn: &Connection,
    scope: SearchScope,
) -> RepoResult<BTreeSet<Application>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT a.id AS id, a.name AS name
         FROM applications a
         INNER JOIN application_versions av ON av.application_id = a.id
         WHERE av.id IN ({});",
        scope.dependent_versions_sql()
    ))?;
    let mut rows = stmt.query([scope.key()])?;
    let mut applications = BTreeSet::new();
    while let Some(row) = rows.next()? {
        applications.insert(parse_application_row(row)?);
    }
    Ok(applications)
}

fn dependent_versions(conn: &Connection, scope: SearchScope) -> RepoResult<Vec<ApplicationVersion>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, application_id, version
         FROM application_versions
         WHERE id IN ({})
         ORDER BY id ASC;",
        scope.dependent_versions_sql()
    ))?;
    let mut rows = stmt.query([scope.key()])?;
    let mut versions = Vec::new();
    while let Some(row) = rows.next()? {
        versions.push(parse_application_version_row(row)?);
    }
    Ok(versions)
}

fn application_version_ids(
    conn: &Connection,
    application_id: ApplicationId,
) -> RepoResult<Vec<ApplicationVersionId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM application_versions
         WHERE application_id = ?1
         ORDER BY id ASC;",
    )?;
    let mut rows = stmt.query([application_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn load_application(conn: &Connection, id: ApplicationId) -> RepoResult<Option<Application>> {
    let application = conn
        .query_row(
            "SELECT id, name FROM applications WHERE id = ?1;",
            [id],
            |row| {
                Ok(Application {
                    id: row.get("id")?,
                    name: row.get("name")?,
                })
            },
        )
        .optional()?;
    Ok(application)
}

fn parse_application_row(row: &Row<'_>) -> RepoResult<Application> {
    Ok(Application {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

fn parse_application_version_row(row: &Row<'_>) -> RepoResult<ApplicationVersion> {
    Ok(ApplicationVersion {
        id: row.get("id")?,
        application_id: row.get("application_id")?,
        version: row.get("version")?,
    })
}

fn not_found_application(id: ApplicationId) -> RepoError {
    RepoError::NotFound {
        entity: "application",
        id,
    }
}
