//! Library catalog repository: vendors, libraries and library versions.
//!
//! # Responsibility
//! - Persist the library side of the dependency graph.
//!
//! # Invariants
//! - A library is only created under an existing vendor, a library version
//!   only under an existing library.
//! - Vendor and library listings are sorted by name, versions by id.

use crate::model::library::{
    Library, LibraryId, LibraryVendor, LibraryVendorId, LibraryVersion, LibraryVersionId,
};
use crate::model::normalize_label;
use crate::repo::application_repo::{RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, LIBRARIES, LIBRARY_VENDORS, LIBRARY_VERSIONS};
use crate::repo::scope::in_write_scope;
use rusqlite::{params, Connection, Row};

/// Repository interface for the library catalog.
pub trait CatalogRepository {
    fn create_vendor(&self, vendor: &str) -> RepoResult<LibraryVendor>;
    fn create_library(
        &self,
        vendor_id: LibraryVendorId,
        library_name: &str,
    ) -> RepoResult<Library>;
    fn create_library_version(
        &self,
        library_id: LibraryId,
        library_version: &str,
    ) -> RepoResult<LibraryVersion>;
    fn list_vendors(&self) -> RepoResult<Vec<LibraryVendor>>;
    fn list_libraries(&self, vendor_id: LibraryVendorId) -> RepoResult<Vec<Library>>;
    fn list_library_versions(&self, library_id: LibraryId) -> RepoResult<Vec<LibraryVersion>>;
    fn get_library_version(&self, id: LibraryVersionId) -> RepoResult<Option<LibraryVersion>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[LIBRARY_VENDORS, LIBRARIES, LIBRARY_VERSIONS])?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_vendor(&self, vendor: &str) -> RepoResult<LibraryVendor> {
        let vendor = normalize_label("vendor", vendor)?;
        self.conn.execute(
            "INSERT INTO library_vendors (vendor) VALUES (?1);",
            [vendor.as_str()],
        )?;
        Ok(LibraryVendor {
            id: self.conn.last_insert_rowid(),
            vendor,
        })
    }

    fn create_library(
        &self,
        vendor_id: LibraryVendorId,
        library_name: &str,
    ) -> RepoResult<Library> {
        let library_name = normalize_label("library name", library_name)?;

        let id = in_write_scope(self.conn, |conn| {
            if !row_exists(conn, "library_vendors", vendor_id)? {
                return Err(RepoError::NotFound {
                    entity: "library vendor",
                    id: vendor_id,
                });
            }
            conn.execute(
                "INSERT INTO libraries (library_vendor_id, library_name) VALUES (?1, ?2);",
                params![vendor_id, library_name.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(Library {
            id,
            library_vendor_id: vendor_id,
            library_name,
        })
    }

    fn create_library_version(
        &self,
        library_id: LibraryId,
        library_version: &str,
    ) -> RepoResult<LibraryVersion> {
        let library_version = normalize_label("library version", library_version)?;

        let id = in_write_scope(self.conn, |conn| {
            if !row_exists(conn, "libraries", library_id)? {
                return Err(RepoError::NotFound {
                    entity: "library",
                    id: library_id,
                });
            }
            conn.execute(
                "INSERT INTO library_versions (library_id, library_version) VALUES (?1, ?2);",
                params![library_id, library_version.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        Ok(LibraryVersion {
            id,
            library_id,
            library_version,
        })
    }

    fn list_vendors(&self) -> RepoResult<Vec<LibraryVendor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, vendor FROM library_vendors ORDER BY vendor ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut vendors = Vec::new();
        while let Some(row) = rows.next()? {
            vendors.push(LibraryVendor {
                id: row.get("id")?,
                vendor: row.get("vendor")?,
            });
        }
        Ok(vendors)
    }

    fn list_libraries(&self, vendor_id: LibraryVendorId) -> RepoResult<Vec<Library>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, library_vendor_id, library_name
             FROM libraries
             WHERE library_vendor_id = ?1
             ORDER BY library_name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([vendor_id])?;
        let mut libraries = Vec::new();
        while let Some(row) = rows.next()? {
            libraries.push(Library {
                id: row.get("id")?,
                library_vendor_id: row.get("library_vendor_id")?,
                library_name: row.get("library_name")?,
            });
        }
        Ok(libraries)
    }

    fn list_library_versions(&self, library_id: LibraryId) -> RepoResult<Vec<LibraryVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, library_id, library_version
             FROM library_versions
             WHERE library_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([library_id])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(parse_library_version_row(row)?);
        }
        Ok(versions)
    }

    fn get_library_version(&self, id: LibraryVersionId) -> RepoResult<Option<LibraryVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, library_id, library_version
             FROM library_versions
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_library_version_row(row)?));
        }
        Ok(None)
    }
}

fn parse_library_version_row(row: &Row<'_>) -> RepoResult<LibraryVersion> {
    Ok(LibraryVersion {
        id: row.get("id")?,
        library_id: row.get("library_id")?,
        library_version: row.get("library_version")?,
    })
}

/// Checks for a row by primary key. `table` must be a trusted literal.
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
