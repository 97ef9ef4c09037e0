//! Third-party component records: vendors, libraries and their versions.

use serde::Serialize;

pub type LibraryVendorId = i64;
pub type LibraryId = i64;
pub type LibraryVersionId = i64;

/// Publisher grouping a set of libraries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LibraryVendor {
    pub id: LibraryVendorId,
    pub vendor: String,
}

/// Third-party component owned by one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Library {
    pub id: LibraryId,
    pub library_vendor_id: LibraryVendorId,
    pub library_name: String,
}

/// Specific released version of a [`Library`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LibraryVersion {
    pub id: LibraryVersionId,
    pub library_id: LibraryId,
    pub library_version: String,
}
