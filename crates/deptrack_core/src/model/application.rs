//! Application-side records.
//!
//! # Invariants
//! - An `ApplicationVersion` always belongs to exactly one `Application`.
//! - An `ApplicationDependency` links one application version to one
//!   library version.

use crate::model::library::LibraryVersionId;
use serde::Serialize;

pub type ApplicationId = i64;
pub type ApplicationVersionId = i64;
pub type ApplicationDependencyId = i64;

/// A software product tracked for dependency risk.
///
/// Ordering and equality are by `(id, name)`, so a `BTreeSet<Application>`
/// deduplicates rows loaded through different versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Application {
    pub id: ApplicationId,
    pub name: String,
}

/// A specific released version of an [`Application`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApplicationVersion {
    pub id: ApplicationVersionId,
    pub application_id: ApplicationId,
    pub version: String,
}

/// "This version of this app depends on this version of this library."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ApplicationDependency {
    pub id: ApplicationDependencyId,
    pub application_version_id: ApplicationVersionId,
    pub library_version_id: LibraryVersionId,
}
