//! Core data access for dependency tracking.
//!
//! Tracks which applications depend on which third-party library versions
//! and answers "who is affected" for a library version, a library or a
//! vendor.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::application::{
    Application, ApplicationDependency, ApplicationDependencyId, ApplicationId,
    ApplicationVersion, ApplicationVersionId,
};
pub use model::library::{
    Library, LibraryId, LibraryVendor, LibraryVendorId, LibraryVersion, LibraryVersionId,
};
pub use model::{normalize_label, ModelValidationError};
pub use repo::application_repo::{
    ApplicationRepository, RepoError, RepoResult, ScopeMatches, SearchScope,
    SqliteApplicationRepository,
};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::dependency_repo::{DependencyRepository, SqliteDependencyRepository};
pub use service::application_service::{
    ApplicationService, ApplicationServiceError, ImpactReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
