//! Application use-case service.
//!
//! # Responsibility
//! - Provide register/rename/delete/list entry points for applications.
//! - Assemble dependency impact reports for a library version, a library or
//!   a vendor.
//!
//! # Invariants
//! - Input labels are normalized before any repository call.
//! - Write use-cases read the application back after persisting it.
//! - Both halves of an impact report come from one read snapshot.

use crate::model::application::{Application, ApplicationId, ApplicationVersion};
use crate::model::{normalize_label, ModelValidationError};
use crate::repo::application_repo::{
    ApplicationRepository, RepoError, ScopeMatches, SearchScope,
};
use log::info;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for application use-cases.
#[derive(Debug)]
pub enum ApplicationServiceError {
    /// Caller input failed validation.
    InvalidInput(ModelValidationError),
    /// Target application does not exist.
    ApplicationNotFound(ApplicationId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ApplicationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::ApplicationNotFound(id) => write!(f, "application not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent application state: {details}")
            }
        }
    }
}

impl Error for ApplicationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for ApplicationServiceError {
    fn from(value: ModelValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for ApplicationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "application",
                id,
            } => Self::ApplicationNotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

/// Everything depending on one search scope, at both granularities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactReport {
    /// Scope the report was computed for.
    pub scope: SearchScope,
    /// Distinct affected applications.
    pub applications: BTreeSet<Application>,
    /// Affected application versions sorted by id.
    pub versions: Vec<ApplicationVersion>,
}

impl ImpactReport {
    /// Returns whether nothing depends on the scope.
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty() && self.versions.is_empty()
    }
}

/// Application service facade over repository implementations.
pub struct ApplicationService<R: ApplicationRepository> {
    repo: R,
}

impl<R: ApplicationRepository> ApplicationService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers an application with its first version.
    pub fn register_application(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Application, ApplicationServiceError> {
        let name = normalize_label("application name", name)?;
        let version = normalize_label("application version", version)?;

        let created = self.repo.create_application(&name, &version)?;
        info!(
            "event=application_register module=service status=ok application_id={}",
            created.id
        );
        self.repo
            .get_application(created.id)?
            .ok_or(ApplicationServiceError::InconsistentState(
                "created application not found in read-back",
            ))
    }

    /// Renames an application and returns the stored row.
    pub fn rename_application(
        &self,
        id: ApplicationId,
        name: &str,
    ) -> Result<Application, ApplicationServiceError> {
        let name = normalize_label("application name", name)?;
        self.repo.update_application(id, &name)?;
        self.repo
            .get_application(id)?
            .ok_or(ApplicationServiceError::InconsistentState(
                "renamed application not found in read-back",
            ))
    }

    /// Deletes an application with its versions and dependencies.
    pub fn delete_application(&self, id: ApplicationId) -> Result<(), ApplicationServiceError> {
        self.repo.delete_application(id)?;
        Ok(())
    }

    /// Lists all applications sorted by name.
    pub fn list_applications(&self) -> Result<Vec<Application>, ApplicationServiceError> {
        Ok(self.repo.list_applications()?)
    }

    /// Lists versions of one existing application.
    pub fn list_versions(
        &self,
        id: ApplicationId,
    ) -> Result<Vec<ApplicationVersion>, ApplicationServiceError> {
        if self.repo.get_application(id)?.is_none() {
            return Err(ApplicationServiceError::ApplicationNotFound(id));
        }
        Ok(self.repo.list_application_versions(id)?)
    }

    /// Collects applications and versions depending on `scope`.
    pub fn impact(&self, scope: SearchScope) -> Result<ImpactReport, ApplicationServiceError> {
        let ScopeMatches {
            applications,
            versions,
        } = self.repo.search_scope(scope)?;
        info!(
            "event=impact_report module=service status=ok scope={:?} applications={} versions={}",
            scope,
            applications.len(),
            versions.len()
        );
        Ok(ImpactReport {
            scope,
            applications,
            versions,
        })
    }
}
