use deptrack_core::db::open_db_in_memory;
use deptrack_core::{
    Application, ApplicationId, ApplicationRepository, ApplicationService,
    ApplicationServiceError, ApplicationVersion, CatalogRepository, DependencyRepository,
    ModelValidationError, RepoResult, ScopeMatches, SearchScope, SqliteApplicationRepository,
    SqliteCatalogRepository, SqliteDependencyRepository,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::collections::BTreeSet;

#[test]
fn register_application_reads_back_normalized_row() {
    let conn = open_db_in_memory().unwrap();
    let service = ApplicationService::new(SqliteApplicationRepository::try_new(&conn).unwrap());

    let created = service.register_application(" Portal ", " 1.0 ").unwrap();
    assert_eq!(created.name, "Portal");

    let versions = service.list_versions(created.id).unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version, "1.0");
}

#[test]
fn register_application_rejects_blank_input() {
    let conn = open_db_in_memory().unwrap();
    let service = ApplicationService::new(SqliteApplicationRepository::try_new(&conn).unwrap());

    let err = service.register_application("Portal", "  ").unwrap_err();
    assert!(matches!(
        err,
        ApplicationServiceError::InvalidInput(ModelValidationError::EmptyField(
            "application version"
        ))
    ));
    assert!(service.list_applications().unwrap().is_empty());
}

#[test]
fn rename_and_delete_map_missing_rows_to_application_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ApplicationService::new(SqliteApplicationRepository::try_new(&conn).unwrap());

    let portal = service.register_application("Portal", "1.0").unwrap();
    let renamed = service.rename_application(portal.id, "Customer Portal").unwrap();
    assert_eq!(renamed.name, "Customer Portal");

    service.delete_application(portal.id).unwrap();

    let err = service.rename_application(portal.id, "Again").unwrap_err();
    assert!(matches!(err, ApplicationServiceError::ApplicationNotFound(id) if id == portal.id));
    let err = service.delete_application(portal.id).unwrap_err();
    assert!(matches!(err, ApplicationServiceError::ApplicationNotFound(id) if id == portal.id));
    let err = service.list_versions(portal.id).unwrap_err();
    assert!(matches!(err, ApplicationServiceError::ApplicationNotFound(_)));
}

#[test]
fn impact_report_combines_application_and_version_views() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();
    let deps = SqliteDependencyRepository::try_new(&conn).unwrap();
    let repo = SqliteApplicationRepository::try_new(&conn).unwrap();

    let vendor = catalog.create_vendor("Apache").unwrap();
    let library = catalog.create_library(vendor.id, "commons-io").unwrap();
    let v24 = catalog.create_library_version(library.id, "2.4").unwrap();
    let v25 = catalog.create_library_version(library.id, "2.5").unwrap();

    let portal = repo.create_application("Portal", "1.0").unwrap();
    let portal_v1 = repo.list_application_versions(portal.id).unwrap()[0].clone();
    let portal_v2 = repo.add_application_version(portal.id, "2.0").unwrap();
    deps.add_dependency(portal_v1.id, v24.id).unwrap();
    deps.add_dependency(portal_v2.id, v25.id).unwrap();

    let service = ApplicationService::new(repo);

    let report = service.impact(SearchScope::Vendor(vendor.id)).unwrap();
    assert_eq!(report.scope, SearchScope::Vendor(vendor.id));
    assert_eq!(report.applications.len(), 1);
    assert!(report.applications.contains(&portal));
    assert_eq!(report.versions, vec![portal_v1, portal_v2.clone()]);

    let report = service.impact(SearchScope::LibraryVersion(v25.id)).unwrap();
    assert_eq!(report.versions, vec![portal_v2]);

    let orphan = catalog.create_library_version(library.id, "3.0").unwrap();
    let report = service.impact(SearchScope::LibraryVersion(orphan.id)).unwrap();
    assert!(report.is_empty());
}

/// Delegates to SQLite and records which search entry points were used.
struct RecordingRepository<'conn> {
    inner: SqliteApplicationRepository<'conn>,
    calls: Rc<RefCell<Vec<&'static str>>>,
}

impl RecordingRepository<'_> {
    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

impl ApplicationRepository for RecordingRepository<'_> {
    fn list_applications(&self) -> RepoResult<Vec<Application>> {
        self.inner.list_applications()
    }

    fn get_application(&self, id: ApplicationId) -> RepoResult<Option<Application>> {
        self.inner.get_application(id)
    }

    fn create_application(&self, name: &str, version: &str) -> RepoResult<Application> {
        self.inner.create_application(name, version)
    }

    fn update_application(&self, id: ApplicationId, name: &str) -> RepoResult<()> {
        self.inner.update_application(id, name)
    }

    fn delete_application(&self, id: ApplicationId) -> RepoResult<()> {
        self.inner.delete_application(id)
    }

    fn list_application_versions(
        &self,
        application_id: ApplicationId,
    ) -> RepoResult<Vec<ApplicationVersion>> {
        self.inner.list_application_versions(application_id)
    }

    fn add_application_version(
        &self,
        application_id: ApplicationId,
        version: &str,
    ) -> RepoResult<ApplicationVersion> {
        self.inner.add_application_version(application_id, version)
    }

    fn search_scope_applications(&self, scope: SearchScope) -> RepoResult<BTreeSet<Application>> {
        self.record("applications");
        self.inner.search_scope_applications(scope)
    }

    fn search_scope_application_versions(
        &self,
        scope: SearchScope,
    ) -> RepoResult<Vec<ApplicationVersion>> {
        self.record("versions");
        self.inner.search_scope_application_versions(scope)
    }

    fn search_scope(&self, scope: SearchScope) -> RepoResult<ScopeMatches> {
        self.record("scope");
        self.inner.search_scope(scope)
    }
}

#[test]
fn impact_reads_both_views_through_one_scope_search() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&conn).unwrap();
    let deps = SqliteDependencyRepository::try_new(&conn).unwrap();
    let inner = SqliteApplicationRepository::try_new(&conn).unwrap();

    let vendor = catalog.create_vendor("Apache").unwrap();
    let library = catalog.create_library(vendor.id, "log4j").unwrap();
    let v12 = catalog.create_library_version(library.id, "1.2").unwrap();
    let portal = inner.create_application("Portal", "1.0").unwrap();
    let portal_v1 = inner.list_application_versions(portal.id).unwrap()[0].clone();
    deps.add_dependency(portal_v1.id, v12.id).unwrap();

    let calls = Rc::new(RefCell::new(Vec::new()));
    let service = ApplicationService::new(RecordingRepository {
        inner,
        calls: Rc::clone(&calls),
    });
    let report = service.impact(SearchScope::Library(library.id)).unwrap();
    assert!(report.applications.contains(&portal));
    assert_eq!(report.versions, vec![portal_v1]);

    assert_eq!(*calls.borrow(), vec!["scope"]);
}
