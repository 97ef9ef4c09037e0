use deptrack_core::db::open_db_in_memory;
use deptrack_core::{
    ApplicationRepository, CatalogRepository, DependencyRepository, RepoError, SearchScope,
    SqliteApplicationRepository, SqliteCatalogRepository, SqliteDependencyRepository,
};
use rusqlite::Connection;

#[test]
fn create_search_and_delete_inside_caller_transaction() {
    let mut conn = open_db_in_memory().unwrap();
    let tx = conn.transaction().unwrap();
    let catalog = SqliteCatalogRepository::try_new(&tx).unwrap();
    let apps = SqliteApplicationRepository::try_new(&tx).unwrap();
    let deps = SqliteDependencyRepository::try_new(&tx).unwrap();

    let vendor = catalog.create_vendor("Apache").unwrap();
    let library = catalog.create_library(vendor.id, "commons-io").unwrap();
    let lib_version = catalog.create_library_version(library.id, "2.4").unwrap();

    let portal = apps.create_application("Portal", "1.0").unwrap();
    let portal_v2 = apps.add_application_version(portal.id, "2.0").unwrap();
    deps.add_dependency(portal_v2.id, lib_version.id).unwrap();
    let billing = apps.create_application("Billing", "1.0").unwrap();
    let billing_v1 = apps.list_application_versions(billing.id).unwrap()[0].clone();
    deps.add_dependency(billing_v1.id, lib_version.id).unwrap();

    let matches = apps.search_scope(SearchScope::Vendor(vendor.id)).unwrap();
    assert_eq!(matches.applications.len(), 2);
    assert_eq!(matches.versions, vec![portal_v2, billing_v1.clone()]);
    assert_eq!(apps.search_applications(lib_version.id).unwrap().len(), 2);

    apps.delete_application(portal.id).unwrap();
    assert!(!tx.is_autocommit());
    tx.commit().unwrap();

    let apps = SqliteApplicationRepository::try_new(&conn).unwrap();
    let names: Vec<String> = apps
        .list_applications()
        .unwrap()
        .into_iter()
        .map(|application| application.name)
        .collect();
    assert_eq!(names, vec!["Billing"]);
    assert_eq!(
        apps.search_application_versions(lib_version.id).unwrap(),
        vec![billing_v1]
    );
    assert_eq!(count_rows(&conn, "application_dependencies"), 1);
}

#[test]
fn dropping_caller_transaction_discards_repository_writes() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let tx = conn.transaction().unwrap();
        let apps = SqliteApplicationRepository::try_new(&tx).unwrap();
        let portal = apps.create_application("Portal", "1.0").unwrap();
        apps.add_application_version(portal.id, "2.0").unwrap();
    }

    assert!(conn.is_autocommit());
    assert_eq!(count_rows(&conn, "applications"), 0);
    assert_eq!(count_rows(&conn, "application_versions"), 0);
}

#[test]
fn failed_write_leaves_caller_transaction_usable() {
    let mut conn = open_db_in_memory().unwrap();
    let tx = conn.transaction().unwrap();
    let apps = SqliteApplicationRepository::try_new(&tx).unwrap();
    let deps = SqliteDependencyRepository::try_new(&tx).unwrap();

    let portal = apps.create_application("Portal", "1.0").unwrap();
    let portal_v1 = apps.list_application_versions(portal.id).unwrap()[0].clone();

    let err = deps.add_dependency(portal_v1.id, 404).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: "library version",
            id: 404
        }
    ));
    let err = apps.delete_application(9_999).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: 9_999, .. }));

    apps.add_application_version(portal.id, "2.0").unwrap();
    tx.commit().unwrap();

    assert_eq!(count_rows(&conn, "applications"), 1);
    assert_eq!(count_rows(&conn, "application_versions"), 2);
    assert_eq!(count_rows(&conn, "application_dependencies"), 0);
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
