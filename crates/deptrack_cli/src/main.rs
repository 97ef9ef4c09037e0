//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `deptrack_core` linkage and storage bootstrap.
//! - Print the application inventory of a catalog database.
//!
//! Environment:
//! - `DEPTRACK_DB`: database file; an empty in-memory catalog when unset.
//! - `DEPTRACK_LOG_DIR`: absolute log directory; logging stays off when unset.
//! - `DEPTRACK_LOG_LEVEL`: log level, defaults to the build-mode default.

use deptrack_core::db::{open_db, open_db_in_memory};
use deptrack_core::{
    core_version, default_log_level, init_logging, ApplicationService,
    SqliteApplicationRepository,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("deptrack: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("DEPTRACK_LOG_DIR") {
        let level = std::env::var("DEPTRACK_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    println!("deptrack_core version={}", core_version());

    let conn = match std::env::var("DEPTRACK_DB") {
        Ok(path) => open_db(path)?,
        Err(_) => open_db_in_memory()?,
    };
    let service = ApplicationService::new(SqliteApplicationRepository::try_new(&conn)?);

    let applications = service.list_applications()?;
    info!(
        "event=cli_inventory module=cli status=ok applications={}",
        applications.len()
    );
    println!("applications={}", applications.len());
    for application in applications {
        let versions = service
            .list_versions(application.id)?
            .into_iter()
            .map(|version| version.version)
            .collect::<Vec<_>>();
        println!(
            "{}\t{}\t{}",
            application.id,
            application.name,
            versions.join(",")
        );
    }

    Ok(())
}
