//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for applications, the library catalog and
//!   dependency links.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes normalize labels before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Repositories only accept fully migrated connections.
//! - Operations join a transaction the caller already holds on the
//!   connection instead of opening a nested one.

pub mod application_repo;
pub mod catalog_repo;
pub mod dependency_repo;
mod schema;
mod scope;
