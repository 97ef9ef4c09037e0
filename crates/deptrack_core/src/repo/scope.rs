//! Transaction scoping for repository operations.
//!
//! # Invariants
//! - On an autocommit connection each operation owns one transaction.
//! - Inside a caller-held transaction operations join it: reads run
//!   directly, writes run under a savepoint so a failed operation undoes
//!   only its own statements and leaves the caller's transaction usable.

use crate::repo::application_repo::RepoResult;
use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};

const WRITE_SAVEPOINT: &str = "deptrack_write";

/// Runs `work` atomically, joining the caller's transaction when one is open.
pub(crate) fn in_write_scope<T, F>(conn: &Connection, work: F) -> RepoResult<T>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    if conn.is_autocommit() {
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let value = work(&*tx)?;
        tx.commit()?;
        return Ok(value);
    }

    conn.execute_batch(&format!("SAVEPOINT {WRITE_SAVEPOINT};"))?;
    match work(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {WRITE_SAVEPOINT};"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.execute_batch(&format!(
                "ROLLBACK TO {WRITE_SAVEPOINT}; RELEASE {WRITE_SAVEPOINT};"
            )) {
                warn!(
                    "event=savepoint_rollback module=repo status=error error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

/// Runs several reads against one snapshot, joining the caller's
/// transaction when one is open.
pub(crate) fn in_read_scope<T, F>(conn: &Connection, work: F) -> RepoResult<T>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    if !conn.is_autocommit() {
        return work(conn);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let value = work(&*tx)?;
    tx.commit()?;
    Ok(value)
}
