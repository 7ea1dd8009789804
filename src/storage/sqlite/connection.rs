//! Connection handling for the `SQLite` store.

use crate::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// How long `SQLite` waits on a locked database before failing, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Helper to acquire mutex lock with poison recovery.
///
/// A panic while the lock was held leaves the connection itself usable, so the
/// inner value is recovered and a warning logged.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Opens an existing database file for reading and writing.
///
/// The file is never created: the database belongs to another application and
/// a mistyped path should fail instead of producing an empty database.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the file does not exist or cannot be
/// opened.
pub fn open_existing(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags).map_err(|e| Error::OperationFailed {
        operation: "open_sqlite".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}

/// Configures a connection for the store.
///
/// Only sets `busy_timeout`. Journal mode and other persistent settings of the
/// owning application's database are left alone.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the pragma cannot be applied.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)
        .map_err(|e| Error::OperationFailed {
            operation: "configure_sqlite".to_string(),
            cause: e.to_string(),
        })
}
