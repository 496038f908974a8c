//! SQLite-backed implementation of the store contracts.
//!
//! # Invariants
//! - The wrapped connection is fully migrated (see `db::open_db`).
//! - Each repository call holds the connection for its whole duration, so
//!   check-then-write sequences inside one call are atomic.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| RepoError::Poisoned("sqlite connection"))?;
        f(&mut conn)
    }
}
