//! Handle to the folder log database.
//!
//! One connection is opened at startup and shared behind a
//! `parking_lot::Mutex`. The router is the only writer; the `history`
//! command only reads.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};

use crate::error::StorageError;
use crate::Result;

/// Label used in place of a path for in-memory databases.
const IN_MEMORY: &str = ":memory:";

/// Milliseconds `SQLite` waits on a locked database before failing.
const BUSY_TIMEOUT_MS: i64 = 5_000;

/// Shared folder log handle. Clones refer to the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

fn db_error(context: &str, e: &rusqlite::Error) -> StorageError {
    StorageError::Database(format!("{context}: {e}"))
}

impl Database {
    /// Open (or create) the folder log at `path`, creating missing parent
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened or tuned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| db_error("failed to open folder log", &e))?;

        Self::wrap(conn, path.to_string_lossy().into_owned())
    }

    /// Open a private in-memory folder log.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| db_error("failed to open in-memory folder log", &e))?;

        Self::wrap(conn, IN_MEMORY.to_string())
    }

    fn wrap(conn: Connection, path: String) -> Result<Self> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL; \
             PRAGMA synchronous = NORMAL; \
             PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))
        .map_err(|e| db_error("failed to tune folder log", &e))?;

        tracing::debug!(%path, "Folder log opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Run `f` while holding the connection lock.
    ///
    /// # Errors
    ///
    /// Propagates whatever `f` returns.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(&self.conn.lock())
    }

    /// Filesystem path, or `:memory:`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Round-trip a trivial query.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is unusable.
    pub fn health_check(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| db_error("health check failed", &e).into())
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn query_one<T: rusqlite::types::FromSql>(db: &Database, sql: &str) -> T {
        db.with_conn(|conn| {
            conn.query_row(sql, [], |row| row.get(0))
                .map_err(|e| db_error("query", &e).into())
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_is_usable() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.path(), IN_MEMORY);
        db.health_check().unwrap();
    }

    #[test]
    fn test_open_creates_data_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("created_folders.db");

        Database::open(&path).unwrap().health_check().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_database_uses_wal() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path().join("created_folders.db")).unwrap();

        let mode: String = query_one(&db, "PRAGMA journal_mode");
        assert_eq!(mode, "wal");

        let timeout: i64 = query_one(&db, "PRAGMA busy_timeout");
        assert_eq!(timeout, BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_clones_see_same_rows() {
        let writer = Database::open_in_memory().unwrap();
        writer
            .with_conn(|conn| {
                conn.execute_batch("CREATE TABLE cases (id INTEGER); INSERT INTO cases VALUES (7);")
                    .map_err(|e| db_error("setup", &e).into())
            })
            .unwrap();

        let reader = writer.clone();
        let value: i64 = query_one(&reader, "SELECT id FROM cases");
        assert_eq!(value, 7);
    }

    #[test]
    fn test_debug_shows_only_path() {
        let debug = format!("{:?}", Database::open_in_memory().unwrap());
        assert!(debug.contains(IN_MEMORY));
        assert!(!debug.contains("conn"));
    }
}
