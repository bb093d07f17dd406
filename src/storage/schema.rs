//! Folder log schema and its versioned migrations.

use rusqlite::{params, Connection};

use crate::error::StorageError;
use crate::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Ordered `(version, description, sql)` steps. Applied ones are skipped.
const MIGRATIONS: &[(i32, &str, &str)] = &[(
    1,
    "folder log",
    r"
    CREATE TABLE IF NOT EXISTS folder_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        folder_name TEXT NOT NULL,
        created_at INTEGER NOT NULL  -- unix millis
    );

    CREATE INDEX IF NOT EXISTS idx_folder_logs_created_at ON folder_logs(created_at);
    ",
)];

fn migration_error(context: &str, e: &rusqlite::Error) -> StorageError {
    StorageError::Migration(format!("{context}: {e}"))
}

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns an error if any pending step fails to apply.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )
    .map_err(|e| migration_error("failed to create migrations table", &e))?;

    let applied = applied_version(conn)?;
    tracing::info!(
        current = applied,
        target = SCHEMA_VERSION,
        "Checking folder log migrations"
    );

    for &(version, description, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > applied) {
        tracing::info!(version, description, "Applying migration");

        conn.execute_batch(sql)
            .map_err(|e| migration_error(&format!("migration v{version} failed"), &e))?;
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, chrono::Utc::now().timestamp()],
        )
        .map_err(|e| migration_error("failed to record migration", &e))?;
    }

    Ok(())
}

fn applied_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| migration_error("failed to read schema version", &e).into())
}

/// Verify that the expected tables exist.
///
/// # Errors
///
/// Returns an error if a table is missing.
pub fn verify_schema(conn: &Connection) -> Result<()> {
    for table in ["schema_migrations", "folder_logs"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table],
                |row| row.get(0),
            )
            .map_err(|e| migration_error("failed to inspect schema", &e))?;

        if !exists {
            return Err(StorageError::Migration(format!("missing table '{table}'")).into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_migrate_creates_tables() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            migrate(conn)?;
            verify_schema(conn)
        })
        .unwrap();
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            migrate(conn)?;
            migrate(conn)?;
            assert_eq!(applied_version(conn)?, SCHEMA_VERSION);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_verify_schema_fails_before_migration() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(verify_schema);
        assert!(result.is_err());
    }
}
