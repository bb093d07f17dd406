//! Folder log storage.
//!
//! Append-only history of accepted case folders. Timestamps are stored as
//! unix milliseconds so sub-second debounce windows can be checked.

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::models::FolderLogEntry;
use crate::error::StorageError;
use crate::Result;

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        StorageError::Database(format!("timestamp out of range: {millis}")).into()
    })
}

/// Insert a folder log entry.
///
/// Returns the new row id.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn insert_folder_log(conn: &Connection, entry: &FolderLogEntry) -> Result<i64> {
    conn.execute(
        "INSERT INTO folder_logs (folder_name, created_at) VALUES (?, ?)",
        rusqlite::params![entry.folder_name, entry.created_at.timestamp_millis()],
    )
    .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(conn.last_insert_rowid())
}

/// Timestamp of the most recent entry, `None` when the log is empty.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn latest_created_at(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let result = conn.query_row(
        "SELECT created_at FROM folder_logs ORDER BY created_at DESC, id DESC LIMIT 1",
        [],
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(millis) => from_millis(millis).map(Some),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::Database(e.to_string()).into()),
    }
}

/// List the most recent entries, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_recent_folder_logs(conn: &Connection, limit: usize) -> Result<Vec<FolderLogEntry>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let mut stmt = conn
        .prepare(
            "SELECT id, folder_name, created_at FROM folder_logs
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .map_err(|e| StorageError::Database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    rows.into_iter()
        .map(|(id, folder_name, millis)| {
            Ok(FolderLogEntry {
                id: Some(id),
                folder_name,
                created_at: from_millis(millis)?,
            })
        })
        .collect()
}

/// Count logged folders.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_folder_logs(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM folder_logs", [], |row| row.get(0))
        .map_err(|e| StorageError::Database(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{migrate, Database};
    use chrono::Duration;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| migrate(conn)).unwrap();
        db
    }

    #[test]
    fn test_insert_and_count() {
        let db = setup_db();

        db.with_conn(|conn| {
            assert_eq!(count_folder_logs(conn)?, 0);

            let id = insert_folder_log(conn, &FolderLogEntry::new("/cases/F-2025-001", Utc::now()))?;
            assert!(id > 0);
            insert_folder_log(conn, &FolderLogEntry::new("/cases/A123", Utc::now()))?;

            assert_eq!(count_folder_logs(conn)?, 2);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_latest_created_at_empty() {
        let db = setup_db();
        let latest = db.with_conn(latest_created_at).unwrap();
        assert!(latest.is_none());
    }

    #[test]
    fn test_latest_created_at_keeps_millis() {
        let db = setup_db();
        let base = DateTime::from_timestamp_millis(1_740_000_000_123).unwrap();

        db.with_conn(|conn| {
            insert_folder_log(conn, &FolderLogEntry::new("/cases/B001", base))?;
            insert_folder_log(
                conn,
                &FolderLogEntry::new("/cases/B002", base + Duration::milliseconds(450)),
            )?;
            // Out-of-order insert must not win.
            insert_folder_log(
                conn,
                &FolderLogEntry::new("/cases/B000", base - Duration::seconds(5)),
            )?;

            let latest = latest_created_at(conn)?.unwrap();
            assert_eq!(latest, base + Duration::milliseconds(450));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_list_recent_newest_first() {
        let db = setup_db();
        let base = Utc::now();

        db.with_conn(|conn| {
            for (i, name) in ["C001", "C002", "C003"].iter().enumerate() {
                let at = base + Duration::seconds(i64::try_from(i).unwrap());
                insert_folder_log(conn, &FolderLogEntry::new(format!("/cases/{name}"), at))?;
            }

            let recent = list_recent_folder_logs(conn, 2)?;
            assert_eq!(recent.len(), 2);
            assert_eq!(recent[0].base_name(), "C003");
            assert_eq!(recent[1].base_name(), "C002");
            assert!(recent.iter().all(|e| e.id.is_some()));
            Ok(())
        })
        .unwrap();
    }
}
