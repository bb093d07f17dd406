//! Ledger abstraction over the folder log.
//!
//! The router appends through this trait and the persistent debounce gate
//! reads the last timestamp through it, so both can be swapped in tests.

use chrono::{DateTime, Utc};

use super::connection::Database;
use super::folder_logs::{insert_folder_log, latest_created_at};
use super::models::FolderLogEntry;
use crate::Result;

/// Durable append-only record of accepted case folders.
pub trait Ledger: Send + Sync {
    /// Append an entry for `name` accepted at `at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be persisted.
    fn append_entry(&self, name: &str, at: DateTime<Utc>) -> Result<()>;

    /// Timestamp of the newest entry, `None` if nothing was logged yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    fn last_timestamp(&self) -> Result<Option<DateTime<Utc>>>;
}

impl Ledger for Database {
    fn append_entry(&self, name: &str, at: DateTime<Utc>) -> Result<()> {
        let entry = FolderLogEntry::new(name, at);
        let id = self.with_conn(|conn| insert_folder_log(conn, &entry))?;
        tracing::debug!(id, folder = %name, "Folder log entry written");
        Ok(())
    }

    fn last_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        self.with_conn(latest_created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{count_folder_logs, migrate};

    #[test]
    fn test_database_ledger_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| migrate(conn)).unwrap();

        assert!(db.last_timestamp().unwrap().is_none());

        let at = Utc::now();
        db.append_entry("/cases/F-2025-001", at).unwrap();

        let last = db.last_timestamp().unwrap().unwrap();
        assert_eq!(last.timestamp_millis(), at.timestamp_millis());
        assert_eq!(db.with_conn(count_folder_logs).unwrap(), 1);
    }

    #[test]
    fn test_append_fails_without_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.append_entry("/cases/A123", Utc::now()).is_err());
    }
}
