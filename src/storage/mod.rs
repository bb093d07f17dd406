//! `SQLite` storage for the folder log.
//!
//! This module provides:
//! - Connection management and migrations
//! - The append-only folder log
//! - The [`Ledger`] trait the router and debounce gate depend on

mod connection;
mod folder_logs;
mod ledger;
mod models;
mod schema;

pub use connection::Database;
pub use folder_logs::{
    count_folder_logs, insert_folder_log, latest_created_at, list_recent_folder_logs,
};
pub use ledger::Ledger;
pub use models::FolderLogEntry;
pub use schema::{migrate, verify_schema, SCHEMA_VERSION};

/// Initialize storage with migrations.
///
/// # Errors
///
/// Returns an error if database initialization fails.
pub fn init_storage(db: &Database) -> crate::Result<()> {
    db.with_conn(|conn| {
        migrate(conn)?;
        verify_schema(conn)?;

        tracing::info!("Storage initialized, schema version {SCHEMA_VERSION}");
        Ok(())
    })
}
