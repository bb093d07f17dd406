//! Error types and Result aliases for case-watcher.
//!
//! Startup failures propagate out of `main`. Per-event failures inside the
//! router are logged and counted instead of being returned.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for case-watcher operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database/storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Notification delivery error.
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// `SQLite` database error.
    #[error("database error: {0}")]
    Database(String),

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to register a path with the event source.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Failed while walking the directory tree.
    #[error("failed to walk '{path}': {reason}")]
    WalkFailed { path: String, reason: String },

    /// The event source stopped delivering events.
    #[error("event source closed")]
    SourceClosed,
}

/// Notification transport errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP client could not be built.
    #[error("failed to build client: {0}")]
    Client(String),

    /// Request could not be sent.
    #[error("request failed: {0}")]
    Request(String),

    /// Endpoint answered with something other than 200 OK.
    #[error("received non-OK response: {status} {reason}")]
    Status { status: u16, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl WatcherError {
    /// Create a watch failure for `path`.
    pub fn watch_failed(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::WatchFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
