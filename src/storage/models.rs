//! Data models for storage operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded case folder creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderLogEntry {
    /// Database primary key, `None` until inserted.
    pub id: Option<i64>,

    /// Full path of the created folder.
    pub folder_name: String,

    /// When the creation was accepted.
    pub created_at: DateTime<Utc>,
}

impl FolderLogEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(folder_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            folder_name: folder_name.into(),
            created_at,
        }
    }

    /// Base name of the folder, the part after the last separator.
    #[must_use]
    pub fn base_name(&self) -> &str {
        std::path::Path::new(&self.folder_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.folder_name)
    }
}
