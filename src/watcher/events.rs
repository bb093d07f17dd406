//! File system event types.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;

/// Operation reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Create,
    Write,
    Remove,
    Rename,
    Chmod,
}

impl OpKind {
    /// Map a notify event kind onto an operation.
    ///
    /// A move into a watched directory counts as a creation there, the same
    /// way inotify-based tools report `IN_MOVED_TO`. Access events carry no
    /// operation and map to `None`.
    #[must_use]
    pub fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                Some(Self::Create)
            }
            EventKind::Modify(ModifyKind::Name(_)) => Some(Self::Rename),
            EventKind::Modify(ModifyKind::Metadata(_)) => Some(Self::Chmod),
            EventKind::Modify(_) => Some(Self::Write),
            EventKind::Remove(_) => Some(Self::Remove),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        }
    }
}

/// A single path/operation pair from the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Affected path.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: OpKind,
}

impl RawEvent {
    /// Create a new event.
    pub fn new(path: impl Into<PathBuf>, kind: OpKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Split a notify event into one raw event per path.
    #[must_use]
    pub fn from_notify(event: &notify::Event) -> Vec<Self> {
        let Some(kind) = OpKind::from_notify(&event.kind) else {
            return Vec::new();
        };

        event
            .paths
            .iter()
            .map(|path| Self::new(path.clone(), kind))
            .collect()
    }

    /// Narrow to a creation, the only operation the router acts on.
    #[must_use]
    pub fn into_case(self) -> Option<CaseEvent> {
        (self.kind == OpKind::Create).then_some(CaseEvent { path: self.path })
    }
}

/// A creation event that passed the operation filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseEvent {
    /// Created path.
    pub path: PathBuf,
}

impl CaseEvent {
    /// Base name of the created path, if it is valid UTF-8.
    #[must_use]
    pub fn base_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Whether the created path is a directory. Symlinks are not followed.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        is_real_dir(&self.path)
    }
}

/// Directory check that does not follow symbolic links.
pub(crate) fn is_real_dir(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use tempfile::TempDir;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            OpKind::from_notify(&EventKind::Create(CreateKind::Folder)),
            Some(OpKind::Create)
        );
        assert_eq!(
            OpKind::from_notify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(OpKind::Create)
        );
        assert_eq!(
            OpKind::from_notify(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(OpKind::Rename)
        );
        assert_eq!(
            OpKind::from_notify(&EventKind::Modify(ModifyKind::Metadata(
                MetadataKind::Permissions
            ))),
            Some(OpKind::Chmod)
        );
        assert_eq!(
            OpKind::from_notify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(OpKind::Write)
        );
        assert_eq!(
            OpKind::from_notify(&EventKind::Remove(RemoveKind::Folder)),
            Some(OpKind::Remove)
        );
        assert_eq!(
            OpKind::from_notify(&EventKind::Access(AccessKind::Any)),
            None
        );
    }

    #[test]
    fn test_from_notify_splits_paths() {
        let event = notify::Event::new(EventKind::Create(CreateKind::Any))
            .add_path(PathBuf::from("/cases/A123"))
            .add_path(PathBuf::from("/cases/A124"));

        let raw = RawEvent::from_notify(&event);
        assert_eq!(
            raw,
            vec![
                RawEvent::new("/cases/A123", OpKind::Create),
                RawEvent::new("/cases/A124", OpKind::Create),
            ]
        );
    }

    #[test]
    fn test_into_case_filters_non_create() {
        assert!(RawEvent::new("/cases/A123", OpKind::Write)
            .into_case()
            .is_none());

        let case = RawEvent::new("/cases/A123", OpKind::Create)
            .into_case()
            .unwrap();
        assert_eq!(case.base_name(), Some("A123"));
    }

    #[test]
    fn test_is_dir_checks_filesystem() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("F-2025-001");
        std::fs::create_dir(&dir).unwrap();
        let file = tmp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(CaseEvent { path: dir }.is_dir());
        assert!(!CaseEvent { path: file }.is_dir());
        assert!(!CaseEvent {
            path: tmp.path().join("missing")
        }
        .is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_is_dir_does_not_follow_symlinks() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = tmp.path().join("A123");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(!is_real_dir(&link));
    }
}
