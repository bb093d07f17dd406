//! Recursive watch registration.
//!
//! Walks a directory tree and registers every directory with the event
//! source, since each one is watched non-recursively.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::source::EventSource;
use crate::error::WatcherError;
use crate::Result;

/// Register `root` and every directory below it.
///
/// The walk is depth-first, parents before children, and does not follow
/// symbolic links. Each directory is registered before its entries are read,
/// so a child created mid-walk is either seen by the walk or reported by the
/// parent's watch. The first walk or registration error stops the walk;
/// directories registered before the error stay registered.
///
/// Returns the directories that were not registered before, in walk order.
///
/// # Errors
///
/// Returns the first error hit while walking or registering.
pub fn register_tree<S: EventSource>(source: &mut S, root: &Path) -> Result<Vec<PathBuf>> {
    let mut added = Vec::new();
    register_tree_into(source, root, &mut added)?;
    Ok(added)
}

/// Same as [`register_tree`], but pushes newly registered directories onto
/// `added` as it goes, so they are kept even when the walk fails part way.
///
/// # Errors
///
/// Returns the first error hit while walking or registering.
pub fn register_tree_into<S: EventSource>(
    source: &mut S,
    root: &Path,
    added: &mut Vec<PathBuf>,
) -> Result<()> {
    let before = added.len();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| WatcherError::WalkFailed {
            path: e.path().unwrap_or(root).display().to_string(),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_dir() && source.register(entry.path())? {
            added.push(entry.into_path());
        }
    }

    tracing::debug!(
        root = %root.display(),
        registered = added.len() - before,
        "Registered directory tree"
    );

    Ok(())
}

/// Run [`register_tree`] on the blocking pool, handing the source back.
///
/// # Errors
///
/// Returns the walk or registration error, or an internal error if the
/// blocking task could not complete.
pub async fn register_tree_blocking<S>(mut source: S, root: PathBuf) -> Result<(S, Vec<PathBuf>)>
where
    S: EventSource + 'static,
{
    tokio::task::spawn_blocking(move || {
        let added = register_tree(&mut source, &root)?;
        Ok((source, added))
    })
    .await
    .map_err(|e| crate::Error::internal(format!("registration task failed: {e}")))?
}
