//! Event source abstraction and the notify-rs backed implementation.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::events::RawEvent;
use crate::error::WatcherError;
use crate::Result;

/// Item yielded by an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    /// A filesystem event, in delivery order.
    Event(RawEvent),
    /// An error reported on the source's side channel.
    Error(String),
}

/// Ordered stream of filesystem events with per-directory registration.
pub trait EventSource: Send {
    /// Start delivering events for `path` (not its subdirectories).
    ///
    /// Returns `false` if `path` was already registered, in which case
    /// nothing changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be watched.
    fn register(&mut self, path: &Path) -> Result<bool>;

    /// Stop treating `path` and everything below it as registered, after it
    /// vanished. The platform watch is left as is; a directory created again
    /// at the same path registers afresh.
    fn forget(&mut self, path: &Path);

    /// Wait for the next item. `None` means the source is closed.
    fn next(&mut self) -> impl Future<Output = Option<SourceItem>> + Send;

    /// Stop delivering events and release the underlying handle.
    fn close(&mut self);
}

/// Event source backed by the platform watcher (inotify, `FSEvents`, ...).
///
/// Every directory is registered non-recursively; the registrar and router
/// decide what gets watched.
pub struct FsEventSource {
    watcher: Option<RecommendedWatcher>,
    events: mpsc::UnboundedReceiver<RawEvent>,
    errors: mpsc::UnboundedReceiver<notify::Error>,
    watched: HashSet<PathBuf>,
}

impl FsEventSource {
    /// Create a new source with nothing registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be created.
    pub fn new() -> Result<Self> {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();

        // notify calls this from its own thread; it cannot await.
        let watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => {
                    for raw in RawEvent::from_notify(&event) {
                        let _ = event_tx.send(raw);
                    }
                }
                Err(e) => {
                    let _ = error_tx.send(e);
                }
            }
        })
        .map_err(|e| WatcherError::WatchFailed {
            path: "init".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            watcher: Some(watcher),
            events,
            errors,
            watched: HashSet::new(),
        })
    }

    /// Whether the watcher handle has been released.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.watcher.is_none()
    }
}

impl EventSource for FsEventSource {
    fn register(&mut self, path: &Path) -> Result<bool> {
        let Some(watcher) = self.watcher.as_mut() else {
            return Err(WatcherError::watch_failed(path, "event source closed").into());
        };

        if self.watched.contains(path) {
            return Ok(false);
        }

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::watch_failed(path, e))?;

        self.watched.insert(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Watching directory");

        Ok(true)
    }

    fn forget(&mut self, path: &Path) {
        let before = self.watched.len();
        self.watched.retain(|dir| !dir.starts_with(path));

        let dropped = before - self.watched.len();
        if dropped > 0 {
            tracing::debug!(path = %path.display(), dropped, "Forgot vanished directories");
        }
    }

    async fn next(&mut self) -> Option<SourceItem> {
        tokio::select! {
            biased;
            event = self.events.recv() => event.map(SourceItem::Event),
            Some(err) = self.errors.recv() => Some(SourceItem::Error(err.to_string())),
        }
    }

    fn close(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            drop(watcher);
            tracing::info!(watched = self.watched.len(), "Event source closed");
        }
    }
}

impl std::fmt::Debug for FsEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsEventSource")
            .field("watched", &self.watched.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
