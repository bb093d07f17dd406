//! Event router: the single consumer of the event source.
//!
//! For every creation event it registers new directories, matches the base
//! name, consults the debounce gate and, on admission, appends to the ledger
//! and sends the notification. Events are handled strictly one at a time in
//! delivery order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio_util::sync::CancellationToken;

use super::debounce::{Clock, DebounceGate, SystemClock};
use super::events::{is_real_dir, OpKind, RawEvent};
use super::matcher::PathMatcher;
use super::registrar::register_tree_into;
use super::source::{EventSource, SourceItem};
use crate::notifier::{compose_message, Notifier};
use crate::storage::Ledger;

/// Counters for routed events.
#[derive(Debug, Default)]
pub struct RouterStats {
    pub events_received: AtomicU64,
    pub creations: AtomicU64,
    pub dirs_registered: AtomicU64,
    pub unmatched: AtomicU64,
    pub suppressed: AtomicU64,
    pub accepted: AtomicU64,
    pub notifications_sent: AtomicU64,
    pub errors: AtomicU64,
}

impl RouterStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> RouterStatsSnapshot {
        RouterStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            creations: self.creations.load(Ordering::Relaxed),
            dirs_registered: self.dirs_registered.load(Ordering::Relaxed),
            unmatched: self.unmatched.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of router stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStatsSnapshot {
    pub events_received: u64,
    pub creations: u64,
    pub dirs_registered: u64,
    pub unmatched: u64,
    pub suppressed: u64,
    pub accepted: u64,
    pub notifications_sent: u64,
    pub errors: u64,
}

/// What the router did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a creation.
    Ignored,
    /// Creation of something other than a directory.
    NotADirectory,
    /// Directory already registered, so an earlier walk routed it.
    AlreadySeen,
    /// Creation whose name is not a case folder.
    Unmatched,
    /// Case folder inside the debounce window.
    Suppressed,
    /// Case folder logged and notified.
    Accepted,
}

/// Consumes raw events and dispatches accepted case folders.
pub struct EventRouter<S, N> {
    source: S,
    matcher: PathMatcher,
    gate: DebounceGate,
    ledger: Arc<dyn Ledger>,
    notifier: N,
    clock: Arc<dyn Clock>,
    stats: Arc<RouterStats>,
}

impl<S: EventSource, N: Notifier> EventRouter<S, N> {
    /// Create a router over an already populated event source.
    #[must_use]
    pub fn new(
        source: S,
        matcher: PathMatcher,
        gate: DebounceGate,
        ledger: Arc<dyn Ledger>,
        notifier: N,
    ) -> Self {
        Self {
            source,
            matcher,
            gate,
            ledger,
            notifier,
            clock: Arc::new(SystemClock),
            stats: RouterStats::new(),
        }
    }

    /// Replace the clock used for debounce decisions and timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Shared handle to the router's counters.
    #[must_use]
    pub fn stats(&self) -> Arc<RouterStats> {
        Arc::clone(&self.stats)
    }

    /// Run until `cancel` fires or the source closes.
    ///
    /// The source is closed on the way out, whichever way the loop ends.
    pub async fn run(mut self, cancel: CancellationToken) -> RouterStatsSnapshot {
        tracing::info!(window = ?self.gate.window(), "Event router started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!("Stopping watcher");
                    break;
                }
                item = self.source.next() => match item {
                    Some(SourceItem::Event(event)) => {
                        self.handle_event(event).await;
                    }
                    Some(SourceItem::Error(reason)) => {
                        RouterStats::bump(&self.stats.errors);
                        tracing::error!(%reason, "Event source error");
                    }
                    None => {
                        tracing::warn!("Event source closed, router exiting");
                        break;
                    }
                },
            }
        }

        self.source.close();

        let snapshot = self.stats.snapshot();
        tracing::info!(
            received = snapshot.events_received,
            accepted = snapshot.accepted,
            suppressed = snapshot.suppressed,
            errors = snapshot.errors,
            "Event router stopped"
        );
        snapshot
    }

    /// Route a single event.
    ///
    /// A new directory is registered together with its subtree first. The
    /// directories that walk finds below it were created before their parent
    /// was watched, so they are routed right after the directory itself, in
    /// walk order.
    pub async fn handle_event(&mut self, event: RawEvent) -> Outcome {
        RouterStats::bump(&self.stats.events_received);

        if matches!(event.kind, OpKind::Remove | OpKind::Rename) && !is_real_dir(&event.path) {
            self.source.forget(&event.path);
        }

        let Some(case) = event.into_case() else {
            return Outcome::Ignored;
        };
        RouterStats::bump(&self.stats.creations);

        if !case.is_dir() {
            tracing::trace!(path = %case.path.display(), "Created entry is not a directory");
            return Outcome::NotADirectory;
        }

        let (fresh, found) = self.register_new_dir(&case.path);

        let outcome = if fresh {
            self.route(&case.path).await
        } else {
            tracing::trace!(path = %case.path.display(), "Directory already routed by a walk");
            Outcome::AlreadySeen
        };

        for dir in found {
            self.route(&dir).await;
        }

        outcome
    }

    /// Registers `dir` and its subtree. Returns whether `dir` itself was
    /// new, and the newly registered directories below it.
    fn register_new_dir(&mut self, dir: &Path) -> (bool, Vec<PathBuf>) {
        let mut added = Vec::new();
        let result = register_tree_into(&mut self.source, dir, &mut added);

        self.stats
            .dirs_registered
            .fetch_add(added.len() as u64, Ordering::Relaxed);

        let target_added = added.first().is_some_and(|p| p == dir);
        let fresh = match result {
            Ok(()) => target_added,
            Err(e) => {
                RouterStats::bump(&self.stats.errors);
                tracing::warn!(path = %dir.display(), error = %e, "Failed to watch new directory");
                // Registering the directory itself failed; it still counts.
                target_added || added.is_empty()
            }
        };

        if target_added {
            added.remove(0);
        }
        (fresh, added)
    }

    /// Match, gate and dispatch one new directory.
    async fn route(&mut self, dir: &Path) -> Outcome {
        let Some(name) = dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| self.matcher.matches(n))
        else {
            RouterStats::bump(&self.stats.unmatched);
            tracing::trace!(path = %dir.display(), "Not a case folder");
            return Outcome::Unmatched;
        };
        let name = name.to_string();

        let now = self.clock.now();
        if !self.gate.admit(now) {
            RouterStats::bump(&self.stats.suppressed);
            tracing::debug!(
                folder = %name,
                window = ?self.gate.window(),
                "Case folder inside debounce window, skipped"
            );
            return Outcome::Suppressed;
        }

        RouterStats::bump(&self.stats.accepted);
        self.dispatch(dir, &name, now).await;
        Outcome::Accepted
    }

    async fn dispatch(&self, dir: &Path, name: &str, now: DateTime<Utc>) {
        let folder = dir.display().to_string();
        tracing::info!(folder = %folder, at = %now.to_rfc3339(), "New case folder created");

        if let Err(e) = self.ledger.append_entry(&folder, now) {
            RouterStats::bump(&self.stats.errors);
            tracing::error!(folder = %folder, error = %e, "Failed to write folder log");
        }

        let message = compose_message(name, &now.with_timezone(&Local));
        match self.notifier.deliver(&message).await {
            Ok(()) => RouterStats::bump(&self.stats.notifications_sent),
            Err(e) => {
                RouterStats::bump(&self.stats.errors);
                tracing::error!(folder = %folder, error = %e, "Failed to send notification");
            }
        }
    }
}

impl<S, N> std::fmt::Debug for EventRouter<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("matcher", &self.matcher)
            .field("gate", &self.gate)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
