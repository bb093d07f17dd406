//! Application lifecycle.
//!
//! Registers the watch tree, runs the event router as a background task and
//! coordinates shutdown on SIGINT/SIGTERM with a bounded grace period.

use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::WatcherError;
use crate::notifier::Notifier;
use crate::storage::{Database, Ledger};
use crate::watcher::{
    register_tree_blocking, DebounceGate, EventRouter, FsEventSource, PathMatcher,
    RouterStatsSnapshot,
};
use crate::{Config, Result};

/// Lifecycle of the watcher process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, nothing watched yet.
    Idle,
    /// Tree registered, router consuming events.
    Running,
    /// Shutdown requested, waiting for the router.
    ShuttingDown,
    /// Router stopped or startup failed.
    Stopped,
}

/// Application: owns the configuration, the folder log and the notifier.
pub struct App<N> {
    config: Config,
    db: Database,
    notifier: N,
    state: watch::Sender<LifecycleState>,
}

impl<N: Notifier + 'static> App<N> {
    /// Create a new application.
    #[must_use]
    pub fn new(config: Config, db: Database, notifier: N) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self {
            config,
            db,
            notifier,
            state,
        }
    }

    /// Follow lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Run until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the event source cannot be created, the initial
    /// tree cannot be registered, or the event source closes on its own.
    pub async fn run(self) -> Result<RouterStatsSnapshot> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Same as [`App::run`].
    pub async fn run_until<F>(self, shutdown: F) -> Result<RouterStatsSnapshot>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            config,
            db,
            notifier,
            state,
        } = self;

        let result = Self::drive(&config, db, notifier, &state, shutdown).await;

        state.send_replace(LifecycleState::Stopped);
        match &result {
            Ok(_) => tracing::info!("Case watcher stopped"),
            Err(e) => tracing::error!(error = %e, "Case watcher stopped with error"),
        }
        result
    }

    async fn drive<F>(
        config: &Config,
        db: Database,
        notifier: N,
        state: &watch::Sender<LifecycleState>,
        shutdown: F,
    ) -> Result<RouterStatsSnapshot>
    where
        F: Future<Output = ()> + Send,
    {
        let source = FsEventSource::new()?;
        let (source, registered) =
            register_tree_blocking(source, config.watch_dir.clone()).await?;
        tracing::info!(
            root = %config.watch_dir.display(),
            registered = registered.len(),
            "Watching directory tree"
        );

        let ledger: Arc<dyn Ledger> = Arc::new(db);
        let gate = DebounceGate::from_mode(
            config.debounce_mode,
            config.effective_window(),
            Arc::clone(&ledger),
        );
        let matcher = PathMatcher::new(&config.case_pattern)?;
        let router = EventRouter::new(source, matcher, gate, ledger, notifier);
        let stats = router.stats();

        let cancel = CancellationToken::new();
        let mut task = tokio::spawn(router.run(cancel.clone()));
        state.send_replace(LifecycleState::Running);

        tokio::pin!(shutdown);
        tokio::select! {
            () = &mut shutdown => {}
            joined = &mut task => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Event router task failed");
                }
                return Err(WatcherError::SourceClosed.into());
            }
        }

        tracing::info!("Received interrupt signal, shutting down");
        state.send_replace(LifecycleState::ShuttingDown);
        cancel.cancel();

        match tokio::time::timeout(config.shutdown_grace, task).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Event router task failed during shutdown");
                Ok(stats.snapshot())
            }
            Err(_) => {
                tracing::warn!(
                    grace = ?config.shutdown_grace,
                    "Event router still busy after grace period, exiting anyway"
                );
                Ok(stats.snapshot())
            }
        }
    }
}

impl<N> std::fmt::Debug for App<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("watch_dir", &self.config.watch_dir)
            .field("db", &self.db)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::LogNotifier;
    use crate::storage::migrate;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| migrate(conn)).unwrap();
        db
    }

    #[test]
    fn test_new_app_is_idle() {
        let app = App::new(Config::default(), test_db(), LogNotifier);
        assert_eq!(*app.subscribe().borrow(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            watch_dir: tmp.path().join("does-not-exist"),
            ..Default::default()
        };
        let app = App::new(config, test_db(), LogNotifier);
        let state = app.subscribe();

        let result = app.run_until(std::future::pending()).await;

        assert!(result.is_err());
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_while_idle_reaches_stopped() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            watch_dir: tmp.path().to_path_buf(),
            shutdown_grace: Duration::from_secs(1),
            ..Default::default()
        };
        let app = App::new(config, test_db(), LogNotifier);
        let state = app.subscribe();
        let mut running = app.subscribe();

        let shutdown = async move {
            let _ = running
                .wait_for(|s| *s == LifecycleState::Running)
                .await;
        };

        let started = Instant::now();
        let snapshot = app.run_until(shutdown).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(snapshot.accepted, 0);
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }
}
