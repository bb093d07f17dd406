//! Case Watcher - new case folder notifier
//!
//! Entry point for the watcher and the folder log viewer.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::time::Duration;

use case_watcher::config::DebounceMode;
use case_watcher::notifier::{HttpNotifier, LogNotifier};
use case_watcher::observability::init_tracing;
use case_watcher::storage::{init_storage, list_recent_folder_logs, Database};
use case_watcher::watcher::DEFAULT_CASE_PATTERN;
use case_watcher::{App, Config, Error, Result};
use clap::{Parser, Subcommand};

/// Case Watcher - notifies when new case folders appear
#[derive(Parser, Debug)]
#[command(name = "case-watcher")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory to watch
    #[arg(short, long, env = "CASE_WATCHER_DIR", default_value = ".")]
    watch_dir: PathBuf,

    /// Data directory for the `SQLite` folder log
    #[arg(short, long, env = "CASE_WATCHER_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CASE_WATCHER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "CASE_WATCHER_LOG_JSON")]
    log_json: bool,

    /// Pattern a folder name must match in full
    #[arg(long, env = "CASE_WATCHER_PATTERN", default_value = DEFAULT_CASE_PATTERN)]
    pattern: String,

    /// Debounce gate (off, memory, ledger)
    #[arg(long, default_value_t = DebounceMode::Memory)]
    debounce_mode: DebounceMode,

    /// Debounce window in milliseconds
    #[arg(long, default_value = "1000")]
    debounce_ms: u64,

    /// Notification endpoint; notifications are only logged when unset
    #[arg(long, env = "CASE_WATCHER_NOTIFY_URL")]
    notify_url: Option<String>,

    /// API key sent with each notification
    #[arg(long, env = "CASE_WATCHER_API_KEY", hide_env_values = true)]
    notify_api_key: Option<String>,

    /// Notification request timeout in seconds
    #[arg(long, default_value = "10")]
    notify_timeout_secs: u64,

    /// Shutdown grace period in milliseconds
    #[arg(long, default_value = "1000")]
    shutdown_grace_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the directory tree (default)
    Watch,
    /// Print the most recent folder log entries
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!(
        "Case Watcher v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config {
        watch_dir: cli.watch_dir,
        data_dir: cli.data_dir,
        log_level: cli.log_level,
        case_pattern: cli.pattern,
        debounce_mode: cli.debounce_mode,
        debounce_window: Duration::from_millis(cli.debounce_ms),
        notify_url: cli.notify_url,
        notify_api_key: cli.notify_api_key,
        notify_timeout: Duration::from_secs(cli.notify_timeout_secs),
        shutdown_grace: Duration::from_millis(cli.shutdown_grace_ms),
    };

    tracing::debug!(
        watch_dir = %config.watch_dir.display(),
        data_dir = %config.data_dir.display(),
        pattern = %config.case_pattern,
        window = ?config.debounce_window,
        notify_url = ?config.notify_url,
        "Configuration loaded"
    );

    config.validate()?;

    let db = Database::open(config.database_path())?;
    init_storage(&db)?;
    db.health_check()?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(config, db).await,
        Command::History { limit, json } => history(&db, limit, json),
    }
}

async fn watch(config: Config, db: Database) -> Result<()> {
    tracing::info!(
        root = %config.watch_dir.display(),
        debounce = %config.debounce_mode,
        "Watching for case folders"
    );

    let stats = match HttpNotifier::from_config(&config)? {
        Some(notifier) => {
            tracing::info!(endpoint = notifier.endpoint(), "Notifications go over HTTP");
            App::new(config, db, notifier).run().await?
        }
        None => {
            tracing::warn!("No notify url configured, notifications are only logged");
            App::new(config, db, LogNotifier).run().await?
        }
    };

    tracing::info!(
        accepted = stats.accepted,
        suppressed = stats.suppressed,
        errors = stats.errors,
        "Watcher finished"
    );
    Ok(())
}

fn history(db: &Database, limit: usize, json: bool) -> Result<()> {
    let entries = db.with_conn(|conn| list_recent_folder_logs(conn, limit))?;

    if json {
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| Error::internal(format!("failed to encode history: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S%.3f UTC"),
            entry.folder_name
        );
    }
    Ok(())
}
