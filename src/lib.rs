//! Case Watcher Library
//!
//! Watches a directory tree for newly created case folders, records each one
//! in an append-only `SQLite` log and sends a notification for it.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod error;
pub mod notifier;
pub mod observability;
pub mod storage;
pub mod watcher;

pub use app::{App, LifecycleState};
pub use config::Config;
pub use error::{Error, Result};
