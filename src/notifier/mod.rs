//! Outbound new-case notifications.
//!
//! This module provides:
//! - The [`Notifier`] trait the router delivers through
//! - An HTTP form-post transport
//! - A log-only transport for when no endpoint is configured
//! - The message text

mod http;
mod message;

use std::future::Future;

pub use http::HttpNotifier;
pub use message::compose_message;

use crate::Result;

/// Delivers a notification message. Best-effort: callers log failures and
/// move on, nothing is retried.
pub trait Notifier: Send + Sync {
    /// Deliver `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    fn deliver(&self, message: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Notifier that only writes the message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn deliver(&self, message: &str) -> Result<()> {
        tracing::info!(%message, "No notify endpoint configured, notification logged only");
        Ok(())
    }
}
