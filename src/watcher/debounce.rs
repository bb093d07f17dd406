//! Debounce gate for case folder creations.
//!
//! A single mkdir in a file manager can raise several events in quick
//! succession. The gate admits the first one and rejects the rest until the
//! window has passed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::DebounceMode;
use crate::storage::Ledger;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

enum GateState {
    Memory(Option<DateTime<Utc>>),
    Ledger(Arc<dyn Ledger>),
}

/// Admits at most one event per window.
pub struct DebounceGate {
    window: Duration,
    state: GateState,
}

impl DebounceGate {
    /// Gate that admits everything.
    #[must_use]
    pub const fn immediate() -> Self {
        Self::in_memory(Duration::ZERO)
    }

    /// Gate that remembers the last admission for the process lifetime.
    #[must_use]
    pub const fn in_memory(window: Duration) -> Self {
        Self {
            window,
            state: GateState::Memory(None),
        }
    }

    /// Gate that reads the last admission from the ledger on every decision.
    ///
    /// The ledger is updated by the router's append after admission, so
    /// state survives restarts.
    #[must_use]
    pub fn ledger_backed(window: Duration, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            window,
            state: GateState::Ledger(ledger),
        }
    }

    /// Build the gate variant selected by configuration.
    #[must_use]
    pub fn from_mode(mode: DebounceMode, window: Duration, ledger: Arc<dyn Ledger>) -> Self {
        match mode {
            DebounceMode::Off => Self::immediate(),
            DebounceMode::Memory => Self::in_memory(window),
            DebounceMode::Ledger => Self::ledger_backed(window, ledger),
        }
    }

    /// Configured window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether an event observed at `now` passes.
    ///
    /// Returns true iff `now - last >= window`. An unset state always admits.
    pub fn admit(&mut self, now: DateTime<Utc>) -> bool {
        if self.window.is_zero() {
            return true;
        }

        match &mut self.state {
            GateState::Memory(last) => {
                let admitted = match *last {
                    Some(t) => elapsed_at_least(t, now, self.window),
                    None => true,
                };
                if admitted {
                    *last = Some(now);
                }
                admitted
            }
            GateState::Ledger(ledger) => match ledger.last_timestamp() {
                Ok(Some(t)) => elapsed_at_least(t, now, self.window),
                Ok(None) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read last folder log timestamp, admitting");
                    true
                }
            },
        }
    }
}

impl std::fmt::Debug for DebounceGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (kind, last) = match &self.state {
            GateState::Memory(last) => ("memory", *last),
            GateState::Ledger(_) => ("ledger", None),
        };
        f.debug_struct("DebounceGate")
            .field("window", &self.window)
            .field("kind", &kind)
            .field("last", &last)
            .finish()
    }
}

/// A clock that went backwards counts as no time elapsed.
fn elapsed_at_least(last: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    (now - last).to_std().is_ok_and(|elapsed| elapsed >= window)
}
