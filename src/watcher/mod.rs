//! Directory watching and case folder dispatch.
//!
//! This module provides:
//! - An event source over notify-rs with per-directory registration
//! - Recursive registration of the watched tree
//! - Case folder matching and debouncing
//! - The event router that logs and notifies accepted folders

mod debounce;
mod events;
mod matcher;
mod registrar;
mod router;
mod source;

pub use debounce::{Clock, DebounceGate, SystemClock};
pub use events::{CaseEvent, OpKind, RawEvent};
pub use matcher::{PathMatcher, DEFAULT_CASE_PATTERN};
pub use registrar::{register_tree, register_tree_blocking};
pub use router::{EventRouter, Outcome, RouterStats, RouterStatsSnapshot};
pub use source::{EventSource, FsEventSource, SourceItem};
