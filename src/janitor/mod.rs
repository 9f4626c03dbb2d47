//! Pool instrumentation strategies ("janitors").
//!
//! # Data Flow
//! ```text
//! HandlePool lifecycle transition
//!     → event.rs (PoolEvent: kind, handle, timestamp, call site)
//!     → strategy.rs (Janitor::is_recording, short-circuit when false)
//!     → minimal.rs   (every hook is a no-op)
//!       recording.rs (per-handle ledger of checkout context)
//!     → report.rs (LeakReport surfaced on the pool's diagnostic channel)
//! ```
//!
//! # Design Decisions
//! - A pool owns exactly one janitor, chosen from config at construction
//! - Disabled cost is one dynamic dispatch and a boolean test
//! - Hooks never fail; faults are absorbed where they happen

pub mod event;
pub mod minimal;
pub mod recording;
pub mod report;
pub mod strategy;

pub use event::{EventKind, HandleId, PoolEvent};
pub use minimal::MinimalJanitor;
pub use recording::RecordingJanitor;
pub use report::{CapturedContext, LeakReport};
pub use strategy::{dispatch, Janitor, RecordingState};

use crate::config::{JanitorConfig, JanitorKind};

/// Build the janitor a pool named `pool` is configured with.
pub fn build(pool: &str, config: &JanitorConfig) -> Box<dyn Janitor> {
    match config.kind {
        JanitorKind::Minimal => Box::new(MinimalJanitor::new()),
        JanitorKind::Recording => Box::new(RecordingJanitor::from_config(pool, config)),
    }
}
