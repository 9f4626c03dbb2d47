//! Captured context and leak reports.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::event::{EventKind, HandleId};

/// Milliseconds since the Unix epoch, saturating to zero for pre-epoch times.
pub fn epoch_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// What a recording janitor knows about one checked-out handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedContext {
    pub handle: HandleId,
    /// Event that produced the capture.
    pub kind: EventKind,
    /// Capture time (ms since epoch).
    pub captured_at_ms: u64,
    /// Name of the thread that checked the handle out, if it had one.
    pub thread: Option<String>,
    /// `file:line:column` of the checkout call.
    pub site: Option<String>,
    pub backtrace: Option<String>,
}

/// Result of a leak suspicion for one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakReport {
    pub handle: HandleId,
    /// Report time (ms since epoch).
    pub reported_at_ms: u64,
    /// How long the pool has seen the handle checked out, when it knows.
    pub held_for_ms: Option<u64>,
    /// `None` when the janitor captured nothing for this handle.
    pub context: Option<CapturedContext>,
}

impl LeakReport {
    pub fn empty(handle: HandleId) -> Self {
        Self {
            handle,
            reported_at_ms: epoch_millis(SystemTime::now()),
            held_for_ms: None,
            context: None,
        }
    }

    pub fn with_context(handle: HandleId, context: CapturedContext) -> Self {
        Self {
            context: Some(context),
            ..Self::empty(handle)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_none()
    }
}
