//! Janitor trait - the pool's instrumentation capability.

use super::event::{EventKind, PoolEvent};
use super::report::{CapturedContext, LeakReport};

/// Observable state of a janitor, fixed for the instance's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Disabled,
    Enabled,
}

/// Recording policy invoked by a pool on every lifecycle transition.
///
/// # Contract
///
/// - The pool is the only caller and builds every [`PoolEvent`].
/// - Hooks may be called from many threads at once and must not block on
///   pool-internal locks.
/// - Hooks never fail. Anything that goes wrong while recording is absorbed
///   by the implementation.
/// - `is_recording` is a pure query. Pools consult it before building
///   expensive event context and before calling `on_checkout`,
///   `on_checkin` and `on_destroy`.
pub trait Janitor: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and status replies.
    fn name(&self) -> &'static str;

    fn is_recording(&self) -> bool;

    fn state(&self) -> RecordingState {
        if self.is_recording() {
            RecordingState::Enabled
        } else {
            RecordingState::Disabled
        }
    }

    /// A handle was handed out to a caller.
    fn on_checkout(&self, event: &PoolEvent);

    /// A handle came back to the pool; forget whatever was recorded for it.
    fn on_checkin(&self, event: &PoolEvent);

    /// A handle was discarded; forget whatever was recorded for it.
    fn on_destroy(&self, event: &PoolEvent);

    /// A handle is suspected of leaking. Returns what is known about it,
    /// which is an empty report when nothing was captured.
    fn on_leak_suspected(&self, event: &PoolEvent) -> LeakReport;

    /// Every captured context still held, i.e. handles checked out and not returned.
    fn outstanding(&self) -> Vec<CapturedContext> {
        Vec::new()
    }

    /// Number of handles currently tracked.
    fn tracked(&self) -> usize {
        0
    }
}

/// Route an event to the matching hook.
///
/// Only `LeakSuspected` produces a report.
pub fn dispatch(janitor: &dyn Janitor, event: &PoolEvent) -> Option<LeakReport> {
    match event.kind() {
        EventKind::Checkout => {
            janitor.on_checkout(event);
            None
        }
        EventKind::Checkin => {
            janitor.on_checkin(event);
            None
        }
        EventKind::Destroy => {
            janitor.on_destroy(event);
            None
        }
        EventKind::LeakSuspected => Some(janitor.on_leak_suspected(event)),
    }
}
