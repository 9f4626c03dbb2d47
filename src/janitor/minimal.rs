//! MinimalJanitor - the production default that records nothing.

use super::event::PoolEvent;
use super::report::LeakReport;
use super::strategy::Janitor;

/// Janitor that never records.
///
/// Carries no state and needs no synchronization. Every hook is an
/// inlined empty body, so a pool built with it pays only the
/// `is_recording` check on its hot path.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalJanitor;

impl MinimalJanitor {
    pub fn new() -> Self {
        Self
    }
}

impl Janitor for MinimalJanitor {
    fn name(&self) -> &'static str {
        "minimal"
    }

    #[inline(always)]
    fn is_recording(&self) -> bool {
        false
    }

    #[inline(always)]
    fn on_checkout(&self, _event: &PoolEvent) {}

    #[inline(always)]
    fn on_checkin(&self, _event: &PoolEvent) {}

    #[inline(always)]
    fn on_destroy(&self, _event: &PoolEvent) {}

    #[inline(always)]
    fn on_leak_suspected(&self, event: &PoolEvent) -> LeakReport {
        LeakReport::empty(event.handle())
    }
}
