//! RecordingJanitor - keeps checkout context for every handle in use.
//!
//! # Ledger
//! - Keyed by handle id in a `DashMap`, so updates to distinct handles never
//!   contend on a shared lock and each entry is read as a whole
//! - Bounded by `max_tracked`; a slot is reserved before insertion and a full
//!   ledger drops the capture instead of failing the checkout
//! - Checkin and destroy remove the entry; whatever remains is outstanding

use std::backtrace::Backtrace;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::event::{HandleId, PoolEvent};
use super::report::{epoch_millis, CapturedContext, LeakReport};
use super::strategy::Janitor;
use crate::config::{CaptureMode, JanitorConfig};
use crate::observability::metrics;

/// Janitor that records checkout context per handle.
#[derive(Debug)]
pub struct RecordingJanitor {
    /// Owning pool's name, for logs and metrics.
    pool: String,
    capture: CaptureMode,
    max_tracked: usize,
    ledger: DashMap<HandleId, CapturedContext>,
    /// Reserved ledger slots; never exceeds `max_tracked`.
    tracked: AtomicUsize,
    dropped: AtomicU64,
}

impl RecordingJanitor {
    pub fn new(pool: impl Into<String>, capture: CaptureMode, max_tracked: usize) -> Self {
        Self {
            pool: pool.into(),
            capture,
            max_tracked,
            ledger: DashMap::new(),
            tracked: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn from_config(pool: &str, config: &JanitorConfig) -> Self {
        Self::new(pool, config.capture, config.max_tracked_handles)
    }

    /// Captures discarded because the ledger was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Context currently held for `handle`.
    pub fn context(&self, handle: HandleId) -> Option<CapturedContext> {
        self.ledger.get(&handle).map(|r| r.value().clone())
    }

    fn try_reserve(&self) -> bool {
        let mut prev = self.tracked.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_tracked {
                return false;
            }
            match self.tracked.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(x) => prev = x,
            }
        }
    }

    fn capture(&self, event: &PoolEvent) -> CapturedContext {
        let site = match self.capture {
            CaptureMode::Handle => None,
            CaptureMode::CallSite | CaptureMode::Backtrace => event.site().map(|l| l.to_string()),
        };
        let backtrace = match self.capture {
            CaptureMode::Backtrace => Some(Backtrace::force_capture().to_string()),
            _ => None,
        };

        CapturedContext {
            handle: event.handle(),
            kind: event.kind(),
            captured_at_ms: epoch_millis(event.at()),
            thread: std::thread::current().name().map(str::to_owned),
            site,
            backtrace,
        }
    }

    fn forget(&self, handle: HandleId) {
        if self.ledger.remove(&handle).is_some() {
            let now = self.tracked.fetch_sub(1, Ordering::AcqRel) - 1;
            metrics::record_tracked_handles(&self.pool, now);
        }
    }
}

impl Janitor for RecordingJanitor {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn is_recording(&self) -> bool {
        true
    }

    fn on_checkout(&self, event: &PoolEvent) {
        metrics::record_pool_event(&self.pool, event.kind());
        let context = self.capture(event);

        match self.ledger.entry(event.handle()) {
            Entry::Occupied(mut slot) => {
                // Checked out again without a checkin in between; keep the newest context.
                tracing::debug!(pool = %self.pool, handle = %event.handle(), "Replacing stale checkout context");
                slot.insert(context);
            }
            Entry::Vacant(slot) => {
                if self.try_reserve() {
                    slot.insert(context);
                    metrics::record_tracked_handles(&self.pool, self.tracked.load(Ordering::Relaxed));
                } else {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dropped_capture(&self.pool);
                    tracing::debug!(
                        pool = %self.pool,
                        handle = %event.handle(),
                        max_tracked = self.max_tracked,
                        "Ledger full, checkout context dropped"
                    );
                }
            }
        }
    }

    fn on_checkin(&self, event: &PoolEvent) {
        metrics::record_pool_event(&self.pool, event.kind());
        self.forget(event.handle());
    }

    fn on_destroy(&self, event: &PoolEvent) {
        metrics::record_pool_event(&self.pool, event.kind());
        self.forget(event.handle());
    }

    fn on_leak_suspected(&self, event: &PoolEvent) -> LeakReport {
        metrics::record_pool_event(&self.pool, event.kind());
        match self.context(event.handle()) {
            Some(context) => LeakReport::with_context(event.handle(), context),
            None => LeakReport::empty(event.handle()),
        }
    }

    fn outstanding(&self) -> Vec<CapturedContext> {
        let mut contexts: Vec<_> = self.ledger.iter().map(|r| r.value().clone()).collect();
        contexts.sort_by_key(|c| c.handle);
        contexts
    }

    fn tracked(&self) -> usize {
        self.ledger.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::Location;
    use std::sync::Arc;
    use std::thread;

    fn janitor(max: usize) -> RecordingJanitor {
        RecordingJanitor::new("test", CaptureMode::CallSite, max)
    }

    #[test]
    fn checkout_checkin_leaves_nothing_behind() {
        let janitor = janitor(8);
        let h = HandleId::from_raw(1);

        janitor.on_checkout(&PoolEvent::checkout(h));
        assert_eq!(janitor.tracked(), 1);

        janitor.on_checkin(&PoolEvent::checkin(h));
        assert_eq!(janitor.tracked(), 0);
        assert!(janitor.context(h).is_none());
        assert!(janitor.outstanding().is_empty());
    }

    #[test]
    fn destroy_clears_residual_context() {
        let janitor = janitor(8);
        let h = HandleId::from_raw(2);

        janitor.on_checkout(&PoolEvent::checkout(h));
        janitor.on_destroy(&PoolEvent::destroy(h));
        assert!(janitor.context(h).is_none());
    }

    #[test]
    fn leak_report_before_and_after_checkin() {
        let janitor = janitor(8);
        let h = HandleId::from_raw(3);
        let site = Location::caller();

        janitor.on_checkout(&PoolEvent::checkout(h).with_site(site));

        let before = janitor.on_leak_suspected(&PoolEvent::leak_suspected(h));
        let context = before.context.expect("context captured at checkout");
        assert_eq!(context.handle, h);
        assert_eq!(context.site, Some(site.to_string()));
        assert!(context.backtrace.is_none());

        janitor.on_checkin(&PoolEvent::checkin(h));

        let after = janitor.on_leak_suspected(&PoolEvent::leak_suspected(h));
        assert!(after.is_empty());
    }

    #[test]
    fn handle_mode_skips_site() {
        let janitor = RecordingJanitor::new("test", CaptureMode::Handle, 4);
        let h = HandleId::from_raw(4);
        janitor.on_checkout(&PoolEvent::checkout(h).with_site(Location::caller()));
        assert!(janitor.context(h).unwrap().site.is_none());
    }

    #[test]
    fn backtrace_mode_captures_backtrace() {
        let janitor = RecordingJanitor::new("test", CaptureMode::Backtrace, 4);
        let h = HandleId::from_raw(5);
        janitor.on_checkout(&PoolEvent::checkout(h));
        assert!(janitor.context(h).unwrap().backtrace.is_some());
    }

    #[test]
    fn full_ledger_drops_instead_of_failing() {
        let janitor = janitor(2);
        for raw in 10..15 {
            janitor.on_checkout(&PoolEvent::checkout(HandleId::from_raw(raw)));
        }
        assert_eq!(janitor.tracked(), 2);
        assert_eq!(janitor.dropped(), 3);

        // Freed slots are reusable.
        janitor.on_checkin(&PoolEvent::checkin(HandleId::from_raw(10)));
        janitor.on_checkout(&PoolEvent::checkout(HandleId::from_raw(20)));
        assert!(janitor.context(HandleId::from_raw(20)).is_some());
    }

    #[test]
    fn recheckout_replaces_without_consuming_a_slot() {
        let janitor = janitor(1);
        let h = HandleId::from_raw(30);
        janitor.on_checkout(&PoolEvent::checkout(h));
        janitor.on_checkout(&PoolEvent::checkout(h));
        assert_eq!(janitor.tracked(), 1);
        assert_eq!(janitor.dropped(), 0);
    }

    #[test]
    fn checkin_of_unknown_handle_is_harmless() {
        let janitor = janitor(1);
        janitor.on_checkin(&PoolEvent::checkin(HandleId::from_raw(99)));
        janitor.on_destroy(&PoolEvent::destroy(HandleId::from_raw(99)));
        assert_eq!(janitor.tracked(), 0);

        // Counter did not underflow: the single slot is still available.
        janitor.on_checkout(&PoolEvent::checkout(HandleId::from_raw(1)));
        assert_eq!(janitor.tracked(), 1);
    }

    #[test]
    fn concurrent_distinct_handles_keep_their_own_context() {
        let janitor = Arc::new(janitor(10_000));
        let workers: Vec<_> = (0..8u64)
            .map(|t| {
                let janitor = Arc::clone(&janitor);
                thread::Builder::new()
                    .name(format!("worker-{t}"))
                    .spawn(move || {
                        for i in 0..500u64 {
                            let h = HandleId::from_raw(t * 1_000 + i);
                            janitor.on_checkout(&PoolEvent::checkout(h));
                            let ctx = janitor.context(h).expect("own context visible");
                            assert_eq!(ctx.handle, h);
                            assert_eq!(ctx.thread.as_deref(), Some(format!("worker-{t}").as_str()));
                            if i % 2 == 0 {
                                janitor.on_checkin(&PoolEvent::checkin(h));
                            }
                        }
                    })
                    .unwrap()
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }

        let outstanding = janitor.outstanding();
        assert_eq!(outstanding.len(), 8 * 250);
        for ctx in outstanding {
            let t = ctx.handle.as_u64() / 1_000;
            assert_eq!(ctx.handle.as_u64() % 2, 1);
            assert_eq!(ctx.thread, Some(format!("worker-{t}")));
        }
        assert_eq!(janitor.dropped(), 0);
    }
}
