//! Handle pool with janitor integration.
//!
//! # Responsibilities
//! - Hand out and take back handles, bounded by `max_size`
//! - Emit lifecycle events to the owned janitor
//! - Detect handles held past a threshold and surface leak reports

use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::PoolConfig;
use crate::janitor::{self, dispatch, CapturedContext, HandleId, Janitor, LeakReport, PoolEvent};
use crate::observability::metrics;
use crate::pool::guard::PooledHandle;
use crate::pool::types::{BoxError, PoolError, PoolStatus};

type Factory<T> = Box<dyn Fn() -> Result<T, BoxError> + Send + Sync>;

/// Checkout bookkeeping kept by the pool itself, independent of the janitor.
#[derive(Debug, Clone, Copy)]
struct Lease {
    since: Instant,
    reported: bool,
}

pub(crate) struct Shared<T> {
    name: String,
    max_size: usize,
    factory: Factory<T>,
    janitor: Box<dyn Janitor>,
    idle: Mutex<Vec<(HandleId, T)>>,
    leases: DashMap<HandleId, Lease>,
    /// Live handles (idle + leased).
    size: AtomicUsize,
    closed: AtomicBool,
}

impl<T> Shared<T> {
    /// Deliver an event to the janitor without letting it disturb the caller.
    fn notify(&self, event: PoolEvent) -> Option<LeakReport> {
        let janitor = &*self.janitor;
        match panic::catch_unwind(AssertUnwindSafe(|| dispatch(janitor, &event))) {
            Ok(report) => report,
            Err(_) => {
                tracing::error!(
                    pool = %self.name,
                    janitor = janitor.name(),
                    handle = %event.handle(),
                    kind = %event.kind(),
                    "Janitor hook panicked, event dropped"
                );
                None
            }
        }
    }

    fn release_slot(&self) {
        self.size.fetch_sub(1, Ordering::AcqRel);
    }

    fn try_reserve_slot(&self) -> bool {
        let mut prev = self.size.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_size {
                return false;
            }
            match self.size.compare_exchange_weak(prev, prev + 1, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(x) => prev = x,
            }
        }
    }

    fn open(&self) -> Result<(HandleId, T), PoolError> {
        if !self.try_reserve_slot() {
            return Err(PoolError::Exhausted {
                pool: self.name.clone(),
                max_size: self.max_size,
            });
        }
        match (self.factory)() {
            Ok(value) => {
                let id = HandleId::next();
                tracing::debug!(pool = %self.name, handle = %id, "Opened handle");
                Ok((id, value))
            }
            Err(source) => {
                self.release_slot();
                Err(PoolError::Factory {
                    pool: self.name.clone(),
                    source,
                })
            }
        }
    }

    fn pop_idle(&self) -> Option<(HandleId, T)> {
        self.idle.lock().expect("idle list mutex poisoned").pop()
    }

    pub(crate) fn checkin(&self, id: HandleId, value: T) {
        self.leases.remove(&id);
        if self.janitor.is_recording() {
            self.notify(PoolEvent::checkin(id));
        }

        if self.closed.load(Ordering::Acquire) {
            self.discard(id, value);
            return;
        }
        self.idle.lock().expect("idle list mutex poisoned").push((id, value));
    }

    pub(crate) fn destroy(&self, id: HandleId, value: T) {
        self.leases.remove(&id);
        self.discard(id, value);
    }

    fn discard(&self, id: HandleId, value: T) {
        drop(value);
        self.release_slot();
        if self.janitor.is_recording() {
            self.notify(PoolEvent::destroy(id));
        }
        tracing::debug!(pool = %self.name, handle = %id, "Destroyed handle");
    }

    fn report_leak(&self, id: HandleId, held: Option<Duration>) -> LeakReport {
        let mut report = self
            .notify(PoolEvent::leak_suspected(id))
            .unwrap_or_else(|| LeakReport::empty(id));
        report.held_for_ms = held.map(|d| d.as_millis() as u64);

        metrics::record_leak_suspected(&self.name);
        match &report.context {
            Some(ctx) => tracing::warn!(
                pool = %self.name,
                handle = %id,
                held_for_ms = ?report.held_for_ms,
                site = ?ctx.site,
                thread = ?ctx.thread,
                backtrace = ?ctx.backtrace,
                "Suspected handle leak"
            ),
            None => tracing::warn!(
                pool = %self.name,
                handle = %id,
                held_for_ms = ?report.held_for_ms,
                "Suspected handle leak, no context captured"
            ),
        }
        report
    }
}

/// A bounded pool of handles of type `T` instrumented by a janitor.
pub struct HandlePool<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> HandlePool<T> {
    /// Create a pool owning `janitor`, opening handles with `factory`.
    pub fn new<F>(name: impl Into<String>, max_size: usize, janitor: Box<dyn Janitor>, factory: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::info!(
            pool = %name,
            max_size,
            janitor = janitor.name(),
            recording = janitor.is_recording(),
            "Pool created"
        );
        Self {
            shared: Arc::new(Shared {
                name,
                max_size,
                factory: Box::new(factory),
                janitor,
                idle: Mutex::new(Vec::new()),
                leases: DashMap::new(),
                size: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Create a pool from its configuration, building the configured janitor.
    pub fn from_config<F>(config: &PoolConfig, factory: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let janitor = janitor::build(&config.name, &config.janitor);
        Self::new(config.name.clone(), config.max_size, janitor, factory)
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn janitor(&self) -> &dyn Janitor {
        &*self.shared.janitor
    }

    /// Open up to `count` idle handles ahead of demand.
    ///
    /// Stops at the first factory failure and returns how many were opened.
    pub fn prefill(&self, count: usize) -> Result<usize, PoolError> {
        let mut opened = Vec::with_capacity(count);
        let mut result = Ok(());
        for _ in 0..count {
            match self.shared.open() {
                Ok(entry) => opened.push(entry),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        let n = opened.len();
        self.shared.idle.lock().expect("idle list mutex poisoned").extend(opened);
        result.map(|()| n)
    }

    /// Take a handle out of the pool.
    ///
    /// When the janitor is recording, the caller's source location travels
    /// with the checkout event.
    #[track_caller]
    pub fn checkout(&self) -> Result<PooledHandle<T>, PoolError> {
        let site = Location::caller();
        let shared = &self.shared;
        if shared.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed(shared.name.clone()));
        }

        let (id, value) = match shared.pop_idle() {
            Some(entry) => entry,
            None => shared.open()?,
        };

        shared.leases.insert(
            id,
            Lease {
                since: Instant::now(),
                reported: false,
            },
        );
        // A shutdown that snapshotted the leases before this insert cannot
        // report this handle, so give it back.
        if shared.closed.load(Ordering::Acquire) {
            shared.leases.remove(&id);
            shared.discard(id, value);
            return Err(PoolError::Closed(shared.name.clone()));
        }
        if shared.janitor.is_recording() {
            shared.notify(PoolEvent::checkout(id).with_site(site));
        }

        Ok(PooledHandle::new(id, value, Arc::clone(shared)))
    }

    /// Report one checked-out handle as a suspected leak.
    pub fn suspect(&self, handle: HandleId) -> Result<LeakReport, PoolError> {
        let held = self
            .shared
            .leases
            .get_mut(&handle)
            .map(|mut lease| {
                lease.reported = true;
                lease.since.elapsed()
            })
            .ok_or(PoolError::UnknownHandle(handle))?;
        Ok(self.shared.report_leak(handle, Some(held)))
    }

    /// Report every handle held for at least `threshold` that has not been
    /// reported since it was checked out.
    pub fn suspect_leaks(&self, threshold: Duration) -> Vec<LeakReport> {
        let now = Instant::now();
        let suspects: Vec<(HandleId, Duration)> = self
            .shared
            .leases
            .iter_mut()
            .filter_map(|mut entry| {
                let held = now.saturating_duration_since(entry.since);
                if entry.reported || held < threshold {
                    return None;
                }
                entry.reported = true;
                Some((*entry.key(), held))
            })
            .collect();

        suspects
            .into_iter()
            .map(|(id, held)| self.shared.report_leak(id, Some(held)))
            .collect()
    }

    /// Close the pool: drop idle handles and report every handle still out.
    ///
    /// Handles returned afterwards are destroyed instead of pooled.
    pub fn shutdown(&self) -> Vec<LeakReport> {
        let shared = &self.shared;
        if shared.closed.swap(true, Ordering::AcqRel) {
            return Vec::new();
        }

        let idle = std::mem::take(&mut *shared.idle.lock().expect("idle list mutex poisoned"));
        for (id, value) in idle {
            shared.discard(id, value);
        }

        let now = Instant::now();
        let outstanding: Vec<(HandleId, Duration)> = shared
            .leases
            .iter()
            .map(|entry| (*entry.key(), now.saturating_duration_since(entry.since)))
            .collect();

        tracing::info!(pool = %shared.name, outstanding = outstanding.len(), "Pool shut down");
        outstanding
            .into_iter()
            .map(|(id, held)| shared.report_leak(id, Some(held)))
            .collect()
    }

    pub fn status(&self) -> PoolStatus {
        let shared = &self.shared;
        let idle = shared.idle.lock().expect("idle list mutex poisoned").len();
        PoolStatus {
            name: shared.name.clone(),
            janitor: shared.janitor.name(),
            recording: shared.janitor.is_recording(),
            max_size: shared.max_size,
            size: shared.size.load(Ordering::Relaxed),
            idle,
            in_use: shared.leases.len(),
            tracked: shared.janitor.tracked(),
        }
    }
}

/// Object-safe view of a pool for the registry, monitor and command server.
pub trait ManagedPool: Send + Sync {
    fn name(&self) -> &str;
    fn status(&self) -> PoolStatus;
    fn suspect_leaks(&self, threshold: Duration) -> Vec<LeakReport>;
    fn outstanding(&self) -> Vec<CapturedContext>;
    fn shutdown(&self) -> Vec<LeakReport>;
}

impl<T: Send + 'static> ManagedPool for HandlePool<T> {
    fn name(&self) -> &str {
        HandlePool::name(self)
    }

    fn status(&self) -> PoolStatus {
        HandlePool::status(self)
    }

    fn suspect_leaks(&self, threshold: Duration) -> Vec<LeakReport> {
        HandlePool::suspect_leaks(self, threshold)
    }

    fn outstanding(&self) -> Vec<CapturedContext> {
        self.shared.janitor.outstanding()
    }

    fn shutdown(&self) -> Vec<LeakReport> {
        HandlePool::shutdown(self)
    }
}
