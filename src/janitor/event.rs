//! Pool lifecycle events.

use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::Serialize;

/// Global atomic counter for handle IDs.
static HANDLE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a pooled handle.
///
/// Assigned by the pool when the handle is created; janitors only use it as a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HandleId(u64);

impl HandleId {
    /// Allocate a new process-unique handle ID.
    pub fn next() -> Self {
        Self(HANDLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handle-{}", self.0)
    }
}

/// The lifecycle transition an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Checkout,
    Checkin,
    Destroy,
    LeakSuspected,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Checkout => "checkout",
            EventKind::Checkin => "checkin",
            EventKind::Destroy => "destroy",
            EventKind::LeakSuspected => "leak_suspected",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one pool lifecycle transition.
///
/// Built by the pool at the moment of the transition and lent to the janitor
/// for the duration of the hook call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolEvent {
    kind: EventKind,
    handle: HandleId,
    at: SystemTime,
    site: Option<&'static Location<'static>>,
}

impl PoolEvent {
    pub fn new(kind: EventKind, handle: HandleId) -> Self {
        Self {
            kind,
            handle,
            at: SystemTime::now(),
            site: None,
        }
    }

    pub fn checkout(handle: HandleId) -> Self {
        Self::new(EventKind::Checkout, handle)
    }

    pub fn checkin(handle: HandleId) -> Self {
        Self::new(EventKind::Checkin, handle)
    }

    pub fn destroy(handle: HandleId) -> Self {
        Self::new(EventKind::Destroy, handle)
    }

    pub fn leak_suspected(handle: HandleId) -> Self {
        Self::new(EventKind::LeakSuspected, handle)
    }

    /// Attach the source location of the pool call that caused the event.
    pub fn with_site(mut self, site: &'static Location<'static>) -> Self {
        self.site = Some(site);
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn handle(&self) -> HandleId {
        self.handle
    }

    pub fn at(&self) -> SystemTime {
        self.at
    }

    pub fn site(&self) -> Option<&'static Location<'static>> {
        self.site
    }
}
