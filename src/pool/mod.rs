//! Handle pooling and its janitor integration.
//!
//! # Data Flow
//! ```text
//! caller → HandlePool::checkout()
//!     → reuse an idle handle or open one via the factory (bounded by max_size)
//!     → Checkout event → janitor (only if recording)
//!     → PooledHandle guard handed to the caller
//!
//! guard dropped   → Checkin event, handle back to idle
//! guard.destroy() → Destroy event, handle dropped
//!
//! LeakMonitor (monitor.rs) every interval:
//!     → registry.rs (all pools)
//!     → suspect_leaks(threshold) → LeakSuspected events → LeakReports logged
//! ```
//!
//! # Design Decisions
//! - The pool exclusively owns its janitor; the janitor has no pool reference
//! - Janitor calls happen outside pool locks and are isolated with `catch_unwind`
//! - No waiting for capacity: an exhausted pool fails the checkout immediately

pub mod guard;
pub mod handle_pool;
pub mod monitor;
pub mod registry;
pub mod types;

pub use guard::PooledHandle;
pub use handle_pool::{HandlePool, ManagedPool};
pub use monitor::LeakMonitor;
pub use registry::PoolRegistry;
pub use types::{BoxError, PoolError, PoolStatus};
