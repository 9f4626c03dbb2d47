//! Pool instrumentation and reachability probing.
//!
//! A [`HandlePool`](pool::HandlePool) owns one [`Janitor`](janitor::Janitor)
//! that observes every checkout, checkin, destroy and suspected leak. The
//! minimal janitor records nothing; the recording janitor keeps per-handle
//! checkout context so leak reports can say who is holding what. Services
//! hosting pools answer readiness commands over a line protocol, which
//! [`probe::ping`] uses to tell whether they are alive.

pub mod command;
pub mod config;
pub mod janitor;
pub mod lifecycle;
pub mod observability;
pub mod pool;
pub mod probe;

pub use config::JanitorServiceConfig;
pub use janitor::{Janitor, MinimalJanitor, RecordingJanitor};
pub use lifecycle::Shutdown;
pub use pool::{HandlePool, PoolRegistry};
