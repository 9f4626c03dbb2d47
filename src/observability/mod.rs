//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pools, janitors, probes and the command server produce:
//!     → logging.rs (structured log events, leak reports)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → Log aggregation (stderr)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Leak reports are log events on the pool's diagnostic channel
//! - Metric updates stay off the disabled janitor's hot path

pub mod logging;
pub mod metrics;
