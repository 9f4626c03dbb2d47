//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → leak monitor and command server exit their loops
//!     → pools shut down, outstanding handles reported as leaks
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
