//! Reachability probing of pool-hosting services.
//!
//! # Data Flow
//! ```text
//! ProbeTarget (host, port, locality)
//!     → target.rs (locality picks the readiness command)
//!     → dispatch.rs (CommandDispatcher asks the target for the command)
//!     → ping.rs (success, or ProbeError naming host:port and the cause)
//! ```
//!
//! # Design Decisions
//! - Local and remote probes share one transport and differ only by command
//! - Every dispatch fault is folded into the same failure shape

pub mod dispatch;
pub mod ping;
pub mod target;

pub use dispatch::{CommandDispatcher, DispatchError, TcpDispatcher};
pub use ping::{ping, ProbeError};
pub use target::{Locality, ProbeTarget};
