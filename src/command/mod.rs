//! Command surface answering readiness and diagnostic commands.
//!
//! # Data Flow
//! ```text
//! TCP connection (server.rs, bounded by semaphore)
//!     → one command per line
//!     → handler.rs (local-list / remote-list / leak-report)
//!     → protocol.rs (OK <json> | UNKNOWN <command> | ERR <message>)
//! ```
//!
//! # Design Decisions
//! - The same line protocol is spoken by the server and by the probe's dispatcher
//! - `local-list` is served to loopback peers only
//! - `remote-list` is unavailable unless remote access is enabled

pub mod handler;
pub mod protocol;
pub mod server;

pub use handler::CommandHandler;
pub use protocol::{Reply, LEAK_REPORT, LOCAL_LIST, MAX_COMMAND_LEN, REMOTE_LIST};
pub use server::{CommandError, CommandServer};
