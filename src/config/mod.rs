//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → JanitorServiceConfig (validated, immutable)
//!     → pools are built once, each with its own janitor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a pool's janitor never changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::CaptureMode;
pub use schema::CommandConfig;
pub use schema::JanitorConfig;
pub use schema::JanitorKind;
pub use schema::JanitorServiceConfig;
pub use schema::LeakDetectionConfig;
pub use schema::PoolConfig;
pub use schema::ProbeConfig;
