//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the janitor
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the janitor service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct JanitorServiceConfig {
    /// Command listener answering readiness and diagnostic commands.
    pub command: CommandConfig,

    /// Pools hosted by this service.
    pub pools: Vec<PoolConfig>,

    /// Periodic leak sweeping.
    pub leak_detection: LeakDetectionConfig,

    /// Reachability probe settings used by tooling.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Command listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Bind address (e.g., "127.0.0.1:9999").
    pub bind_address: String,

    /// Maximum concurrent command sessions.
    pub max_connections: usize,

    /// Accept `remote-list` from any peer.
    pub remote_enabled: bool,

    /// Idle read timeout for a command session in seconds.
    pub read_timeout_secs: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9999".to_string(),
            max_connections: 64,
            remote_enabled: false,
            read_timeout_secs: 30,
        }
    }
}

/// A pool hosted by the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Unique pool name, used in logs, metrics and command replies.
    pub name: String,

    /// Backend address the pooled connections are opened against.
    pub address: String,

    /// Upper bound on live handles (idle + checked out).
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Handles opened eagerly at startup.
    #[serde(default)]
    pub min_idle: usize,

    /// Connect timeout for new handles in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Instrumentation strategy owned by this pool.
    #[serde(default)]
    pub janitor: JanitorConfig,
}

fn default_max_size() -> usize {
    20
}

fn default_connect_timeout_secs() -> u64 {
    5
}

/// Which janitor a pool is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JanitorKind {
    /// Never records; every hook is a no-op.
    #[default]
    Minimal,
    /// Keeps a per-handle ledger of checkout context.
    Recording,
}

/// How much context a recording janitor captures per checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Handle identity, event kind, time and thread only.
    Handle,
    /// Additionally the source location of the checkout call.
    #[default]
    CallSite,
    /// Additionally a full backtrace of the checking-out thread.
    Backtrace,
}

/// Janitor configuration for one pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JanitorConfig {
    pub kind: JanitorKind,

    pub capture: CaptureMode,

    /// Ledger capacity; captures beyond it are dropped and counted.
    pub max_tracked_handles: usize,
}

impl Default for JanitorConfig {
    fn default() -> Self {
        Self {
            kind: JanitorKind::Minimal,
            capture: CaptureMode::CallSite,
            max_tracked_handles: 1024,
        }
    }
}

/// Leak sweeping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LeakDetectionConfig {
    /// Enable the background leak monitor.
    pub enabled: bool,

    /// Sweep interval in seconds.
    pub interval_secs: u64,

    /// A handle held longer than this many seconds is suspected of leaking.
    pub hold_threshold_secs: u64,
}

impl Default for LeakDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            hold_threshold_secs: 300,
        }
    }
}

/// Reachability probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Upper bound on one probe round trip in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
