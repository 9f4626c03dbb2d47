//! Pool error and status types.

use serde::Serialize;
use thiserror::Error;

use crate::janitor::HandleId;

/// Boxed error returned by handle factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Every handle is checked out and the pool is at `max_size`.
    #[error("pool '{pool}' exhausted ({max_size} handles in use)")]
    Exhausted { pool: String, max_size: usize },

    /// Opening a new handle failed.
    #[error("pool '{pool}' failed to open a handle: {source}")]
    Factory {
        pool: String,
        #[source]
        source: BoxError,
    },

    /// The pool has been shut down.
    #[error("pool '{0}' is shut down")]
    Closed(String),

    /// A pool with this name is already registered.
    #[error("pool '{0}' already registered")]
    Duplicate(String),

    /// The handle is not known to the pool.
    #[error("{0} is not checked out")]
    UnknownHandle(HandleId),
}

/// Point-in-time view of a pool, as served by `local-list` / `remote-list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub name: String,
    pub janitor: &'static str,
    pub recording: bool,
    pub max_size: usize,
    /// Live handles, idle or checked out.
    pub size: usize,
    pub idle: usize,
    pub in_use: usize,
    /// Handles with captured context in the janitor's ledger.
    pub tracked: usize,
}
