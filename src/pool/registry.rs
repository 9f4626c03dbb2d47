//! Registry of the pools a service hosts.

use std::sync::Arc;

use dashmap::DashMap;

use crate::janitor::{CapturedContext, LeakReport};
use crate::pool::handle_pool::ManagedPool;
use crate::pool::types::{PoolError, PoolStatus};

/// Named pools shared between the leak monitor and the command server.
#[derive(Clone, Default)]
pub struct PoolRegistry {
    pools: Arc<DashMap<String, Arc<dyn ManagedPool>>>,
}

/// Captured contexts still outstanding in one pool.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolLeaks {
    pub pool: String,
    pub outstanding: Vec<CapturedContext>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool under its own name.
    pub fn register(&self, pool: Arc<dyn ManagedPool>) -> Result<(), PoolError> {
        let name = pool.name().to_string();
        match self.pools.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(PoolError::Duplicate(e.key().clone())),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                tracing::info!(pool = %e.key(), "Pool registered");
                e.insert(pool);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// All pools, ordered by name.
    pub fn all(&self) -> Vec<Arc<dyn ManagedPool>> {
        let mut pools: Vec<_> = self.pools.iter().map(|r| Arc::clone(r.value())).collect();
        pools.sort_by(|a, b| a.name().cmp(b.name()));
        pools
    }

    pub fn statuses(&self) -> Vec<PoolStatus> {
        self.all().iter().map(|p| p.status()).collect()
    }

    /// Outstanding contexts per pool; pools with nothing outstanding are skipped.
    pub fn leaks(&self) -> Vec<PoolLeaks> {
        self.all()
            .iter()
            .filter_map(|p| {
                let outstanding = p.outstanding();
                (!outstanding.is_empty()).then(|| PoolLeaks {
                    pool: p.name().to_string(),
                    outstanding,
                })
            })
            .collect()
    }

    /// Shut every pool down, returning all leak reports.
    pub fn shutdown_all(&self) -> Vec<LeakReport> {
        self.all().iter().flat_map(|p| p.shutdown()).collect()
    }
}
