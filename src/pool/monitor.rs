//! Periodic leak sweeping.
//!
//! # Responsibilities
//! - Sweep every registered pool on an interval
//! - Report handles held past the configured threshold

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::LeakDetectionConfig;
use crate::pool::registry::PoolRegistry;

pub struct LeakMonitor {
    registry: PoolRegistry,
    config: LeakDetectionConfig,
}

impl LeakMonitor {
    /// A zero interval is raised to one second.
    pub fn new(registry: PoolRegistry, mut config: LeakDetectionConfig) -> Self {
        if config.interval_secs == 0 {
            tracing::warn!("Leak sweep interval of 0s raised to 1s");
            config.interval_secs = 1;
        }
        Self { registry, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Leak detection disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            hold_threshold = self.config.hold_threshold_secs,
            "Leak monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        // The first tick completes immediately; nothing can have leaked yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Leak monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one sweep over all pools, returning how many leaks were reported.
    pub fn sweep(&self) -> usize {
        let threshold = Duration::from_secs(self.config.hold_threshold_secs);
        let mut reported = 0;
        for pool in self.registry.all() {
            let reports = pool.suspect_leaks(threshold);
            if !reports.is_empty() {
                tracing::debug!(pool = %pool.name(), count = reports.len(), "Leak sweep found suspects");
            }
            reported += reports.len();
        }
        reported
    }
}
