//! pool-janitor service.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                 pool-janitor                  │
//!                  │                                               │
//!  janitor-cli ────┼─▶ command server ──▶ registry ──▶ HandlePool  │
//!  (ping/list)     │   (local-list,                    │ owns      │
//!                  │    remote-list,                   ▼           │
//!                  │    leak-report)                 Janitor       │
//!                  │                                               │
//!                  │   leak monitor ──(interval)──▶ suspect_leaks  │
//!                  └──────────────────────────────────────────────┘
//! ```
//!
//! Usage: `pool-janitor [config.toml]`. Without a path the defaults are used.

use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pool_janitor::command::CommandServer;
use pool_janitor::config::{load_config, JanitorServiceConfig, PoolConfig};
use pool_janitor::lifecycle::{signals, Shutdown};
use pool_janitor::observability::{logging, metrics};
use pool_janitor::pool::{BoxError, HandlePool, LeakMonitor, PoolRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => match load_config(&PathBuf::from(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("pool-janitor: {e}");
                std::process::exit(1);
            }
        },
        None => JanitorServiceConfig::default(),
    };

    logging::init(&logging::directives_for(&config.observability.log_level));

    tracing::info!("pool-janitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.command.bind_address,
        remote_enabled = config.command.remote_enabled,
        pools = config.pools.len(),
        leak_detection = config.leak_detection.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let registry = PoolRegistry::new();
    for pool_config in &config.pools {
        let pool = Arc::new(connection_pool(pool_config)?);

        if pool_config.min_idle > 0 {
            let warm = Arc::clone(&pool);
            let count = pool_config.min_idle;
            match tokio::task::spawn_blocking(move || warm.prefill(count)).await? {
                Ok(opened) => tracing::info!(pool = %pool_config.name, opened, "Pool prefilled"),
                Err(e) => tracing::warn!(pool = %pool_config.name, error = %e, "Pool prefill incomplete"),
            }
        }

        registry.register(pool)?;
    }

    let shutdown = Shutdown::new();

    let monitor = LeakMonitor::new(registry.clone(), config.leak_detection.clone());
    let monitor_task = tokio::spawn(monitor.run(shutdown.subscribe()));

    let server = CommandServer::bind(&config.command, registry.clone()).await?;
    let server_task = tokio::spawn(server.run(shutdown.subscribe()));

    signals::wait_for_termination().await;
    shutdown.trigger();

    let _ = monitor_task.await;
    match server_task.await {
        Ok(Err(e)) => tracing::error!(error = %e, "Command server failed"),
        Err(e) => tracing::error!(error = %e, "Command server task panicked"),
        Ok(Ok(())) => {}
    }

    let leaks = registry.shutdown_all();
    tracing::info!(outstanding = leaks.len(), "Shutdown complete");
    Ok(())
}

/// A pool of TCP connections to the configured backend address.
fn connection_pool(config: &PoolConfig) -> Result<HandlePool<TcpStream>, Box<dyn std::error::Error>> {
    let addr: SocketAddr = config.address.parse()?;
    let timeout = Duration::from_secs(config.connect_timeout_secs);
    Ok(HandlePool::from_config(config, move || {
        TcpStream::connect_timeout(&addr, timeout).map_err(BoxError::from)
    }))
}
