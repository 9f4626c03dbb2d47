//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use pool_janitor::command::CommandServer;
use pool_janitor::config::CommandConfig;
use pool_janitor::lifecycle::Shutdown;
use pool_janitor::pool::PoolRegistry;

/// Start a command server on an ephemeral loopback port.
pub async fn start_command_server(registry: PoolRegistry, remote_enabled: bool) -> (SocketAddr, Shutdown) {
    let config = CommandConfig {
        bind_address: "127.0.0.1:0".to_string(),
        remote_enabled,
        read_timeout_secs: 5,
        ..CommandConfig::default()
    };
    let listener = TcpListener::bind(&config.bind_address).await.unwrap();
    let server = CommandServer::from_listener(listener, &config, registry);
    let addr = server.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(rx).await;
    });

    (addr, shutdown)
}

/// Start a server that answers every command line with the same raw reply.
#[allow(dead_code)]
pub async fn start_fixed_reply_server(reply: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let (read, mut write) = socket.into_split();
                        let mut line = String::new();
                        let _ = BufReader::new(read).read_line(&mut line).await;
                        let _ = write.write_all(reply.as_bytes()).await;
                        let _ = write.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a server that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[allow(dead_code)]
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(300);
