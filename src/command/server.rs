//! TCP command server.
//!
//! # Responsibilities
//! - Bind the configured command address
//! - Bound concurrent sessions with a semaphore
//! - Read one command per line and write one reply per line
//! - Stop accepting on the shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Semaphore};
use tokio::time;

use crate::command::handler::CommandHandler;
use crate::command::protocol::{read_line_bounded, LineRead, Reply, MAX_COMMAND_LEN};
use crate::config::CommandConfig;
use crate::pool::PoolRegistry;

/// Errors raised by the command server.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct CommandServer {
    listener: TcpListener,
    handler: CommandHandler,
    session_limit: Arc<Semaphore>,
    read_timeout: Duration,
}

impl CommandServer {
    /// Bind the configured address.
    pub async fn bind(config: &CommandConfig, registry: PoolRegistry) -> Result<Self, CommandError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|_| CommandError::InvalidAddress(config.bind_address.clone()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| CommandError::Bind { addr, source })?;
        Ok(Self::from_listener(listener, config, registry))
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, config: &CommandConfig, registry: PoolRegistry) -> Self {
        Self {
            listener,
            handler: CommandHandler::new(registry, config.remote_enabled),
            session_limit: Arc::new(Semaphore::new(config.max_connections)),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, CommandError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), CommandError> {
        tracing::info!(address = %self.local_addr()?, "Command server listening");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept command connection");
                            continue;
                        }
                    };

                    let permit = match Arc::clone(&self.session_limit).try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            tracing::warn!(peer = %peer, "Command session limit reached, rejecting");
                            tokio::spawn(reject(stream));
                            continue;
                        }
                    };

                    let handler = self.handler.clone();
                    let read_timeout = self.read_timeout;
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = serve_session(stream, peer, handler, read_timeout).await {
                            tracing::debug!(peer = %peer, error = %e, "Command session ended with error");
                        }
                    });
                }
                _ = shutdown.recv() => {
                    tracing::info!("Command server received shutdown signal, exiting loop");
                    break;
                }
            }
        }
        Ok(())
    }
}

async fn reject(mut stream: TcpStream) {
    let reply = Reply::Err("too many command sessions".to_string());
    let _ = stream.write_all(reply.encode().as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn serve_session(
    stream: TcpStream,
    peer: SocketAddr,
    handler: CommandHandler,
    read_timeout: Duration,
) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    loop {
        let line = match time::timeout(read_timeout, read_line_bounded(&mut reader, MAX_COMMAND_LEN)).await {
            Ok(Ok(LineRead::Line(line))) => line,
            Ok(Ok(LineRead::Eof)) => return Ok(()),
            Ok(Ok(LineRead::TooLong)) => {
                tracing::warn!(peer = %peer, limit = MAX_COMMAND_LEN, "Command line too long, closing session");
                let reply = Reply::Err(format!("command exceeds {MAX_COMMAND_LEN} bytes"));
                write.write_all(reply.encode().as_bytes()).await?;
                write.shutdown().await?;
                return Ok(());
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::debug!(peer = %peer, "Command session idle, closing");
                return Ok(());
            }
        };

        let command = line.trim();
        let reply = handler.handle(command, peer);
        tracing::debug!(peer = %peer, command, ok = reply.is_ok(), "Command served");
        write.write_all(reply.encode().as_bytes()).await?;
    }
}
