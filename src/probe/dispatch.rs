//! Command dispatch to a probe target.
//!
//! # Responsibilities
//! - Deliver a named command to a target and classify the reply
//! - Bound every round trip by a timeout
//!
//! # Design Decisions
//! - `UNKNOWN` means "command not available", not an error
//! - `ERR` and transport failures are errors carrying their message

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;

use crate::command::protocol::{read_line_bounded, LineRead, MalformedReply, Reply, MAX_REPLY_LEN};
use crate::config::ProbeConfig;
use crate::probe::target::ProbeTarget;

/// Faults raised while dispatching a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The target understood the command but reported a failure.
    #[error("{0}")]
    Remote(String),

    #[error(transparent)]
    Protocol(#[from] MalformedReply),

    #[error("connection closed before a reply was received")]
    NoReply,

    #[error("reply exceeds {0} bytes")]
    ReplyTooLong(usize),
}

/// Collaborator that runs a named command against a target.
pub trait CommandDispatcher: Send + Sync {
    /// Whether `command` completes successfully on `target`.
    fn is_command_available(
        &self,
        target: &ProbeTarget,
        command: &str,
    ) -> impl Future<Output = Result<bool, DispatchError>> + Send;
}

/// Dispatcher speaking the line protocol over TCP.
#[derive(Debug, Clone)]
pub struct TcpDispatcher {
    timeout: Duration,
    max_reply_len: usize,
}

impl TcpDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_reply_len: MAX_REPLY_LEN,
        }
    }

    /// Cap on the reply line, newline excluded.
    pub fn with_max_reply_len(mut self, max_reply_len: usize) -> Self {
        self.max_reply_len = max_reply_len;
        self
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Send `command` and return the raw reply.
    pub async fn send(&self, target: &ProbeTarget, command: &str) -> Result<Reply, DispatchError> {
        match time::timeout(self.timeout, round_trip(target, command, self.max_reply_len)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        }
    }
}

impl Default for TcpDispatcher {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

async fn round_trip(target: &ProbeTarget, command: &str, max_reply_len: usize) -> Result<Reply, DispatchError> {
    let stream = TcpStream::connect((target.host.as_str(), target.port)).await?;
    let (read, mut write) = stream.into_split();

    write.write_all(format!("{command}\n").as_bytes()).await?;
    write.flush().await?;

    match read_line_bounded(&mut BufReader::new(read), max_reply_len).await? {
        LineRead::Line(line) => Ok(Reply::parse(&line)?),
        LineRead::Eof => Err(DispatchError::NoReply),
        LineRead::TooLong => Err(DispatchError::ReplyTooLong(max_reply_len)),
    }
}

impl CommandDispatcher for TcpDispatcher {
    async fn is_command_available(&self, target: &ProbeTarget, command: &str) -> Result<bool, DispatchError> {
        match self.send(target, command).await? {
            Reply::Ok(_) => Ok(true),
            Reply::Unknown(_) => Ok(false),
            Reply::Err(message) => Err(DispatchError::Remote(message)),
        }
    }
}
