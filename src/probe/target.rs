//! Probe targets.

use crate::command::protocol::{LOCAL_LIST, REMOTE_LIST};

/// Where the probed service runs relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locality {
    Local,
    Remote,
}

impl Locality {
    /// Readiness command answered by a live service at this locality.
    pub fn readiness_command(&self) -> &'static str {
        match self {
            Locality::Local => LOCAL_LIST,
            Locality::Remote => REMOTE_LIST,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locality::Local => "local",
            Locality::Remote => "remote",
        }
    }
}

/// A service endpoint to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub locality: Locality,
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, port: u16, locality: Locality) -> Self {
        Self {
            host: host.into(),
            port,
            locality,
        }
    }

    pub fn local(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, Locality::Local)
    }

    pub fn remote(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, Locality::Remote)
    }
}

impl std::fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
