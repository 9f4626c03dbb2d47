//! The ping operation.

use thiserror::Error;

use crate::observability::metrics;
use crate::probe::dispatch::{CommandDispatcher, DispatchError};
use crate::probe::target::ProbeTarget;

/// Why a target could not be pinged.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The readiness command is not available on the target.
    #[error("Unable to ping {host}:{port}")]
    Unreachable { host: String, port: u16 },

    /// Dispatching the readiness command raised a fault.
    #[error("Unable to ping {host}:{port} ({source})")]
    Dispatch {
        host: String,
        port: u16,
        #[source]
        source: DispatchError,
    },
}

/// Check that `target` answers the readiness command for its locality.
pub async fn ping<D: CommandDispatcher>(dispatcher: &D, target: &ProbeTarget) -> Result<(), ProbeError> {
    let command = target.locality.readiness_command();
    let result = match dispatcher.is_command_available(target, command).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(ProbeError::Unreachable {
            host: target.host.clone(),
            port: target.port,
        }),
        Err(source) => Err(ProbeError::Dispatch {
            host: target.host.clone(),
            port: target.port,
            source,
        }),
    };

    metrics::record_probe(target.locality.as_str(), result.is_ok());
    match &result {
        Ok(()) => tracing::debug!(endpoint = %target, command, "Ping succeeded"),
        Err(e) => tracing::debug!(endpoint = %target, command, error = %e, "Ping failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::sync::Mutex;

    /// Dispatcher returning canned outcomes and remembering what it was asked.
    struct Scripted {
        local: fn() -> Result<bool, DispatchError>,
        remote: fn() -> Result<bool, DispatchError>,
        asked: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(local: fn() -> Result<bool, DispatchError>, remote: fn() -> Result<bool, DispatchError>) -> Self {
            Self {
                local,
                remote,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl CommandDispatcher for Scripted {
        async fn is_command_available(&self, _target: &ProbeTarget, command: &str) -> Result<bool, DispatchError> {
            self.asked.lock().unwrap().push(command.to_string());
            match command {
                "local-list" => (self.local)(),
                "remote-list" => (self.remote)(),
                other => panic!("unexpected command {other}"),
            }
        }
    }

    #[tokio::test]
    async fn local_target_succeeds_when_local_list_does() {
        let dispatcher = Scripted::new(|| Ok(true), || Ok(false));
        let target = ProbeTarget::local("localhost", 9999);

        assert!(ping(&dispatcher, &target).await.is_ok());
        assert_eq!(*dispatcher.asked.lock().unwrap(), vec!["local-list"]);
    }

    #[tokio::test]
    async fn remote_target_failure_names_host_and_port() {
        let dispatcher = Scripted::new(|| Ok(true), || Ok(false));
        let target = ProbeTarget::remote("10.0.0.5", 9999);

        let err = ping(&dispatcher, &target).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to ping 10.0.0.5:9999");
        assert!(err.source().is_none());
        assert_eq!(*dispatcher.asked.lock().unwrap(), vec!["remote-list"]);
    }

    #[tokio::test]
    async fn dispatch_fault_is_wrapped_with_cause() {
        let dispatcher = Scripted::new(
            || {
                Err(DispatchError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            },
            || Ok(true),
        );
        let target = ProbeTarget::local("localhost", 9999);

        let err = ping(&dispatcher, &target).await.unwrap_err();
        assert_eq!(err.to_string(), "Unable to ping localhost:9999 (connection refused)");
        let source = err.source().expect("original fault preserved");
        assert_eq!(source.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn unrelated_fault_is_converted_too() {
        let dispatcher = Scripted::new(|| Ok(true), || Err(DispatchError::Remote("bad configuration".into())));
        let target = ProbeTarget::remote("db.internal", 4000);

        let err = ping(&dispatcher, &target).await.unwrap_err();
        assert!(matches!(err, ProbeError::Dispatch { ref host, port: 4000, .. } if host == "db.internal"));
        assert_eq!(err.to_string(), "Unable to ping db.internal:4000 (bad configuration)");
    }
}
