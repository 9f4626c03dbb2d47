//! Command handling.

use std::net::SocketAddr;

use serde::Serialize;

use crate::command::protocol::{Reply, LEAK_REPORT, LOCAL_LIST, REMOTE_LIST};
use crate::pool::PoolRegistry;

/// Answers commands against the pools in a registry.
#[derive(Clone)]
pub struct CommandHandler {
    registry: PoolRegistry,
    remote_enabled: bool,
}

fn json<T: Serialize>(value: &T) -> Reply {
    match serde_json::to_string(value) {
        Ok(payload) => Reply::Ok(payload),
        Err(e) => Reply::Err(format!("failed to encode reply: {e}")),
    }
}

/// Loopback peers, including IPv4 loopback seen through a dual-stack socket.
fn is_loopback(peer: SocketAddr) -> bool {
    peer.ip().to_canonical().is_loopback()
}

impl CommandHandler {
    pub fn new(registry: PoolRegistry, remote_enabled: bool) -> Self {
        Self {
            registry,
            remote_enabled,
        }
    }

    pub fn handle(&self, command: &str, peer: SocketAddr) -> Reply {
        match command {
            LOCAL_LIST => {
                if !is_loopback(peer) {
                    tracing::warn!(peer = %peer, "Refused local-list from non-loopback peer");
                    return Reply::Err(format!("{LOCAL_LIST} refused for non-loopback peer {}", peer.ip()));
                }
                json(&self.registry.statuses())
            }
            REMOTE_LIST => {
                if !self.remote_enabled {
                    return Reply::Unknown(REMOTE_LIST.to_string());
                }
                json(&self.registry.statuses())
            }
            LEAK_REPORT => {
                // Captured contexts carry call sites and backtraces.
                if !self.remote_enabled && !is_loopback(peer) {
                    tracing::warn!(peer = %peer, "Refused leak-report from non-loopback peer");
                    return Reply::Err(format!("{LEAK_REPORT} refused for non-loopback peer {}", peer.ip()));
                }
                json(&self.registry.leaks())
            }
            "" => Reply::Err("empty command".to_string()),
            other => Reply::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptureMode;
    use crate::janitor::RecordingJanitor;
    use crate::pool::HandlePool;
    use std::sync::Arc;

    fn loopback() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn remote_peer() -> SocketAddr {
        "10.0.0.5:40000".parse().unwrap()
    }

    fn registry() -> (PoolRegistry, Arc<HandlePool<()>>) {
        let registry = PoolRegistry::new();
        let pool = Arc::new(HandlePool::new(
            "orders",
            4,
            Box::new(RecordingJanitor::new("orders", CaptureMode::Handle, 8)),
            || Ok(()),
        ));
        registry.register(pool.clone()).unwrap();
        (registry, pool)
    }

    #[test]
    fn local_list_returns_statuses() {
        let (registry, _pool) = registry();
        let handler = CommandHandler::new(registry, false);

        let Reply::Ok(payload) = handler.handle(LOCAL_LIST, loopback()) else {
            panic!("local-list should succeed on loopback");
        };
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value[0]["name"], "orders");
        assert_eq!(value[0]["janitor"], "recording");
        assert_eq!(value[0]["recording"], true);
    }

    #[test]
    fn local_list_refused_for_remote_peer() {
        let (registry, _pool) = registry();
        let handler = CommandHandler::new(registry, true);
        assert!(matches!(handler.handle(LOCAL_LIST, remote_peer()), Reply::Err(_)));
    }

    #[test]
    fn local_list_accepts_mapped_ipv4_loopback() {
        let (registry, _pool) = registry();
        let handler = CommandHandler::new(registry, false);
        let mapped: SocketAddr = "[::ffff:127.0.0.1]:40000".parse().unwrap();
        assert!(handler.handle(LOCAL_LIST, mapped).is_ok());

        let v6: SocketAddr = "[::1]:40000".parse().unwrap();
        assert!(handler.handle(LOCAL_LIST, v6).is_ok());

        let mapped_remote: SocketAddr = "[::ffff:10.0.0.5]:40000".parse().unwrap();
        assert!(matches!(handler.handle(LOCAL_LIST, mapped_remote), Reply::Err(_)));
    }

    #[test]
    fn leak_report_refused_for_remote_peer_unless_enabled() {
        let registry = PoolRegistry::new();
        let pool = Arc::new(HandlePool::new(
            "orders",
            4,
            Box::new(RecordingJanitor::new("orders", CaptureMode::Backtrace, 8)),
            || Ok(()),
        ));
        registry.register(pool.clone()).unwrap();
        let _held = pool.checkout().unwrap();

        let closed = CommandHandler::new(registry.clone(), false);
        let Reply::Err(message) = closed.handle(LEAK_REPORT, remote_peer()) else {
            panic!("leak-report should be refused");
        };
        assert!(!message.contains("backtrace"));
        assert!(closed.handle(LEAK_REPORT, loopback()).is_ok());

        let open = CommandHandler::new(registry, true);
        assert!(open.handle(LEAK_REPORT, remote_peer()).is_ok());
    }

    #[test]
    fn remote_list_requires_opt_in() {
        let (registry, _pool) = registry();
        let closed = CommandHandler::new(registry.clone(), false);
        assert_eq!(
            closed.handle(REMOTE_LIST, remote_peer()),
            Reply::Unknown(REMOTE_LIST.to_string())
        );

        let open = CommandHandler::new(registry, true);
        assert!(open.handle(REMOTE_LIST, remote_peer()).is_ok());
    }

    #[test]
    fn leak_report_lists_outstanding_handles() {
        let (registry, pool) = registry();
        let handler = CommandHandler::new(registry, false);
        let held = pool.checkout().unwrap();

        let Reply::Ok(payload) = handler.handle(LEAK_REPORT, loopback()) else {
            panic!("leak-report should succeed");
        };
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value[0]["pool"], "orders");
        assert_eq!(value[0]["outstanding"][0]["handle"], held.id().as_u64());
    }

    #[test]
    fn unknown_and_empty_commands() {
        let (registry, _pool) = registry();
        let handler = CommandHandler::new(registry, false);
        assert_eq!(handler.handle("deploy", loopback()), Reply::Unknown("deploy".into()));
        assert!(matches!(handler.handle("", loopback()), Reply::Err(_)));
    }
}
