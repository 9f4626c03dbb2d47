//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes and intervals > 0, addresses parse)
//! - Detect duplicate pool names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: JanitorServiceConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{JanitorKind, JanitorServiceConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid address '{value}' for {field}")]
    InvalidAddress { field: String, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: String },

    #[error("duplicate pool name '{0}'")]
    DuplicatePool(String),

    #[error("pool '{pool}' has min_idle {min_idle} above max_size {max_size}")]
    MinIdleAboveMax {
        pool: String,
        min_idle: usize,
        max_size: usize,
    },
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn check_nonzero(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero {
            field: field.to_string(),
        });
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &JanitorServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "command.bind_address", &config.command.bind_address);
    check_nonzero(&mut errors, "command.max_connections", config.command.max_connections as u64);
    check_nonzero(&mut errors, "command.read_timeout_secs", config.command.read_timeout_secs);
    check_nonzero(&mut errors, "probe.timeout_secs", config.probe.timeout_secs);

    if config.leak_detection.enabled {
        check_nonzero(&mut errors, "leak_detection.interval_secs", config.leak_detection.interval_secs);
        check_nonzero(
            &mut errors,
            "leak_detection.hold_threshold_secs",
            config.leak_detection.hold_threshold_secs,
        );
    }

    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let mut seen = HashSet::new();
    for pool in &config.pools {
        if !seen.insert(pool.name.as_str()) {
            errors.push(ValidationError::DuplicatePool(pool.name.clone()));
        }
        check_addr(&mut errors, &format!("pools.{}.address", pool.name), &pool.address);
        check_nonzero(&mut errors, &format!("pools.{}.max_size", pool.name), pool.max_size as u64);
        if pool.max_size > 0 && pool.min_idle > pool.max_size {
            errors.push(ValidationError::MinIdleAboveMax {
                pool: pool.name.clone(),
                min_idle: pool.min_idle,
                max_size: pool.max_size,
            });
        }
        if pool.janitor.kind == JanitorKind::Recording {
            check_nonzero(
                &mut errors,
                &format!("pools.{}.janitor.max_tracked_handles", pool.name),
                pool.janitor.max_tracked_handles as u64,
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PoolConfig;

    fn pool(name: &str) -> PoolConfig {
        PoolConfig {
            name: name.to_string(),
            address: "127.0.0.1:5432".to_string(),
            max_size: 4,
            min_idle: 0,
            connect_timeout_secs: 1,
            janitor: Default::default(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&JanitorServiceConfig::default()).is_ok());
    }

    #[test]
    fn duplicate_pools_rejected() {
        let mut config = JanitorServiceConfig::default();
        config.pools.push(pool("db"));
        config.pools.push(pool("db"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DuplicatePool("db".into())]);
    }

    #[test]
    fn bad_address_and_min_idle_reported_together() {
        let mut config = JanitorServiceConfig::default();
        let mut p = pool("db");
        p.address = "not-an-address".into();
        p.min_idle = 10;
        config.pools.push(p);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidAddress { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MinIdleAboveMax { .. })));
    }

    #[test]
    fn recording_janitor_needs_capacity() {
        let mut config = JanitorServiceConfig::default();
        let mut p = pool("db");
        p.janitor.kind = JanitorKind::Recording;
        p.janitor.max_tracked_handles = 0;
        config.pools.push(p);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Zero {
                field: "pools.db.janitor.max_tracked_handles".into()
            }]
        );
    }
}
