//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NexusConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::NexusConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("nexus.udp_port must not be 0")]
    ZeroPort,

    #[error("workers.count must be at least 1")]
    NoWorkers,

    #[error("workers.first_tid {first_tid} + count {count} exceeds 256 thread ids")]
    TidRangeOverflow { first_tid: u8, count: usize },

    #[error("observability.stats_interval_secs must be at least 1")]
    ZeroStatsInterval,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    BadMetricsAddress(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &NexusConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nexus.udp_port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if config.workers.count == 0 {
        errors.push(ValidationError::NoWorkers);
    } else if config.workers.first_tid as usize + config.workers.count > 256 {
        errors.push(ValidationError::TidRangeOverflow {
            first_tid: config.workers.first_tid,
            count: config.workers.count,
        });
    }

    let obs = &config.observability;
    if obs.stats_interval_secs == 0 {
        errors.push(ValidationError::ZeroStatsInterval);
    }
    if !LOG_LEVELS.contains(&obs.log_level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
