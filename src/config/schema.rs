//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Control-plane port used when none is configured.
pub const DEFAULT_UDP_PORT: u16 = 31851;

/// Root configuration for the Nexus daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct NexusConfig {
    /// Control channel settings.
    pub nexus: NexusSection,

    /// Endpoint worker threads.
    pub workers: WorkerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Control channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NexusSection {
    /// UDP port bound on the wildcard address.
    pub udp_port: u16,
}

impl Default for NexusSection {
    fn default() -> Self {
        Self {
            udp_port: DEFAULT_UDP_PORT,
        }
    }
}

/// Endpoint worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of endpoint threads.
    pub count: usize,

    /// Thread id of the first endpoint; the rest follow consecutively.
    pub first_tid: u8,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 2,
            first_tid: 0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Interval between dispatch statistics reports, in seconds.
    pub stats_interval_secs: u64,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval_secs: 10,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
