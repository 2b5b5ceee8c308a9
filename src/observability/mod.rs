//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Normal-context code (bootstrap, registration, workers):
//!     → logging.rs (structured tracing events)
//!
//! SIGIO handler:
//!     → atomic dispatch counters only (no logging, no allocation)
//!     → reporter.rs snapshots them periodically
//!     → logged + published through metrics.rs
//! ```
//!
//! # Design Decisions
//! - The handler never touches the tracing or metrics machinery
//! - Metrics exporter is optional and disabled by default

pub mod logging;
pub mod metrics;
pub mod reporter;
