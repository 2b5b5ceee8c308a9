//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → NexusConfig (validated, immutable)
//!     → startup reads port, workers, observability settings
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the control port cannot move at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::NexusConfig;
pub use schema::NexusSection;
pub use schema::ObservabilityConfig;
pub use schema::WorkerConfig;
