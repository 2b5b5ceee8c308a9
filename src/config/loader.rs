//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::NexusConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<NexusConfig, ConfigError> {
    let config: NexusConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<NexusConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, NexusConfig::default());
        assert_eq!(config.nexus.udp_port, 31851);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [nexus]
            udp_port = 40000

            [workers]
            count = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.nexus.udp_port, 40000);
        assert_eq!(config.workers.count, 4);
        assert_eq!(config.workers.first_tid, 0);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = parse_config("[nexus\nudp_port = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn semantic_errors_are_all_reported() {
        let err = parse_config(
            r#"
            [nexus]
            udp_port = 0

            [workers]
            count = 0
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("rpc-nexus-config-{}.toml", std::process::id()));
        fs::write(&path, "[observability]\nlog_level = \"debug\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.observability.log_level, "debug");

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/rpc-nexus.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
