//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listen, "0.0.0.0:8000");
        assert!(config.tls);
        assert_eq!(config.resources.len(), 5);
    }

    #[test]
    fn test_parse_overrides() {
        let config = parse_config(
            r#"
            listen = "127.0.0.1:9443"
            path = "/srv/restic"
            append_only = true
            resources = ["blobs", "locks"]

            [observability]
            debug = true
            "#,
        )
        .unwrap();
        assert_eq!(config.listen, "127.0.0.1:9443");
        assert_eq!(config.path, Path::new("/srv/restic"));
        assert!(config.append_only);
        assert_eq!(config.resources, vec!["blobs", "locks"]);
        assert!(config.observability.debug);
    }

    #[test]
    fn test_validation_errors_are_collected() {
        let err = parse_config(
            r#"
            listen = "nowhere"
            max_upload_bytes = 0
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_config("listen = "),
            Err(ConfigError::Parse(_))
        ));
    }
}
