//! Configuration loading from disk.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::DaemonConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DaemonConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load the configuration file, falling back to defaults when it does not exist.
pub fn load_or_default(path: &Path) -> Result<DaemonConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let config = DaemonConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
        Err(e) => Err(ConfigError::Io(e)),
    }
}

fn parse_config(content: &str) -> Result<DaemonConfig, ConfigError> {
    let config: DaemonConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netplane.toml");
        fs::write(
            &path,
            "runtime_path = \"/run/netplane\"\n[service]\nlisten_address = \"0.0.0.0:9000\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.runtime_path, PathBuf::from("/run/netplane"));
        assert_eq!(config.service.listen_address, "0.0.0.0:9000");
        assert_eq!(config.ipam.default_query_interval_secs, 10);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.runtime_path, PathBuf::from("/var/lib/netplane"));

        assert!(matches!(
            load_config(&dir.path().join("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netplane.toml");
        fs::write(&path, "[ipam]\ndefault_query_interval_secs = 0\n").unwrap();

        let err = load_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("default_query_interval_secs"));
    }

    #[test]
    fn test_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netplane.toml");
        fs::write(&path, "runtime_path = [").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }
}
