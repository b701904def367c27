//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DaemonConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DaemonConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("runtime_path must not be empty")]
    EmptyRuntimePath,

    #[error("service.listen_address '{0}' is not a socket address")]
    InvalidListenAddress(String),

    #[error("ipam.default_query_interval_secs must be greater than zero")]
    ZeroQueryInterval,
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.runtime_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRuntimePath);
    }

    if config.service.listen_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidListenAddress(
            config.service.listen_address.clone(),
        ));
    }

    if config.ipam.default_query_interval_secs == 0 {
        errors.push(ValidationError::ZeroQueryInterval);
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
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DaemonConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DaemonConfig::default();
        config.runtime_path = PathBuf::new();
        config.service.listen_address = "localhost".into();
        config.ipam.default_query_interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::InvalidListenAddress("localhost".into())));
    }
}
