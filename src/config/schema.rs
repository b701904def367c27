//! Configuration schema definitions.
//!
//! Deployment settings that do not belong on the command line. All types
//! derive Serde traits for deserialization from the TOML config file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Directory holding one store file per subsystem.
    pub runtime_path: PathBuf,

    /// Main service settings.
    pub service: ServiceConfig,

    /// Log sink settings.
    pub logging: LoggingConfig,

    /// Address-management plugin settings.
    pub ipam: IpamConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            runtime_path: PathBuf::from("/var/lib/netplane"),
            service: ServiceConfig::default(),
            logging: LoggingConfig::default(),
            ipam: IpamConfig::default(),
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address for the REST listener (e.g., "127.0.0.1:10090").
    pub listen_address: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:10090".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the log file when logging to a file.
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/log"),
        }
    }
}

/// Address-management plugin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IpamConfig {
    /// Refresh interval used when no query interval is given on the command line.
    pub default_query_interval_secs: u64,
}

impl Default for IpamConfig {
    fn default() -> Self {
        Self {
            default_query_interval_secs: 10,
        }
    }
}
