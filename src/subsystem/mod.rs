//! Subsystems supervised by the daemon.
//!
//! # Data Flow
//! ```text
//! SubsystemConfig (version, name, error reporter, store)
//!     → SubsystemBuilder::build (construction, may fail → absent handle)
//!     → SubsystemHandle::configure (option propagation, before start)
//!     → SubsystemHandle::start → running, may report errors
//!     → SubsystemHandle::stop (best effort, idempotent)
//! ```
//!
//! # Design Decisions
//! - Every subsystem owns its config and store exclusively
//! - Runtime failures leave through the error reporter, never by panicking
//! - Absent handles turn every lifecycle call into a no-op

pub mod builder;
pub mod handle;
pub mod ipam;
pub mod network;
pub mod service;

use std::fmt;
use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::options::{
    OptionValue, OPT_API_SERVER_URL, OPT_ENVIRONMENT, OPT_IPAM_QUERY_INTERVAL,
};
use crate::store::{Store, StoreError};

pub use builder::{DaemonSubsystems, SubsystemBuilder};
pub use handle::SubsystemHandle;

/// Name of the main service; also the daemon's log name.
pub const SERVICE_NAME: &str = "netplane";
pub const NETWORK_PLUGIN_NAME: &str = "netplane-net";
pub const IPAM_PLUGIN_NAME: &str = "netplane-ipam";

/// Errors raised by subsystems.
#[derive(Debug, Error)]
pub enum SubsystemError {
    #[error("invalid option --{option}: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("subsystem already started")]
    AlreadyStarted,

    #[error("background task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Runtime(String),
}

/// The three subsystems, in start and stop order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemKind {
    Service,
    NetworkPlugin,
    IpamPlugin,
}

impl SubsystemKind {
    pub const ORDER: [SubsystemKind; 3] = [
        SubsystemKind::Service,
        SubsystemKind::NetworkPlugin,
        SubsystemKind::IpamPlugin,
    ];

    /// Subsystem name, which also names its store file.
    pub const fn name(self) -> &'static str {
        match self {
            SubsystemKind::Service => SERVICE_NAME,
            SubsystemKind::NetworkPlugin => NETWORK_PLUGIN_NAME,
            SubsystemKind::IpamPlugin => IPAM_PLUGIN_NAME,
        }
    }

    /// Resolved options propagated onto this subsystem before start.
    pub const fn options(self) -> &'static [&'static str] {
        match self {
            SubsystemKind::Service => &[OPT_API_SERVER_URL],
            SubsystemKind::NetworkPlugin => &[OPT_API_SERVER_URL],
            SubsystemKind::IpamPlugin => {
                &[OPT_ENVIRONMENT, OPT_API_SERVER_URL, OPT_IPAM_QUERY_INTERVAL]
            }
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubsystemKind::Service => "main service",
            SubsystemKind::NetworkPlugin => "network plugin",
            SubsystemKind::IpamPlugin => "IPAM plugin",
        };
        f.write_str(label)
    }
}

/// Sending side of a subsystem's error-report channel.
///
/// Holds a single pending error; further reports while one is pending are
/// dropped.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    subsystem: String,
    tx: mpsc::Sender<SubsystemError>,
}

impl ErrorReporter {
    /// Create a reporter and its capacity-1 receiving end.
    pub fn channel(subsystem: &str) -> (Self, mpsc::Receiver<SubsystemError>) {
        let (tx, rx) = mpsc::channel(1);
        (
            Self {
                subsystem: subsystem.to_string(),
                tx,
            },
            rx,
        )
    }

    /// Report a runtime error. Returns whether it was queued.
    pub fn report(&self, error: SubsystemError) -> bool {
        match self.tx.try_send(error) {
            Ok(()) => true,
            Err(TrySendError::Full(error)) => {
                tracing::debug!(
                    subsystem = %self.subsystem,
                    error = %error,
                    "Error already pending, dropping report"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Per-subsystem configuration, owned by the subsystem after construction.
#[derive(Debug, Clone)]
pub struct SubsystemConfig {
    pub version: String,
    pub name: String,
    pub errors: ErrorReporter,
    pub store: Store,
}

/// A supervised unit of functionality.
#[async_trait]
pub trait Subsystem: Send {
    /// Set one named option. Only meaningful before `start`.
    fn configure(&mut self, option: &str, value: &OptionValue);

    /// Bring the subsystem up. Called at most once.
    async fn start(&mut self, config: &SubsystemConfig) -> Result<(), SubsystemError>;

    /// Best-effort shutdown. Safe without a prior successful start, and on a
    /// second call.
    async fn stop(&mut self) -> Result<(), SubsystemError>;
}

/// Reject `value` for `option` unless it is empty or an absolute URL.
pub(crate) fn validate_url(option: &str, value: &str) -> Result<(), SubsystemError> {
    if value.is_empty() {
        return Ok(());
    }
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| SubsystemError::InvalidOption {
            option: option.to_string(),
            reason: format!("'{}' is not a URL: {}", value, e),
        })
}
