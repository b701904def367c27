//! Subsystem construction.

use std::time::Duration;

use crate::config::schema::DaemonConfig;
use crate::subsystem::ipam::IpamPlugin;
use crate::subsystem::network::NetworkPlugin;
use crate::subsystem::service::RestService;
use crate::subsystem::{Subsystem, SubsystemConfig, SubsystemError, SubsystemKind};

/// Constructs the subsystem for a given slot.
pub trait SubsystemBuilder: Send + Sync {
    fn build(
        &self,
        kind: SubsystemKind,
        config: &SubsystemConfig,
    ) -> Result<Box<dyn Subsystem>, SubsystemError>;
}

/// Builds the daemon's concrete subsystems from the file configuration.
#[derive(Debug, Clone)]
pub struct DaemonSubsystems {
    config: DaemonConfig,
}

impl DaemonSubsystems {
    pub fn new(config: DaemonConfig) -> Self {
        Self { config }
    }
}

impl SubsystemBuilder for DaemonSubsystems {
    fn build(
        &self,
        kind: SubsystemKind,
        config: &SubsystemConfig,
    ) -> Result<Box<dyn Subsystem>, SubsystemError> {
        tracing::debug!(subsystem = %config.name, kind = %kind, "Constructing subsystem");
        let subsystem: Box<dyn Subsystem> = match kind {
            SubsystemKind::Service => Box::new(RestService::new(
                self.config.service.listen_address.clone(),
            )),
            SubsystemKind::NetworkPlugin => Box::new(NetworkPlugin::new()),
            SubsystemKind::IpamPlugin => Box::new(IpamPlugin::new(Duration::from_secs(
                self.config.ipam.default_query_interval_secs,
            ))),
        };
        Ok(subsystem)
    }
}
