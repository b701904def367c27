//! Network-configuration plugin.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::options::{OptionValue, OPT_API_SERVER_URL};
use crate::store::Store;
use crate::subsystem::{validate_url, Subsystem, SubsystemConfig, SubsystemError};

const NETWORKS_KEY: &str = "networks";
const PLUGIN_KEY: &str = "plugin";

/// A network persisted by the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: String,
    pub bridge: String,
    pub subnet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginPhase {
    Running,
    Stopped,
}

/// Record persisted under the `plugin` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub state: PluginPhase,
    pub api_server_url: String,
}

/// Plugin that owns host network configuration.
#[derive(Debug, Default)]
pub struct NetworkPlugin {
    api_server_url: String,
    networks: Vec<NetworkRecord>,
    store: Option<Store>,
}

impl NetworkPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Networks loaded from the store at start.
    pub fn networks(&self) -> &[NetworkRecord] {
        &self.networks
    }

    fn record(&self, state: PluginPhase) -> PluginRecord {
        PluginRecord {
            state,
            api_server_url: self.api_server_url.clone(),
        }
    }
}

#[async_trait]
impl Subsystem for NetworkPlugin {
    fn configure(&mut self, option: &str, value: &OptionValue) {
        match (option, value.as_str()) {
            (OPT_API_SERVER_URL, Some(url)) => self.api_server_url = url.to_string(),
            _ => tracing::debug!(option, "Option not used by the network plugin"),
        }
    }

    async fn start(&mut self, config: &SubsystemConfig) -> Result<(), SubsystemError> {
        if self.store.is_some() {
            return Err(SubsystemError::AlreadyStarted);
        }
        validate_url(OPT_API_SERVER_URL, &self.api_server_url)?;

        self.networks = config.store.read(NETWORKS_KEY)?.unwrap_or_default();
        config.store.write(PLUGIN_KEY, &self.record(PluginPhase::Running))?;
        self.store = Some(config.store.clone());

        tracing::info!(
            subsystem = %config.name,
            networks = self.networks.len(),
            "Network plugin started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SubsystemError> {
        if let Some(store) = self.store.take() {
            store.write(PLUGIN_KEY, &self.record(PluginPhase::Stopped))?;
            tracing::info!("Network plugin stopped");
        }
        Ok(())
    }
}
