//! Address-management (IPAM) plugin.
//!
//! # Responsibilities
//! - Load persisted address pools on start
//! - Refresh address state on a fixed query interval
//! - Report refresh failures through the error channel
//!
//! # Design Decisions
//! - Unset query interval falls back to the file configuration default
//! - Non-positive intervals are rejected at start, not at configure time

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::options::{
    OptionValue, ENVIRONMENT_PUBLIC, OPT_API_SERVER_URL, OPT_ENVIRONMENT, OPT_IPAM_QUERY_INTERVAL,
};
use crate::lifecycle::shutdown::{Shutdown, ShutdownListener};
use crate::store::Store;
use crate::subsystem::{validate_url, ErrorReporter, Subsystem, SubsystemConfig, SubsystemError};

const POOLS_KEY: &str = "pools";
const REFRESH_KEY: &str = "refresh";

/// An address pool persisted by the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPool {
    pub id: String,
    pub subnet: String,
    #[serde(default)]
    pub allocated: Vec<String>,
}

/// Record persisted under the `refresh` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    pub environment: String,
    pub refreshes: u64,
    pub last_refresh_unix: u64,
}

/// Plugin that owns address allocation state.
pub struct IpamPlugin {
    environment: String,
    api_server_url: String,
    query_interval: Option<i64>,
    default_interval: Duration,
    pools: Vec<AddressPool>,
    shutdown: Shutdown,
    worker: Option<JoinHandle<()>>,
}

impl IpamPlugin {
    pub fn new(default_interval: Duration) -> Self {
        Self {
            environment: ENVIRONMENT_PUBLIC.to_string(),
            api_server_url: String::new(),
            query_interval: None,
            default_interval,
            pools: Vec::new(),
            shutdown: Shutdown::new(),
            worker: None,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn pools(&self) -> &[AddressPool] {
        &self.pools
    }

    /// Effective refresh interval.
    pub fn interval(&self) -> Result<Duration, SubsystemError> {
        match self.query_interval {
            None => Ok(self.default_interval),
            Some(secs) if secs > 0 => Ok(Duration::from_secs(secs as u64)),
            Some(secs) => Err(SubsystemError::InvalidOption {
                option: OPT_IPAM_QUERY_INTERVAL.to_string(),
                reason: format!("interval must be positive, got {}", secs),
            }),
        }
    }
}

#[async_trait]
impl Subsystem for IpamPlugin {
    fn configure(&mut self, option: &str, value: &OptionValue) {
        match option {
            OPT_ENVIRONMENT => {
                if let Some(environment) = value.as_str() {
                    self.environment = environment.to_string();
                }
            }
            OPT_API_SERVER_URL => {
                if let Some(url) = value.as_str() {
                    self.api_server_url = url.to_string();
                }
            }
            OPT_IPAM_QUERY_INTERVAL => self.query_interval = value.as_int(),
            _ => tracing::debug!(option, "Option not used by the IPAM plugin"),
        }
    }

    async fn start(&mut self, config: &SubsystemConfig) -> Result<(), SubsystemError> {
        if self.worker.is_some() {
            return Err(SubsystemError::AlreadyStarted);
        }
        let interval = self.interval()?;
        validate_url(OPT_API_SERVER_URL, &self.api_server_url)?;

        self.pools = config.store.read(POOLS_KEY)?.unwrap_or_default();
        let record: RefreshRecord = config.store.read(REFRESH_KEY)?.unwrap_or_default();

        let worker = RefreshWorker {
            store: config.store.clone(),
            errors: config.errors.clone(),
            environment: self.environment.clone(),
            interval,
            record,
        };
        self.worker = Some(tokio::spawn(worker.run(self.shutdown.subscribe())));

        tracing::info!(
            subsystem = %config.name,
            environment = %self.environment,
            pools = self.pools.len(),
            interval_secs = interval.as_secs(),
            "IPAM plugin started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SubsystemError> {
        self.shutdown.trigger();
        if let Some(worker) = self.worker.take() {
            worker
                .await
                .map_err(|e| SubsystemError::Task(e.to_string()))?;
            tracing::info!("IPAM plugin stopped");
        }
        Ok(())
    }
}

struct RefreshWorker {
    store: Store,
    errors: ErrorReporter,
    environment: String,
    interval: Duration,
    record: RefreshRecord,
}

impl RefreshWorker {
    async fn run(mut self, mut shutdown: ShutdownListener) {
        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh() {
                        tracing::error!(error = %e, "IPAM refresh failed");
                        self.errors.report(e);
                        break;
                    }
                }
                _ = shutdown.wait() => {
                    tracing::debug!("IPAM refresh worker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn refresh(&mut self) -> Result<(), SubsystemError> {
        self.record.environment = self.environment.clone();
        self.record.refreshes += 1;
        self.record.last_refresh_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.store.write(REFRESH_KEY, &self.record)?;
        tracing::debug!(refreshes = self.record.refreshes, "IPAM state refreshed");
        Ok(())
    }
}
