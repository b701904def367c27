//! Main REST service.
//!
//! # Responsibilities
//! - Bind the service listener on start
//! - Serve health, version and persisted-state endpoints
//! - Report a server failure through the error channel
//!
//! # Design Decisions
//! - Graceful shutdown wired to a `Shutdown` trigger owned by the service
//! - Start count and API server URL recorded in the store on every start

use std::collections::BTreeMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::options::{OptionValue, OPT_API_SERVER_URL};
use crate::lifecycle::shutdown::Shutdown;
use crate::store::Store;
use crate::subsystem::{validate_url, Subsystem, SubsystemConfig, SubsystemError};

const STATE_KEY: &str = "service";

/// Record persisted under the `service` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub api_server_url: String,
    pub start_count: u64,
}

/// Body of `GET /v1/version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

#[derive(Clone)]
struct AppState {
    name: String,
    version: String,
    store: Store,
}

/// The daemon's request-serving component.
pub struct RestService {
    listen_address: String,
    api_server_url: String,
    local_addr: Option<SocketAddr>,
    shutdown: Shutdown,
    server: Option<JoinHandle<()>>,
}

impl RestService {
    pub fn new(listen_address: String) -> Self {
        Self {
            listen_address,
            api_server_url: String::new(),
            local_addr: None,
            shutdown: Shutdown::new(),
            server: None,
        }
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/v1/version", get(version))
            .route("/v1/state", get(persisted_state))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Subsystem for RestService {
    fn configure(&mut self, option: &str, value: &OptionValue) {
        match (option, value.as_str()) {
            (OPT_API_SERVER_URL, Some(url)) => self.api_server_url = url.to_string(),
            _ => tracing::debug!(option, "Option not used by the REST service"),
        }
    }

    async fn start(&mut self, config: &SubsystemConfig) -> Result<(), SubsystemError> {
        if self.server.is_some() {
            return Err(SubsystemError::AlreadyStarted);
        }
        validate_url(OPT_API_SERVER_URL, &self.api_server_url)?;

        let listener = TcpListener::bind(&self.listen_address)
            .await
            .map_err(|source| SubsystemError::Bind {
                address: self.listen_address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| SubsystemError::Bind {
            address: self.listen_address.clone(),
            source,
        })?;

        let mut record: ServiceRecord = config.store.read(STATE_KEY)?.unwrap_or_default();
        record.start_count += 1;
        record.api_server_url = self.api_server_url.clone();
        config.store.write(STATE_KEY, &record)?;

        let router = Self::build_router(AppState {
            name: config.name.clone(),
            version: config.version.clone(),
            store: config.store.clone(),
        });
        let errors = config.errors.clone();
        let mut listener_shutdown = self.shutdown.subscribe();

        self.server = Some(tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { listener_shutdown.wait().await })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "REST server failed");
                errors.report(SubsystemError::Runtime(format!("REST server failed: {}", e)));
            }
        }));
        self.local_addr = Some(local_addr);

        tracing::info!(
            subsystem = %config.name,
            address = %local_addr,
            start_count = record.start_count,
            "REST service listening"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SubsystemError> {
        self.shutdown.trigger();
        if let Some(server) = self.server.take() {
            server
                .await
                .map_err(|e| SubsystemError::Task(e.to_string()))?;
            tracing::info!("REST server stopped");
        }
        Ok(())
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn version(State(state): State<AppState>) -> Json<VersionInfo> {
    Json(VersionInfo {
        name: state.name,
        version: state.version,
    })
}

async fn persisted_state(State(state): State<AppState>) -> Json<BTreeMap<String, Value>> {
    Json(state.store.snapshot())
}
