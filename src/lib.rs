//! Host networking daemon supervisor.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ config::options ──▶ ResolvedOptions ──┬──▶ observability::logging
//!   --config ──▶ config::loader ──▶ DaemonConfig ──┤
//!                                                  ▼
//!                                  ┌───────────────────────────────┐
//!                                  │   lifecycle::supervisor       │
//!                                  │                               │
//!                                  │  store::factory ─▶ Store ×3   │
//!                                  │  subsystem::builder           │
//!                                  │    ├─ service  (REST, axum)   │
//!                                  │    ├─ network  plugin         │
//!                                  │    └─ ipam     plugin         │
//!                                  │                               │
//!                                  │  signals ─┐                   │
//!                                  │  fan_in  ─┴─▶ shutdown        │
//!                                  └───────────────────────────────┘
//! ```

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod store;
pub mod subsystem;

pub use config::{ArgumentResolver, DaemonConfig, ResolvedOptions};
pub use lifecycle::{LifecycleSupervisor, Outcome, SupervisorSettings};
pub use store::{JsonStoreFactory, StoreFactory};
pub use subsystem::{DaemonSubsystems, Subsystem, SubsystemBuilder};

/// Build version, overridable at compile time through `NETPLANE_VERSION`.
pub fn version() -> &'static str {
    option_env!("NETPLANE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
