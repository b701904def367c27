//! Persistent per-subsystem state.
//!
//! # Data Flow
//! ```text
//! LifecycleSupervisor
//!     → factory.rs (StoreFactory::open(runtime_path, subsystem))
//!     → json_file.rs (load <runtime_path>/<subsystem>.json, create if absent)
//!     → Store handed to exactly one subsystem
//! ```
//!
//! # Design Decisions
//! - One file per subsystem; stores are never shared
//! - Whole-file rewrite through a temp file and rename on every write
//! - Re-opening an existing file loads it, never truncates

pub mod factory;
pub mod json_file;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use factory::{store_path, JsonStoreFactory, StoreFactory};
pub use json_file::JsonFileStore;

/// Shared handle to a subsystem's store.
pub type Store = Arc<JsonFileStore>;

/// Errors raised by the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("store file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },

    #[error("failed to decode value for key '{key}': {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
