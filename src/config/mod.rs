//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process arguments
//!     → options.rs (OptionSpec table → ResolvedOptions)
//!
//! config file (TOML), path from --config
//!     → loader.rs (parse & deserialize, missing file → defaults)
//!     → validation.rs (semantic checks)
//!     → DaemonConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Operator-facing knobs live on the command line; deployment layout lives in the file
//! - All file fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod options;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use options::{ArgumentResolver, OptionKind, OptionSpec, OptionValue, ParseError, ResolvedOptions};
pub use schema::{DaemonConfig, IpamConfig, LoggingConfig, ServiceConfig};
