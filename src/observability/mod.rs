//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! --log-level / --log-target + [logging] file section
//!     → LogSettings (explicit value, built once)
//!     → logging::init (installs the tracing subscriber)
//!
//! All subsystems produce:
//!     → tracing events with structured fields (subsystem, state, error)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - One subscriber per process, installed by the binary before any subsystem exists

pub mod logging;

pub use logging::{LogError, LogLevel, LogSettings, LogTarget};
