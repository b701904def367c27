//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor (supervisor.rs):
//!     initialize: Resolve options (help/version/parse error end here)
//!     run: Open stores → Construct subsystems → Propagate options
//!
//! Startup (startup.rs):
//!     Start main service → network plugin → IPAM plugin (roll back on failure)
//!
//! Convergence:
//!     signals.rs (SIGINT/SIGTERM/SIGQUIT) ─┐
//!     fan_in.rs (any subsystem error)     ─┴→ first event wins
//!
//! Shutdown (shutdown.rs):
//!     Stop main service → network plugin → IPAM plugin (best effort)
//! ```
//!
//! # Design Decisions
//! - Ordered startup and ordered shutdown, both sequential
//! - No grace timeout on stop; subsystems are expected to return promptly
//! - Every terminal path yields an `Outcome` carrying the exit classification

pub mod fan_in;
pub mod outcome;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use outcome::{LifecycleError, LifecycleState, Outcome, ShutdownCause};
pub use shutdown::Shutdown;
pub use signals::{SignalWatcher, TerminationSignal};
pub use supervisor::{initialize, Initialized, LifecycleSupervisor, SupervisorSettings};
