//! Supervisor states, shutdown causes and the terminal outcome.

use std::fmt;
use std::io;
use std::process::ExitCode;

use thiserror::Error;

use crate::config::options::ParseError;
use crate::lifecycle::signals::TerminationSignal;
use crate::store::StoreError;
use crate::subsystem::SubsystemError;

/// Supervisor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Init,
    Configuring,
    Starting,
    Running,
    Stopping,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Init => "init",
            LifecycleState::Configuring => "configuring",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Fatal errors that end the lifecycle before `Running`.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("argument error: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to create store for {subsystem}: {source}")]
    Store {
        subsystem: String,
        source: StoreError,
    },

    #[error("failed to start {subsystem}: {source}")]
    Start {
        subsystem: String,
        source: SubsystemError,
    },

    #[error("failed to register signal handlers: {0}")]
    Signals(io::Error),
}

/// What ended the `Running` state.
#[derive(Debug)]
pub enum ShutdownCause {
    Signal(TerminationSignal),
    RuntimeError {
        subsystem: String,
        error: SubsystemError,
    },
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownCause::Signal(signal) => write!(f, "received OS signal <{}>", signal),
            ShutdownCause::RuntimeError { subsystem, error } => {
                write!(f, "{} reported unhandled error: {}", subsystem, error)
            }
        }
    }
}

/// Terminal result of a supervisor run.
#[derive(Debug)]
pub enum Outcome {
    /// The version flag was given; nothing was constructed.
    Version,
    /// Help was requested; carries the rendered text.
    Help(String),
    /// Subsystems ran and were stopped.
    Stopped(ShutdownCause),
    /// A fatal error ended the run before `Running`.
    Failed(LifecycleError),
}

impl Outcome {
    /// Signal-driven shutdowns, version and help are successes; everything
    /// else is a failure.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Version | Outcome::Help(_) | Outcome::Stopped(ShutdownCause::Signal(_))
        )
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_classification() {
        assert!(Outcome::Version.is_success());
        assert!(Outcome::Stopped(ShutdownCause::Signal(TerminationSignal::Interrupt)).is_success());
        assert!(!Outcome::Stopped(ShutdownCause::RuntimeError {
            subsystem: "netplane".into(),
            error: SubsystemError::Runtime("listener closed".into()),
        })
        .is_success());
        assert!(!Outcome::Failed(LifecycleError::Parse(ParseError::InvalidInteger {
            option: "ipam-query-interval".into(),
            value: "x".into(),
        }))
        .is_success());
    }

    #[test]
    fn test_cause_display() {
        let cause = ShutdownCause::Signal(TerminationSignal::Terminate);
        assert_eq!(cause.to_string(), "received OS signal <SIGTERM>");
    }
}
