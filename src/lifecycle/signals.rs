//! OS signal handling.
//!
//! # Responsibilities
//! - Register termination signal handlers (SIGINT, SIGTERM, SIGQUIT)
//! - Yield the first signal received as a `TerminationSignal`
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered before any subsystem starts
//! - SIGKILL cannot be intercepted; SIGQUIT is watched in its place
//! - Non-unix targets watch Ctrl-C only

use std::fmt;
use std::io;

/// A termination signal delivered to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
    Quit,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

/// Registered termination signal streams.
#[cfg(unix)]
pub struct SignalWatcher {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalWatcher {
    /// Install the handlers. Must be called from within a Tokio runtime.
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Wait for the first termination signal.
    pub async fn recv(mut self) -> TerminationSignal {
        tokio::select! {
            _ = self.interrupt.recv() => TerminationSignal::Interrupt,
            _ = self.terminate.recv() => TerminationSignal::Terminate,
            _ = self.quit.recv() => TerminationSignal::Quit,
        }
    }
}

#[cfg(not(unix))]
pub struct SignalWatcher;

#[cfg(not(unix))]
impl SignalWatcher {
    pub fn register() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(self) -> TerminationSignal {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        TerminationSignal::Interrupt
    }
}
