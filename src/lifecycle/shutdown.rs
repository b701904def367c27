//! Shutdown coordination.
//!
//! # Responsibilities
//! - Signal subsystem workers to exit (`Shutdown` / `ShutdownListener`)
//! - Stop every subsystem handle in order, best effort (`stop_all`)

use tokio::sync::watch;

use crate::subsystem::SubsystemHandle;

/// Coordinator for stopping a subsystem's background tasks.
///
/// Backed by a watch channel so listeners subscribed after the trigger still
/// observe it.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Get the number of active listeners (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a `Shutdown`.
#[derive(Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Wait until shutdown is triggered or the coordinator is dropped.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

/// Stop every handle in order. Absent handles are skipped and a failing stop
/// never prevents the following ones.
pub async fn stop_all(handles: &mut [SubsystemHandle]) {
    for handle in handles.iter_mut() {
        match handle.stop().await {
            Ok(true) => tracing::info!(subsystem = %handle.name(), "Subsystem stopped"),
            Ok(false) => {
                tracing::debug!(subsystem = %handle.name(), "Nothing to stop, skipping")
            }
            Err(e) => tracing::warn!(
                subsystem = %handle.name(),
                error = %e,
                "Subsystem failed to stop cleanly"
            ),
        }
    }
}
