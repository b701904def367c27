//! Startup sequencing.
//!
//! # Responsibilities
//! - Start subsystems one at a time in the fixed order
//! - On a start failure, stop exactly the subsystems already started
//!
//! # Design Decisions
//! - Fail fast: any start error is fatal
//! - Subsystems start in order, not concurrently
//! - Absent handles are skipped

use crate::lifecycle::outcome::LifecycleError;
use crate::subsystem::SubsystemHandle;

/// Start every handle in order, rolling back on the first failure.
pub async fn start_all(handles: &mut [SubsystemHandle]) -> Result<(), LifecycleError> {
    for index in 0..handles.len() {
        let handle = &mut handles[index];
        match handle.start().await {
            Ok(true) => tracing::info!(subsystem = %handle.name(), "Subsystem started"),
            Ok(false) => tracing::warn!(
                subsystem = %handle.name(),
                "Subsystem was not constructed, skipping start"
            ),
            Err(source) => {
                let subsystem = handle.name().to_string();
                tracing::error!(subsystem = %subsystem, error = %source, "Subsystem failed to start");
                roll_back(&mut handles[..index]).await;
                return Err(LifecycleError::Start { subsystem, source });
            }
        }
    }
    Ok(())
}

async fn roll_back(started: &mut [SubsystemHandle]) {
    for handle in started.iter_mut().filter(|h| h.is_started()) {
        match handle.stop().await {
            Ok(_) => tracing::info!(subsystem = %handle.name(), "Rolled back started subsystem"),
            Err(e) => tracing::warn!(
                subsystem = %handle.name(),
                error = %e,
                "Rollback stop failed"
            ),
        }
    }
}
