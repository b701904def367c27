//! Possibly-absent subsystem handle.

use crate::config::options::OptionValue;
use crate::subsystem::{Subsystem, SubsystemConfig, SubsystemError, SubsystemKind};

/// A constructed subsystem, or the empty slot left by a failed construction.
pub struct SubsystemHandle {
    kind: SubsystemKind,
    config: SubsystemConfig,
    inner: Option<Box<dyn Subsystem>>,
    started: bool,
    stopped: bool,
}

impl SubsystemHandle {
    pub fn new(
        kind: SubsystemKind,
        config: SubsystemConfig,
        inner: Option<Box<dyn Subsystem>>,
    ) -> Self {
        Self {
            kind,
            config,
            inner,
            started: false,
            stopped: false,
        }
    }

    pub fn kind(&self) -> SubsystemKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn is_present(&self) -> bool {
        self.inner.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn config(&self) -> &SubsystemConfig {
        &self.config
    }

    /// Set an option on the subsystem; no-op when absent.
    pub fn configure(&mut self, option: &str, value: &OptionValue) {
        if let Some(inner) = self.inner.as_mut() {
            tracing::debug!(subsystem = %self.config.name, option, value = %value, "Setting option");
            inner.configure(option, value);
        }
    }

    /// Start the subsystem. Returns `Ok(false)` when absent.
    pub async fn start(&mut self) -> Result<bool, SubsystemError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(false);
        };
        if self.started {
            return Err(SubsystemError::AlreadyStarted);
        }
        inner.start(&self.config).await?;
        self.started = true;
        Ok(true)
    }

    /// Stop the subsystem once. Returns `Ok(false)` when absent or already stopped.
    pub async fn stop(&mut self) -> Result<bool, SubsystemError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(false);
        };
        if self.stopped {
            return Ok(false);
        }
        self.stopped = true;
        self.started = false;
        inner.stop().await?;
        Ok(true)
    }
}

impl std::fmt::Debug for SubsystemHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsystemHandle")
            .field("kind", &self.kind)
            .field("name", &self.config.name)
            .field("present", &self.inner.is_some())
            .field("started", &self.started)
            .field("stopped", &self.stopped)
            .finish()
    }
}
