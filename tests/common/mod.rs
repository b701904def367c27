//! Shared spies for lifecycle integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use netplane::config::options::OptionValue;
use netplane::config::ArgumentResolver;
use netplane::lifecycle::{
    initialize, Initialized, LifecycleSupervisor, Outcome, SupervisorSettings, TerminationSignal,
};
use netplane::store::{JsonStoreFactory, Store, StoreError, StoreFactory};
use netplane::subsystem::{
    Subsystem, SubsystemBuilder, SubsystemConfig, SubsystemError, SubsystemKind,
};

/// Ordered log of lifecycle calls, e.g. `"start netplane-net"`.
pub type Events = Arc<Mutex<Vec<String>>>;

/// How a spy subsystem misbehaves.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub fail_build: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    /// Report this runtime error right after a successful start.
    pub report_after_start: Option<String>,
}

/// Builds `SpySubsystem`s that record every call into a shared event log.
#[derive(Default)]
pub struct SpyBuilder {
    events: Events,
    behaviors: HashMap<SubsystemKind, Behavior>,
}

impl SpyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: SubsystemKind, behavior: Behavior) -> Self {
        self.behaviors.insert(kind, behavior);
        self
    }

    pub fn events(&self) -> Events {
        self.events.clone()
    }
}

impl SubsystemBuilder for SpyBuilder {
    fn build(
        &self,
        kind: SubsystemKind,
        config: &SubsystemConfig,
    ) -> Result<Box<dyn Subsystem>, SubsystemError> {
        let behavior = self.behaviors.get(&kind).cloned().unwrap_or_default();
        record(&self.events, format!("build {}", config.name));
        if behavior.fail_build {
            return Err(SubsystemError::Runtime(format!("cannot build {}", kind)));
        }
        Ok(Box::new(SpySubsystem {
            name: config.name.clone(),
            events: self.events.clone(),
            behavior,
        }))
    }
}

struct SpySubsystem {
    name: String,
    events: Events,
    behavior: Behavior,
}

#[async_trait]
impl Subsystem for SpySubsystem {
    fn configure(&mut self, option: &str, value: &OptionValue) {
        record(&self.events, format!("configure {} {}={}", self.name, option, value));
    }

    async fn start(&mut self, config: &SubsystemConfig) -> Result<(), SubsystemError> {
        record(&self.events, format!("start {}", self.name));
        if self.behavior.fail_start {
            return Err(SubsystemError::Runtime(format!("{} refused to start", self.name)));
        }
        if let Some(message) = &self.behavior.report_after_start {
            config.errors.report(SubsystemError::Runtime(message.clone()));
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SubsystemError> {
        record(&self.events, format!("stop {}", self.name));
        if self.behavior.fail_stop {
            return Err(SubsystemError::Runtime(format!("{} failed to stop", self.name)));
        }
        Ok(())
    }
}

fn record(events: &Events, event: String) {
    events.lock().unwrap().push(event);
}

/// Store factory that counts calls and can fail for one subsystem.
#[derive(Default)]
pub struct CountingStoreFactory {
    calls: Arc<AtomicUsize>,
    fail_for: Option<String>,
}

impl CountingStoreFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(subsystem: &str) -> Self {
        Self {
            calls: Arc::default(),
            fail_for: Some(subsystem.to_string()),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl StoreFactory for CountingStoreFactory {
    fn open(&self, runtime_path: &Path, subsystem: &str) -> Result<Store, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.as_deref() == Some(subsystem) {
            return Err(StoreError::Io {
                path: runtime_path.join(subsystem),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        JsonStoreFactory.open(runtime_path, subsystem)
    }
}

pub fn supervisor<F, B>(runtime_path: &Path, stores: F, builder: B) -> LifecycleSupervisor<F, B>
where
    F: StoreFactory,
    B: SubsystemBuilder,
{
    LifecycleSupervisor::new(
        SupervisorSettings {
            version: "1.2.3".to_string(),
            runtime_path: runtime_path.to_path_buf(),
        },
        stores,
        builder,
    )
}

/// Drive `Init` then the supervisor, the way the binary does.
pub async fn launch<F, B, S>(
    supervisor: &mut LifecycleSupervisor<F, B>,
    args: &[&str],
    signal: S,
) -> Outcome
where
    F: StoreFactory,
    B: SubsystemBuilder,
    S: Future<Output = TerminationSignal>,
{
    let resolver = ArgumentResolver::daemon("netplaned").unwrap();
    match initialize(&resolver, args.iter().copied()) {
        Initialized::Proceed(options) => supervisor.run(&options, signal).await,
        Initialized::Exit(outcome) => outcome,
    }
}

/// Events recorded so far, filtered to those starting with `prefix`.
pub fn events_with(events: &Events, prefix: &str) -> Vec<String> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}
