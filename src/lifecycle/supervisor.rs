//! Lifecycle supervisor.
//!
//! # State Machine
//! ```text
//! Init → Configuring → Starting → Running → Stopping → Terminated
//!   │          │            │
//!   │ version  │ store err  │ start err (started subsystems rolled back)
//!   └──────────┴────────────┴──────────────────────────────→ Terminated
//! ```
//!
//! `Init` is [`initialize`]: it resolves the arguments and short-circuits on
//! help, version or a parse failure before anything is built. The remaining
//! states belong to [`LifecycleSupervisor::run`].
//!
//! `Running` ends on the first of an OS termination signal or a runtime error
//! reported by any subsystem.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;

use crate::config::options::{ArgumentResolver, ParseError, ResolvedOptions, OPT_VERSION};
use crate::config::schema::DaemonConfig;
use crate::lifecycle::fan_in::ErrorFanIn;
use crate::lifecycle::outcome::{LifecycleError, LifecycleState, Outcome, ShutdownCause};
use crate::lifecycle::signals::TerminationSignal;
use crate::lifecycle::{shutdown, startup};
use crate::store::StoreFactory;
use crate::subsystem::{SubsystemBuilder, SubsystemConfig, SubsystemHandle, SubsystemKind};

/// Values the supervisor stamps into every subsystem config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub version: String,
    /// Directory holding the subsystem store files.
    pub runtime_path: PathBuf,
}

impl SupervisorSettings {
    pub fn new(version: impl Into<String>, config: &DaemonConfig) -> Self {
        Self {
            version: version.into(),
            runtime_path: config.runtime_path.clone(),
        }
    }
}

/// Result of the `Init` state.
#[derive(Debug)]
pub enum Initialized {
    /// Continue into `Configuring` with these options.
    Proceed(ResolvedOptions),
    /// Terminate without building anything.
    Exit(Outcome),
}

/// Resolve process arguments. Help, version and parse failures end the
/// lifecycle here, so no store or subsystem exists yet.
pub fn initialize<I, T>(resolver: &ArgumentResolver, args: I) -> Initialized
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let options = match resolver.resolve(args) {
        Ok(options) => options,
        Err(ParseError::Help(text)) => return Initialized::Exit(Outcome::Help(text)),
        Err(e) => return Initialized::Exit(Outcome::Failed(e.into())),
    };
    if options.flag(OPT_VERSION) {
        return Initialized::Exit(Outcome::Version);
    }
    Initialized::Proceed(options)
}

/// Orchestrates construction, startup and shutdown of the subsystems.
pub struct LifecycleSupervisor<F, B> {
    settings: SupervisorSettings,
    stores: F,
    builder: B,
    state: LifecycleState,
}

impl<F, B> LifecycleSupervisor<F, B>
where
    F: StoreFactory,
    B: SubsystemBuilder,
{
    pub fn new(settings: SupervisorSettings, stores: F, builder: B) -> Self {
        Self {
            settings,
            stores,
            builder,
            state: LifecycleState::Init,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run the lifecycle from already-resolved options.
    pub async fn run<S>(&mut self, options: &ResolvedOptions, signal: S) -> Outcome
    where
        S: Future<Output = TerminationSignal>,
    {
        self.transition(LifecycleState::Configuring);

        let mut fan_in = ErrorFanIn::new(SubsystemKind::ORDER.len());
        let mut handles = match self.construct(&mut fan_in) {
            Ok(handles) => handles,
            Err(e) => return self.terminate(Outcome::Failed(e)),
        };

        for handle in handles.iter_mut() {
            for option in handle.kind().options() {
                if let Some(value) = options.get(option) {
                    handle.configure(option, value);
                }
            }
        }

        self.transition(LifecycleState::Starting);
        if let Err(e) = startup::start_all(&mut handles).await {
            return self.terminate(Outcome::Failed(e));
        }

        self.transition(LifecycleState::Running);
        let cause = tokio::select! {
            signal = signal => ShutdownCause::Signal(signal),
            Some(failure) = fan_in.recv() => ShutdownCause::RuntimeError {
                subsystem: failure.subsystem,
                error: failure.error,
            },
        };
        tracing::info!(cause = %cause, "Shutting down");

        self.transition(LifecycleState::Stopping);
        shutdown::stop_all(&mut handles).await;
        fan_in.close();

        self.terminate(Outcome::Stopped(cause))
    }

    /// Open each subsystem's store and construct it. A store failure is
    /// fatal; a construction failure leaves an absent handle.
    fn construct(&self, fan_in: &mut ErrorFanIn) -> Result<Vec<SubsystemHandle>, LifecycleError> {
        let mut handles = Vec::with_capacity(SubsystemKind::ORDER.len());

        for kind in SubsystemKind::ORDER {
            let name = kind.name();
            let store = self
                .stores
                .open(&self.settings.runtime_path, name)
                .map_err(|source| {
                    tracing::error!(subsystem = name, error = %source, "Failed to create store");
                    LifecycleError::Store {
                        subsystem: name.to_string(),
                        source,
                    }
                })?;

            let config = SubsystemConfig {
                version: self.settings.version.clone(),
                name: name.to_string(),
                errors: fan_in.reporter(name),
                store,
            };

            let subsystem = match self.builder.build(kind, &config) {
                Ok(subsystem) => Some(subsystem),
                Err(e) => {
                    tracing::error!(subsystem = name, error = %e, "Failed to construct {}", kind);
                    None
                }
            };
            handles.push(SubsystemHandle::new(kind, config, subsystem));
        }

        Ok(handles)
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
    }

    fn terminate(&mut self, outcome: Outcome) -> Outcome {
        self.transition(LifecycleState::Terminated);
        match &outcome {
            Outcome::Failed(e) => tracing::error!(error = %e, "Terminated after fatal error"),
            Outcome::Stopped(ShutdownCause::RuntimeError { .. }) => {
                tracing::warn!("Terminated after runtime error")
            }
            _ => tracing::info!("Terminated"),
        }
        outcome
    }
}
