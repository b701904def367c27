//! netplaned: host networking daemon.

use std::path::Path;
use std::process::ExitCode;

use netplane::config::options::{ResolvedOptions, DEFAULT_CONFIG_PATH, OPT_CONFIG};
use netplane::config::{load_or_default, ArgumentResolver, DaemonConfig};
use netplane::lifecycle::{
    initialize, Initialized, LifecycleError, LifecycleSupervisor, Outcome, SignalWatcher,
    SupervisorSettings,
};
use netplane::observability::logging::{self, LogSettings};
use netplane::store::JsonStoreFactory;
use netplane::subsystem::{DaemonSubsystems, SERVICE_NAME};

const PROGRAM: &str = "netplaned";

fn print_version() {
    println!("Netplane Host Networking Service");
    println!("Version {}", netplane::version());
}

#[tokio::main]
async fn main() -> ExitCode {
    let resolver = match ArgumentResolver::daemon(PROGRAM) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Invalid option table: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = match initialize(&resolver, std::env::args_os()) {
        Initialized::Proceed(options) => options,
        Initialized::Exit(outcome) => {
            match &outcome {
                Outcome::Help(text) => print!("{}", text),
                Outcome::Version => print_version(),
                Outcome::Failed(e) => eprintln!("{}", e),
                Outcome::Stopped(_) => {}
            }
            return outcome.exit_code();
        }
    };

    let config_path = options.str(OPT_CONFIG).unwrap_or(DEFAULT_CONFIG_PATH);
    let config = match load_or_default(Path::new(config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };

    let log = match LogSettings::from_options(SERVICE_NAME, &options, &config.logging) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Failed to configure logging: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&log) {
        eprintln!("Failed to configure logging: {}", e);
        return ExitCode::FAILURE;
    }

    run(&options, config, &log).await.exit_code()
}

async fn run(
    options: &ResolvedOptions,
    config: DaemonConfig,
    log: &LogSettings,
) -> Outcome {
    tracing::info!(
        version = netplane::version(),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        log_level = log.level.literal(),
        log_target = log.target.literal(),
        runtime_path = %config.runtime_path.display(),
        "netplane starting"
    );

    let outcome = match SignalWatcher::register() {
        Ok(signals) => {
            let mut supervisor = LifecycleSupervisor::new(
                SupervisorSettings::new(netplane::version(), &config),
                JsonStoreFactory,
                DaemonSubsystems::new(config),
            );
            supervisor.run(options, signals.recv()).await
        }
        Err(e) => Outcome::Failed(LifecycleError::Signals(e)),
    };

    match &outcome {
        Outcome::Failed(e) => tracing::error!(error = %e, "netplane exiting with failure"),
        Outcome::Stopped(cause) => tracing::info!(cause = %cause, "Shutdown complete"),
        _ => {}
    }
    outcome
}
