//! Supervisor lifecycle tests driven through spy subsystems.

use std::future::pending;
use std::sync::atomic::Ordering;

use netplane::lifecycle::{
    LifecycleError, LifecycleState, Outcome, ShutdownCause, TerminationSignal,
};
use netplane::subsystem::SubsystemKind;

mod common;

use common::{events_with, Behavior, CountingStoreFactory, SpyBuilder};

const ARGS: [&str; 5] = ["netplaned", "-u", "https://10.0.0.1:6443", "-i", "15"];

fn stops() -> Vec<String> {
    vec![
        "stop netplane".to_string(),
        "stop netplane-net".to_string(),
        "stop netplane-ipam".to_string(),
    ]
}

#[tokio::test]
async fn test_version_flag_constructs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let stores = CountingStoreFactory::new();
    let calls = stores.calls();
    let builder = SpyBuilder::new();
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), stores, builder);
    let outcome = common::launch(
        &mut supervisor,
        &["netplaned", "--version"],
        pending::<TerminationSignal>(),
    )
    .await;

    assert!(matches!(outcome, Outcome::Version));
    assert!(outcome.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(supervisor.state(), LifecycleState::Init);
}

#[tokio::test]
async fn test_parse_error_is_failure() {
    let dir = tempfile::tempdir().unwrap();
    let stores = CountingStoreFactory::new();
    let calls = stores.calls();

    let mut supervisor = common::supervisor(dir.path(), stores, SpyBuilder::new());
    let outcome = common::launch(
        &mut supervisor,
        &["netplaned", "--log-target", "console"],
        pending::<TerminationSignal>(),
    )
    .await;

    assert!(matches!(outcome, Outcome::Failed(LifecycleError::Parse(_))));
    assert!(!outcome.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_main_store_failure_starts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new();
    let events = builder.events();

    let mut supervisor = common::supervisor(
        dir.path(),
        CountingStoreFactory::failing_for("netplane"),
        builder,
    );
    let outcome = common::launch(&mut supervisor, &ARGS, pending::<TerminationSignal>()).await;

    match outcome {
        Outcome::Failed(LifecycleError::Store { subsystem, .. }) => assert_eq!(subsystem, "netplane"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(events_with(&events, "start").is_empty());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_later_store_failure_not_masked() {
    let dir = tempfile::tempdir().unwrap();
    let stores = CountingStoreFactory::failing_for("netplane-ipam");
    let calls = stores.calls();
    let builder = SpyBuilder::new();
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), stores, builder);
    let outcome = common::launch(&mut supervisor, &ARGS, pending::<TerminationSignal>()).await;

    assert!(matches!(outcome, Outcome::Failed(LifecycleError::Store { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(events_with(&events, "start").is_empty());
}

#[tokio::test]
async fn test_main_start_failure_is_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new().with(
        SubsystemKind::Service,
        Behavior {
            fail_start: true,
            ..Behavior::default()
        },
    );
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    let outcome = common::launch(&mut supervisor, &ARGS, pending::<TerminationSignal>()).await;

    match outcome {
        Outcome::Failed(LifecycleError::Start { subsystem, .. }) => assert_eq!(subsystem, "netplane"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(events_with(&events, "start"), vec!["start netplane"]);
    assert!(events_with(&events, "stop").is_empty());
}

#[tokio::test]
async fn test_partial_start_rolls_back_started_subsystems() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new().with(
        SubsystemKind::IpamPlugin,
        Behavior {
            fail_start: true,
            ..Behavior::default()
        },
    );
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    let outcome = common::launch(&mut supervisor, &ARGS, pending::<TerminationSignal>()).await;

    assert!(matches!(outcome, Outcome::Failed(LifecycleError::Start { .. })));
    assert_eq!(
        events_with(&events, "stop"),
        vec!["stop netplane", "stop netplane-net"]
    );
}

#[tokio::test]
async fn test_main_service_error_stops_all_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new().with(
        SubsystemKind::Service,
        Behavior {
            report_after_start: Some("listener closed".into()),
            ..Behavior::default()
        },
    );
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    let outcome = common::launch(&mut supervisor, &ARGS, pending::<TerminationSignal>()).await;

    match &outcome {
        Outcome::Stopped(ShutdownCause::RuntimeError { subsystem, error }) => {
            assert_eq!(subsystem, "netplane");
            assert_eq!(error.to_string(), "listener closed");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!outcome.is_success());
    assert_eq!(events_with(&events, "stop"), stops());
    assert_eq!(supervisor.state(), LifecycleState::Terminated);
}

#[tokio::test]
async fn test_plugin_error_also_triggers_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new().with(
        SubsystemKind::IpamPlugin,
        Behavior {
            report_after_start: Some("address source unreachable".into()),
            ..Behavior::default()
        },
    );
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    let outcome = common::launch(&mut supervisor, &ARGS, pending::<TerminationSignal>()).await;

    match outcome {
        Outcome::Stopped(ShutdownCause::RuntimeError { subsystem, .. }) => {
            assert_eq!(subsystem, "netplane-ipam")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(events_with(&events, "stop"), stops());
}

#[tokio::test]
async fn test_signal_stops_all_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new();
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    let outcome = common::launch(
        &mut supervisor,
        &ARGS,
        async { TerminationSignal::Terminate },
    )
    .await;

    assert!(matches!(
        outcome,
        Outcome::Stopped(ShutdownCause::Signal(TerminationSignal::Terminate))
    ));
    assert!(outcome.is_success());
    assert_eq!(events_with(&events, "stop"), stops());
}

#[tokio::test]
async fn test_absent_handle_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new().with(
        SubsystemKind::NetworkPlugin,
        Behavior {
            fail_build: true,
            ..Behavior::default()
        },
    );
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    let outcome = common::launch(
        &mut supervisor,
        &ARGS,
        async { TerminationSignal::Interrupt },
    )
    .await;

    assert!(outcome.is_success());
    assert!(events_with(&events, "configure netplane-net").is_empty());
    assert_eq!(
        events_with(&events, "start"),
        vec!["start netplane", "start netplane-ipam"]
    );
    assert_eq!(
        events_with(&events, "stop"),
        vec!["stop netplane", "stop netplane-ipam"]
    );
}

#[tokio::test]
async fn test_stop_failure_does_not_block_later_stops() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new().with(
        SubsystemKind::Service,
        Behavior {
            fail_stop: true,
            ..Behavior::default()
        },
    );
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    common::launch(&mut supervisor, &ARGS, async { TerminationSignal::Terminate }).await;

    assert_eq!(events_with(&events, "stop"), stops());
}

#[tokio::test]
async fn test_options_propagated_per_subsystem() {
    let dir = tempfile::tempdir().unwrap();
    let builder = SpyBuilder::new();
    let events = builder.events();

    let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
    common::launch(&mut supervisor, &ARGS, async { TerminationSignal::Terminate }).await;

    assert_eq!(
        events_with(&events, "configure"),
        vec![
            "configure netplane api-server-url=\"https://10.0.0.1:6443\"",
            "configure netplane-net api-server-url=\"https://10.0.0.1:6443\"",
            "configure netplane-ipam environment=\"public\"",
            "configure netplane-ipam api-server-url=\"https://10.0.0.1:6443\"",
            "configure netplane-ipam ipam-query-interval=15",
        ]
    );
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let mut runs = Vec::new();

    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let builder = SpyBuilder::new();
        let events = builder.events();

        let mut supervisor = common::supervisor(dir.path(), CountingStoreFactory::new(), builder);
        common::launch(&mut supervisor, &ARGS, async { TerminationSignal::Terminate }).await;

        let recorded = events.lock().unwrap().clone();
        runs.push(recorded);
    }

    assert_eq!(runs[0], runs[1]);
    let starts: Vec<_> = runs[0].iter().filter(|e| e.starts_with("start")).collect();
    assert_eq!(
        starts,
        vec!["start netplane", "start netplane-net", "start netplane-ipam"]
    );
}
