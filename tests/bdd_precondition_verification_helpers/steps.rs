//! Given/when step definitions for precondition-verification scenarios.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bollard::models::{
    ContainerCreateBody, ContainerCreateResponse, ContainerInspectResponse, ContainerState,
    ContainerStateStatusEnum,
};
use bollard::query_parameters::CreateContainerOptions;
use mockall::mock;
use precheck::api::verify_with_client;
use precheck::config::{AppConfig, WaitConfig, WaitStrategyKind};
use precheck::engine::{
    ContainerCreator, ContainerLifecycle, CreateContainerFuture, FetchLogsFuture,
    InspectContainerFuture, RemoveContainerFuture, StartContainerFuture, WaitContainerFuture,
};
use precheck::error::{ContainerError, PrecheckError};
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{VerificationState, VerifyOutcome};

mock! {
    #[derive(Debug)]
    Engine {}

    impl ContainerCreator for Engine {
        fn create_container<'a>(
            &'a self,
            options: Option<CreateContainerOptions>,
            config: ContainerCreateBody,
        ) -> CreateContainerFuture<'a>;
    }

    impl ContainerLifecycle for Engine {
        fn start_container(&self, container_id: &str) -> StartContainerFuture<'_>;
        fn inspect_container(&self, container_id: &str) -> InspectContainerFuture<'_>;
        fn fetch_logs(&self, container_id: &str) -> FetchLogsFuture<'_>;
        fn wait_container(&self, container_id: &str) -> WaitContainerFuture<'_>;
        fn remove_container(&self, container_id: &str, force: bool) -> RemoveContainerFuture<'_>;
    }
}

const DIAGNOSTICS: &[&str] = &[
    "✗ /opt/ldp-web/data not writable by node",
    "✗ /opt/ldp-web/.db not writable by node",
    "✗ /opt/ldp-web/config not writable by node",
    "✗ /missing/key does not exist",
    "✗ /missing/cert does not exist",
];

/// Build tty-style output from diagnostic lines and a finish word.
fn tty_output<'a>(lines: impl Iterator<Item = &'a str>, finished: &str) -> String {
    let mut text = String::from("Checking startup preconditions\r\n");
    for line in lines {
        text.push_str(line);
        text.push_str("\r\n");
    }
    text.push_str("Finished: ");
    text.push_str(finished);
    text.push_str("\r\n");
    text
}

#[given("the image reports every broken precondition")]
fn image_reports_every_precondition(verification_state: &VerificationState) {
    verification_state
        .logs
        .set(tty_output(DIAGNOSTICS.iter().copied(), "ERROR"));
}

#[given("the image reports a successful startup")]
fn image_reports_success(verification_state: &VerificationState) {
    verification_state.logs.set(tty_output(
        ["✓ /opt/ldp-web/data writable", "✓ TLS files present"].into_iter(),
        "SUCCESS",
    ));
}

#[given("the image omits the diagnostic for {path}")]
fn image_omits_diagnostic(verification_state: &VerificationState, path: String) {
    let kept = DIAGNOSTICS.iter().copied().filter(|line| !line.contains(&path));
    verification_state.logs.set(tty_output(kept, "ERROR"));
}

#[given("reading the container logs fails")]
fn reading_logs_fails(verification_state: &VerificationState) {
    verification_state.logs_fail.set(true);
}

#[given("the engine reports the container as {status}")]
fn engine_reports_status(verification_state: &VerificationState, status: String) -> StepResult<()> {
    let engine_status = match status.as_str() {
        "created" => ContainerStateStatusEnum::CREATED,
        "running" => ContainerStateStatusEnum::RUNNING,
        "exited" => ContainerStateStatusEnum::EXITED,
        other => return Err(format!("unsupported status in scenario: {other}")),
    };
    verification_state.engine_status.set(engine_status);
    Ok(())
}

#[given("the container exits once it is waited on")]
fn container_exits_once_waited_on(verification_state: &VerificationState) {
    verification_state.exits_on_wait.set(true);
}

#[given("the wait strategy is fixed")]
fn wait_strategy_is_fixed(verification_state: &VerificationState) {
    verification_state.strategy.set(WaitStrategyKind::Fixed);
}

#[when("verification runs")]
fn verification_runs(verification_state: &VerificationState) -> StepResult<()> {
    let removed = Arc::new(Mutex::new(false));
    let inspections = Arc::new(AtomicUsize::new(0));
    let engine = build_engine(verification_state, &removed, &inspections);
    let config = build_config(verification_state);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|_| String::from("failed to create tokio runtime for scenario"))?;
    let result = runtime.block_on(verify_with_client(&engine, &config));

    let force_removed = *removed
        .lock()
        .map_err(|_| String::from("removal flag mutex is poisoned"))?;
    verification_state.force_removed.set(force_removed);
    verification_state
        .inspections
        .set(inspections.load(Ordering::SeqCst));

    let outcome = match result {
        Ok(run) => VerifyOutcome::Completed(run.verdict),
        Err(error) => VerifyOutcome::Aborted {
            logs_failed: matches!(
                error,
                PrecheckError::Container(ContainerError::LogsFailed { .. })
            ),
            message: error.to_string(),
        },
    };
    verification_state.outcome.set(outcome);
    Ok(())
}

fn build_config(verification_state: &VerificationState) -> AppConfig {
    let strategy = verification_state
        .strategy
        .get()
        .unwrap_or(WaitStrategyKind::Poll);
    AppConfig {
        image: Some(String::from("registry.example/ldp-web:bdd")),
        wait: WaitConfig {
            strategy,
            settle_delay_ms: 10,
            timeout_ms: 200,
            poll_interval_ms: 5,
        },
        ..AppConfig::default()
    }
}

fn build_engine(
    verification_state: &VerificationState,
    removed: &Arc<Mutex<bool>>,
    inspections: &Arc<AtomicUsize>,
) -> MockEngine {
    let logs = verification_state.logs.get().unwrap_or_default();
    let logs_fail = verification_state.logs_fail.get().unwrap_or(false);
    let status = verification_state
        .engine_status
        .get()
        .unwrap_or(ContainerStateStatusEnum::CREATED);
    let exits_on_wait = verification_state.exits_on_wait.get().unwrap_or(false);
    let exited = Arc::new(AtomicBool::new(false));

    let mut engine = MockEngine::new();
    engine.expect_create_container().returning(|_, _| {
        Box::pin(async {
            Ok(ContainerCreateResponse {
                id: String::from("bdd-verify-id"),
                warnings: vec![],
            })
        })
    });
    engine
        .expect_start_container()
        .returning(|_| Box::pin(async { Ok(()) }));
    engine.expect_fetch_logs().returning(move |_| {
        let text = logs.clone();
        Box::pin(async move {
            if logs_fail {
                Err(bollard::errors::Error::RequestTimeoutError)
            } else {
                Ok(text)
            }
        })
    });
    let exited_on_wait = Arc::clone(&exited);
    engine.expect_wait_container().returning(move |_| {
        if exits_on_wait {
            exited_on_wait.store(true, Ordering::SeqCst);
        }
        Box::pin(async { Ok(Some(1)) })
    });
    let inspect_count = Arc::clone(inspections);
    engine.expect_inspect_container().returning(move |_| {
        inspect_count.fetch_add(1, Ordering::SeqCst);
        let reported = if exited.load(Ordering::SeqCst) {
            ContainerStateStatusEnum::EXITED
        } else {
            status.clone()
        };
        let response = ContainerInspectResponse {
            state: Some(ContainerState {
                status: Some(reported),
                exit_code: Some(1),
                ..ContainerState::default()
            }),
            ..ContainerInspectResponse::default()
        };
        Box::pin(async move { Ok(response) })
    });
    let removed_flag = Arc::clone(removed);
    engine.expect_remove_container().returning(move |_, force| {
        if let Ok(mut locked) = removed_flag.lock() {
            *locked = force;
        }
        Box::pin(async { Ok(()) })
    });

    engine
}
