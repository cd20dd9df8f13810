//! Live verification against a container engine.

use crate::config::AppConfig;
use crate::engine::{
    ContainerCreator, ContainerLifecycle, EngineConnector, ScopedContainer, SocketResolver,
    WaitOutcome, WaitStrategy,
};
use crate::error::Result as PrecheckResult;
use crate::report::{Verdict, evaluate_snapshot};
use crate::scenario::BrokenScenario;

/// Parameters for [`verify`].
pub struct VerifyParams<'a, E: mockable::Env> {
    /// Application configuration.
    pub config: &'a AppConfig,
    /// Tokio runtime handle for blocking execution.
    pub runtime_handle: &'a tokio::runtime::Handle,
    /// Environment variable provider for socket resolution.
    pub env: &'a E,
}

/// Everything one verification observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRun {
    /// Id of the (now removed) container.
    pub container_id: String,
    /// What the wait saw.
    pub wait: WaitOutcome,
    /// The judgement.
    pub verdict: Verdict,
}

/// Connect to the engine, check it answers, and run the broken scenario.
///
/// # Errors
///
/// Returns `PrecheckError` variants:
/// - `ConfigError::MissingRequired` / `InvalidValue` for unusable configuration.
/// - `ContainerError::ConnectionFailed` / `SocketNotFound` /
///   `PermissionDenied` / `HealthCheckFailed` / `HealthCheckTimeout` when
///   the engine is unreachable.
/// - Any error from [`verify_with_client`].
pub fn verify<E: mockable::Env>(params: VerifyParams<'_, E>) -> PrecheckResult<VerificationRun> {
    let VerifyParams {
        config,
        runtime_handle,
        env,
    } = params;

    config.validate()?;
    config.require_image()?;

    let resolver = SocketResolver::new(env);
    runtime_handle.block_on(async {
        let docker = EngineConnector::connect_with_fallback_and_verify_async(
            config.engine_socket.as_deref(),
            &resolver,
        )
        .await?;
        verify_with_client(&docker, config).await
    })
}

/// Run the broken scenario through any engine implementing the container
/// trait seams.
///
/// The container is created, started and waited on. Its status is inspected
/// once the main process has stopped, bounded by what is left of
/// `wait.timeout_ms`, and the container is then force-removed. The verdict is
/// computed from that final status and the logs read after the wait.
///
/// # Errors
///
/// Returns configuration errors for a missing image or an invalid scenario,
/// and `ContainerError` variants for engine failures. Mismatches are not
/// errors; they are reported in the verdict.
pub async fn verify_with_client<C>(client: &C, config: &AppConfig) -> PrecheckResult<VerificationRun>
where
    C: ContainerCreator + ContainerLifecycle + Sync,
{
    config.validate()?;
    let image = config.require_image()?;
    let scenario = BrokenScenario::from_config(&config.scenario);
    let request = scenario.create_request(image)?;
    let strategy = WaitStrategy::from_config(&config.wait);
    let accepted = &config.scenario.accepted_statuses;

    tracing::info!(%image, ?strategy, "verifying broken startup preconditions");

    ScopedContainer::run(client, &request, |container| async move {
        let wait =
            EngineConnector::wait_for_diagnostics_async(client, container.id(), strategy).await?;
        let budget = config.wait.timeout().saturating_sub(wait.elapsed);
        let snapshot =
            EngineConnector::settle_status_async(client, container.id(), budget).await?;
        let logs = if wait.marker_seen {
            wait.logs.clone()
        } else {
            EngineConnector::fetch_logs_async(client, container.id()).await?
        };
        let verdict = evaluate_snapshot(&scenario, accepted, &snapshot, &logs);

        tracing::info!(
            container_id = container.id(),
            status = %verdict.status,
            passed = verdict.passed(),
            "verification finished"
        );
        Ok(VerificationRun {
            container_id: String::from(container.id()),
            wait,
            verdict,
        })
    })
    .await
}
