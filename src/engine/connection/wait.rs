//! Waiting for the entrypoint's startup diagnostics.
//!
//! The image writes its precondition report and then a `Finished:` line.
//! [`WaitStrategy::PollForMarker`] reads the logs until that line shows up;
//! [`WaitStrategy::FixedDelay`] sleeps once and reads whatever is there.
//!
//! The `Finished:` line is printed just before the entrypoint exits, so the
//! status is only judged after [`EngineConnector::settle_status_async`] has
//! waited for the main process to stop.

use std::time::Duration;

use tokio::time::Instant;

use super::{ContainerLifecycle, ContainerSnapshot, EngineConnector};
use crate::config::{WaitConfig, WaitStrategyKind};
use crate::error::PrecheckError;
use crate::report::contains_finished_marker;

/// How to wait before judging the container's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Sleep for the given duration, then read the logs once.
    FixedDelay(Duration),
    /// Read the logs every `interval` until the finished marker appears or
    /// `timeout` elapses.
    PollForMarker {
        /// Upper bound on the total wait.
        timeout: Duration,
        /// Pause between reads.
        interval: Duration,
    },
}

impl WaitStrategy {
    /// Build the strategy selected by `config`.
    #[must_use]
    pub const fn from_config(config: &WaitConfig) -> Self {
        match config.strategy {
            WaitStrategyKind::Fixed => {
                Self::FixedDelay(Duration::from_millis(config.settle_delay_ms))
            }
            WaitStrategyKind::Poll => Self::PollForMarker {
                timeout: Duration::from_millis(config.timeout_ms),
                interval: Duration::from_millis(config.poll_interval_ms),
            },
        }
    }
}

/// What the wait observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome {
    /// The last log text read.
    pub logs: String,
    /// Whether the logs contained a `Finished:` line.
    pub marker_seen: bool,
    /// Time spent waiting.
    pub elapsed: Duration,
}

impl EngineConnector {
    /// Wait for diagnostics according to `strategy`.
    ///
    /// A poll that times out is not an error: the returned outcome has
    /// `marker_seen == false` and the verdict reports the missing marker.
    /// Polling also stops early once the container is no longer active,
    /// since a stopped entrypoint prints nothing more.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::LogsFailed` when reading the logs fails and
    /// `ContainerError::InspectFailed` when a poll cannot inspect the
    /// container.
    pub async fn wait_for_diagnostics_async<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
        strategy: WaitStrategy,
    ) -> Result<WaitOutcome, PrecheckError> {
        let started = Instant::now();

        match strategy {
            WaitStrategy::FixedDelay(delay) => {
                tracing::debug!(%container_id, ?delay, "settling");
                tokio::time::sleep(delay).await;
                let logs = Self::fetch_logs_async(client, container_id).await?;
                Ok(WaitOutcome {
                    marker_seen: contains_finished_marker(&logs),
                    logs,
                    elapsed: started.elapsed(),
                })
            }
            WaitStrategy::PollForMarker { timeout, interval } => {
                Self::poll_for_marker(client, container_id, started, timeout, interval).await
            }
        }
    }

    async fn poll_for_marker<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
        started: Instant,
        timeout: Duration,
        interval: Duration,
    ) -> Result<WaitOutcome, PrecheckError> {
        let deadline = started + timeout;
        let mut polls: u32 = 0;

        loop {
            let logs = Self::fetch_logs_async(client, container_id).await?;
            polls = polls.saturating_add(1);

            if contains_finished_marker(&logs) {
                tracing::debug!(%container_id, polls, "finished marker seen");
                return Ok(WaitOutcome {
                    logs,
                    marker_seen: true,
                    elapsed: started.elapsed(),
                });
            }

            let snapshot = Self::inspect_snapshot_async(client, container_id).await?;
            if !snapshot.status.is_active() {
                // Output written between the read and the inspect is final now.
                let final_logs = Self::fetch_logs_async(client, container_id).await?;
                let marker_seen = contains_finished_marker(&final_logs);
                tracing::debug!(
                    %container_id,
                    polls,
                    status = %snapshot.status,
                    marker_seen,
                    "container stopped while polling"
                );
                return Ok(WaitOutcome {
                    logs: final_logs,
                    marker_seen,
                    elapsed: started.elapsed(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    %container_id,
                    polls,
                    ?timeout,
                    "finished marker not seen before timeout"
                );
                return Ok(WaitOutcome {
                    logs,
                    marker_seen: false,
                    elapsed: started.elapsed(),
                });
            }

            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    /// Inspect the container once its main process has stopped.
    ///
    /// A container that is still active is waited on for at most `budget`,
    /// then inspected again. One that outlives the budget is reported with
    /// its active status, which the verdict rejects.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::InspectFailed` or `ContainerError::WaitFailed`
    /// when the engine calls fail.
    pub async fn settle_status_async<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
        budget: Duration,
    ) -> Result<ContainerSnapshot, PrecheckError> {
        let snapshot = Self::inspect_snapshot_async(client, container_id).await?;
        if !snapshot.status.is_active() || budget.is_zero() {
            return Ok(snapshot);
        }

        tracing::debug!(%container_id, status = %snapshot.status, ?budget, "waiting for exit");
        let waited =
            tokio::time::timeout(budget, Self::wait_container_async(client, container_id)).await;
        let Ok(exit_code) = waited else {
            tracing::warn!(%container_id, ?budget, "container still active after wait budget");
            return Ok(snapshot);
        };
        exit_code?;

        Self::inspect_snapshot_async(client, container_id).await
    }
}
