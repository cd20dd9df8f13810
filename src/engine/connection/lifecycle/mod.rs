//! Start, inspect, log capture and removal of a created container.
//!
//! These operations sit behind [`ContainerLifecycle`] so the scoped
//! verification flow can be exercised against a mock engine.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::models::ContainerInspectResponse;
use bollard::query_parameters::{
    InspectContainerOptions, LogsOptionsBuilder, RemoveContainerOptionsBuilder,
    StartContainerOptions, WaitContainerOptionsBuilder,
};
use clap::ValueEnum;
use futures_util::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use super::EngineConnector;
use crate::error::{ContainerError, PrecheckError};

/// HTTP status the engine answers with when a container no longer exists.
const NOT_FOUND_STATUS: u16 = 404;

/// Boxed future type returned by [`ContainerLifecycle::start_container`].
pub type StartContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerLifecycle::inspect_container`].
pub type InspectContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ContainerInspectResponse, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerLifecycle::fetch_logs`].
pub type FetchLogsFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerLifecycle::wait_container`].
pub type WaitContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<i64>, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerLifecycle::remove_container`].
pub type RemoveContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), BollardError>> + Send + 'a>>;

/// Behaviour required to drive a created container to a verdict.
pub trait ContainerLifecycle {
    /// Start a created container.
    fn start_container(&self, container_id: &str) -> StartContainerFuture<'_>;

    /// Inspect a container for its state.
    fn inspect_container(&self, container_id: &str) -> InspectContainerFuture<'_>;

    /// Fetch everything the container has written to stdout and stderr so far,
    /// decoded as UTF-8 (lossy).
    fn fetch_logs(&self, container_id: &str) -> FetchLogsFuture<'_>;

    /// Block until the container is no longer running and return the exit
    /// code of its main process, when the engine reports one.
    fn wait_container(&self, container_id: &str) -> WaitContainerFuture<'_>;

    /// Remove a container, killing it first when `force` is set.
    fn remove_container(&self, container_id: &str, force: bool) -> RemoveContainerFuture<'_>;
}

impl ContainerLifecycle for Docker {
    fn start_container(&self, container_id: &str) -> StartContainerFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            Self::start_container(self, &container_id_owned, None::<StartContainerOptions>).await
        })
    }

    fn inspect_container(&self, container_id: &str) -> InspectContainerFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            Self::inspect_container(self, &container_id_owned, None::<InspectContainerOptions>)
                .await
        })
    }

    fn fetch_logs(&self, container_id: &str) -> FetchLogsFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            let options = LogsOptionsBuilder::new().stdout(true).stderr(true).build();
            self.logs(&container_id_owned, Some(options))
                .try_fold(String::new(), |mut text, output| async move {
                    text.push_str(&String::from_utf8_lossy(&output.into_bytes()));
                    Ok(text)
                })
                .await
        })
    }

    fn wait_container(&self, container_id: &str) -> WaitContainerFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            let options = WaitContainerOptionsBuilder::new()
                .condition("not-running")
                .build();
            let mut responses =
                Box::pin(Self::wait_container(self, &container_id_owned, Some(options)));
            match responses.next().await {
                Some(Ok(response)) => Ok(Some(response.status_code)),
                // The engine reports a non-zero exit as a wait error.
                Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(Some(code)),
                Some(Err(error)) => Err(error),
                None => Ok(None),
            }
        })
    }

    fn remove_container(&self, container_id: &str, force: bool) -> RemoveContainerFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            let options = RemoveContainerOptionsBuilder::new().force(force).build();
            Self::remove_container(self, &container_id_owned, Some(options)).await
        })
    }
}

/// Lifecycle status of a container as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Created but never started.
    Created,
    /// Main process running.
    Running,
    /// Processes frozen.
    Paused,
    /// Being restarted by a restart policy.
    Restarting,
    /// Removal in progress.
    Removing,
    /// Main process has terminated.
    Exited,
    /// Engine failed to stop or remove the container.
    Dead,
    /// The engine did not report a status this crate knows.
    Unknown,
}

impl ContainerStatus {
    /// Parse the status string used by the Docker Engine API.
    ///
    /// Unrecognised values map to [`Self::Unknown`].
    #[must_use]
    pub fn from_engine(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    /// Return the engine spelling of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a main process is (or is about to be) alive in this status.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Restarting)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status and exit code captured from a single inspect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSnapshot {
    /// Lifecycle status.
    pub status: ContainerStatus,
    /// Exit code of the main process, when the engine reports one.
    pub exit_code: Option<i64>,
}

impl ContainerSnapshot {
    fn from_inspect(response: &ContainerInspectResponse) -> Self {
        let state = response.state.as_ref();
        let status = state
            .and_then(|container_state| container_state.status.as_ref())
            .map_or(ContainerStatus::Unknown, |status| {
                ContainerStatus::from_engine(&status.to_string())
            });
        Self {
            status,
            exit_code: state.and_then(|container_state| container_state.exit_code),
        }
    }
}

impl EngineConnector {
    /// Start a created container.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::StartFailed` when the engine refuses to start
    /// the container.
    pub async fn start_container_async<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
    ) -> Result<(), PrecheckError> {
        client.start_container(container_id).await.map_err(|error| {
            PrecheckError::from(ContainerError::StartFailed {
                container_id: String::from(container_id),
                message: error.to_string(),
            })
        })?;
        tracing::info!(%container_id, "container started");
        Ok(())
    }

    /// Inspect a container and capture its status and exit code.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::InspectFailed` when the inspect call fails.
    pub async fn inspect_snapshot_async<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
    ) -> Result<ContainerSnapshot, PrecheckError> {
        let response = client
            .inspect_container(container_id)
            .await
            .map_err(|error| {
                PrecheckError::from(ContainerError::InspectFailed {
                    container_id: String::from(container_id),
                    message: error.to_string(),
                })
            })?;

        let snapshot = ContainerSnapshot::from_inspect(&response);
        tracing::debug!(
            %container_id,
            status = %snapshot.status,
            exit_code = ?snapshot.exit_code,
            "container inspected"
        );
        Ok(snapshot)
    }

    /// Fetch the container's combined stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::LogsFailed` when the log stream fails.
    pub async fn fetch_logs_async<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
    ) -> Result<String, PrecheckError> {
        client.fetch_logs(container_id).await.map_err(|error| {
            PrecheckError::from(ContainerError::LogsFailed {
                container_id: String::from(container_id),
                message: error.to_string(),
            })
        })
    }

    /// Wait for the container's main process to stop.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::WaitFailed` when the engine cannot wait on the
    /// container.
    pub async fn wait_container_async<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
    ) -> Result<Option<i64>, PrecheckError> {
        let exit_code = client.wait_container(container_id).await.map_err(|error| {
            PrecheckError::from(ContainerError::WaitFailed {
                container_id: String::from(container_id),
                message: error.to_string(),
            })
        })?;
        tracing::debug!(%container_id, ?exit_code, "container stopped");
        Ok(exit_code)
    }

    /// Force-remove a container.
    ///
    /// A container that no longer exists counts as removed.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::RemoveFailed` for any other engine failure.
    pub async fn force_remove_async<C: ContainerLifecycle>(
        client: &C,
        container_id: &str,
    ) -> Result<(), PrecheckError> {
        match client.remove_container(container_id, true).await {
            Ok(()) => {
                tracing::info!(%container_id, "container removed");
                Ok(())
            }
            Err(BollardError::DockerResponseServerError { status_code, .. })
                if status_code == NOT_FOUND_STATUS =>
            {
                tracing::debug!(%container_id, "container already gone");
                Ok(())
            }
            Err(error) => Err(PrecheckError::from(ContainerError::RemoveFailed {
                container_id: String::from(container_id),
                message: error.to_string(),
            })),
        }
    }
}
