//! Health check and connect-and-verify functionality.
//!
//! A verification run pings the engine before creating anything so that an
//! unreachable daemon is reported as a connection problem rather than as a
//! failed container creation.

use std::time::Duration;

use bollard::Docker;

use super::{EngineConnector, HEALTH_CHECK_TIMEOUT_SECS, SocketResolver};
use crate::error::{ContainerError, PrecheckError};

impl EngineConnector {
    /// Perform a ping with timeout.
    async fn ping_with_timeout(docker: &Docker) -> Result<(), PrecheckError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

        tokio::time::timeout(timeout, docker.ping())
            .await
            .map_err(|_| {
                PrecheckError::from(ContainerError::HealthCheckTimeout {
                    seconds: HEALTH_CHECK_TIMEOUT_SECS,
                })
            })?
            .map_err(|e| {
                PrecheckError::from(ContainerError::HealthCheckFailed {
                    message: e.to_string(),
                })
            })?;
        Ok(())
    }

    /// Verify the container engine is responsive.
    ///
    /// Sends a ping request to the engine and waits for a response. This
    /// confirms the engine is operational, not just that the socket is
    /// reachable.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::HealthCheckFailed` if the engine does not
    /// respond correctly.
    ///
    /// Returns `ContainerError::HealthCheckTimeout` if the check times out.
    pub async fn health_check_async(docker: &Docker) -> Result<(), PrecheckError> {
        Self::ping_with_timeout(docker).await
    }

    /// Connect using fallback resolution and verify the engine responds.
    ///
    /// Combines [`Self::connect_with_fallback`] with
    /// [`Self::health_check_async`].
    ///
    /// # Errors
    ///
    /// Returns connection errors from [`Self::connect`], and
    /// `ContainerError::HealthCheckFailed` or
    /// `ContainerError::HealthCheckTimeout` if the engine does not answer.
    pub async fn connect_with_fallback_and_verify_async<E: mockable::Env>(
        config_socket: Option<&str>,
        resolver: &SocketResolver<'_, E>,
    ) -> Result<Docker, PrecheckError> {
        let docker = Self::connect_with_fallback(config_socket, resolver)?;
        Self::health_check_async(&docker).await?;
        tracing::debug!("container engine answered ping");
        Ok(docker)
    }
}
