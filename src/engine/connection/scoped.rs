//! A container that lives exactly as long as one verification body.

use std::future::Future;

use super::{ContainerCreator, ContainerLifecycle, CreateContainerRequest, EngineConnector};
use crate::error::PrecheckError;

/// Handle to a created and started container, passed to the body of
/// [`ScopedContainer::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedContainer {
    id: String,
    name: Option<String>,
}

impl ScopedContainer {
    /// Engine-assigned container id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Requested container name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Create and start a container from `request`, run `body`, then
    /// force-remove the container.
    ///
    /// Removal happens on every path once the container exists: after a
    /// failed start, after a failed body and after a successful one.
    ///
    /// # Errors
    ///
    /// Returns the creation error when nothing was created. Otherwise a start
    /// or body error wins over a removal error, which is only logged. A
    /// removal failure after a successful body is returned as
    /// `ContainerError::RemoveFailed`.
    pub async fn run<C, F, Fut, T>(
        client: &C,
        request: &CreateContainerRequest,
        body: F,
    ) -> Result<T, PrecheckError>
    where
        C: ContainerCreator + ContainerLifecycle + Sync,
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<T, PrecheckError>>,
    {
        let id = EngineConnector::create_container_async(client, request).await?;
        let handle = Self {
            id,
            name: request.name().map(String::from),
        };

        let outcome = match EngineConnector::start_container_async(client, handle.id()).await {
            Ok(()) => body(handle.clone()).await,
            Err(error) => Err(error),
        };

        let removal = EngineConnector::force_remove_async(client, handle.id()).await;

        match (outcome, removal) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(remove_error)) => Err(remove_error),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(remove_error)) => {
                tracing::warn!(
                    container_id = handle.id(),
                    error = %remove_error,
                    "container removal failed after an earlier error"
                );
                Err(error)
            }
        }
    }
}
