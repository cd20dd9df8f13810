//! Container creation for verification scenarios.
//!
//! This module translates a [`CreateContainerRequest`] into a `Bollard`
//! container-create payload. The request carries the bind mounts and
//! environment entries that break the image's startup preconditions.

use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::models::{ContainerCreateBody, ContainerCreateResponse, HostConfig};
use bollard::query_parameters::{CreateContainerOptions, CreateContainerOptionsBuilder};

use super::EngineConnector;
use crate::error::{ConfigError, ContainerError, PrecheckError};

/// Boxed future type returned by [`ContainerCreator`] implementors.
pub type CreateContainerFuture<'a> = Pin<
    Box<dyn Future<Output = Result<ContainerCreateResponse, bollard::errors::Error>> + Send + 'a>,
>;

/// Behaviour required to create a container via a backing engine client.
///
/// This abstraction exists to keep container-creation logic testable without a
/// running daemon.
pub trait ContainerCreator {
    /// Create a container from `Bollard` options and body payload.
    fn create_container(
        &self,
        options: Option<CreateContainerOptions>,
        config: ContainerCreateBody,
    ) -> CreateContainerFuture<'_>;
}

impl ContainerCreator for Docker {
    fn create_container(
        &self,
        options: Option<CreateContainerOptions>,
        config: ContainerCreateBody,
    ) -> CreateContainerFuture<'_> {
        Box::pin(async move { Self::create_container(self, options, config).await })
    }
}

/// Container-creation request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContainerRequest {
    /// The container image to create from.
    image: String,

    /// Optional container name.
    name: Option<String>,

    /// Environment variables in `KEY=value` form.
    env: Vec<String>,

    /// Bind mounts in `source:target` form.
    binds: Vec<String>,

    /// Whether a pseudo-terminal is allocated for the entrypoint.
    tty: bool,
}

impl CreateContainerRequest {
    /// Create a request for `image` with no mounts, no environment and no tty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` when `image` is empty or
    /// whitespace-only.
    pub fn new(image: impl Into<String>) -> Result<Self, PrecheckError> {
        let image_value = image.into();
        let validated_image = String::from(validate_image(&image_value)?);

        Ok(Self {
            image: validated_image,
            name: None,
            env: Vec::new(),
            binds: Vec::new(),
            tty: false,
        })
    }

    /// Attach an optional container name. Blank names are dropped.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|value| !value.trim().is_empty());
        self
    }

    /// Replace the environment entries.
    #[must_use]
    pub fn with_env(mut self, env: Vec<String>) -> Self {
        self.env = env;
        self
    }

    /// Replace the bind mounts.
    #[must_use]
    pub fn with_binds(mut self, binds: Vec<String>) -> Self {
        self.binds = binds;
        self
    }

    /// Control pseudo-terminal allocation.
    #[must_use]
    pub const fn with_tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    /// Return the configured image.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Return the optional configured name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the configured environment entries.
    #[must_use]
    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// Return the configured bind mounts.
    #[must_use]
    pub fn binds(&self) -> &[String] {
        &self.binds
    }

    /// Return whether a pseudo-terminal is allocated.
    #[must_use]
    pub const fn tty(&self) -> bool {
        self.tty
    }
}

impl EngineConnector {
    /// Create a container using a provided client abstraction.
    ///
    /// Returns the engine-assigned container id.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::CreateFailed` when the engine rejects the
    /// create request.
    pub async fn create_container_async<C: ContainerCreator>(
        creator: &C,
        request: &CreateContainerRequest,
    ) -> Result<String, PrecheckError> {
        let options = build_create_options(request.name());
        let config = build_create_body(request);

        let response = creator
            .create_container(options, config)
            .await
            .map_err(|error| {
                PrecheckError::from(ContainerError::CreateFailed {
                    message: error.to_string(),
                })
            })?;

        for warning in &response.warnings {
            tracing::warn!(container_id = %response.id, %warning, "engine warning on create");
        }
        tracing::info!(
            container_id = %response.id,
            image = request.image(),
            binds = request.binds().len(),
            "container created"
        );

        Ok(response.id)
    }
}

fn validate_image(image: &str) -> Result<&str, PrecheckError> {
    let trimmed = image.trim();

    if trimmed.is_empty() {
        return Err(PrecheckError::from(ConfigError::MissingRequired {
            field: String::from("image"),
        }));
    }

    Ok(trimmed)
}

fn build_create_options(name: Option<&str>) -> Option<CreateContainerOptions> {
    name.map(|container_name| {
        CreateContainerOptionsBuilder::new()
            .name(container_name)
            .build()
    })
}

fn build_create_body(request: &CreateContainerRequest) -> ContainerCreateBody {
    ContainerCreateBody {
        image: Some(String::from(request.image())),
        env: non_empty(request.env()),
        tty: Some(request.tty()),
        host_config: Some(HostConfig {
            binds: non_empty(request.binds()),
            ..HostConfig::default()
        }),
        ..ContainerCreateBody::default()
    }
}

fn non_empty(entries: &[String]) -> Option<Vec<String>> {
    (!entries.is_empty()).then(|| entries.to_vec())
}
