//! Container engine connection and container lifecycle.
//!
//! The socket endpoint is resolved through a priority-based fallback chain:
//!
//! 1. CLI argument (`--engine-socket`)
//! 2. Config file (`engine_socket` in TOML)
//! 3. `PRECHECK_ENGINE_SOCKET` environment variable
//! 4. `DOCKER_HOST` environment variable
//! 5. `CONTAINER_HOST` environment variable
//! 6. `PODMAN_HOST` environment variable
//! 7. Platform default (`/var/run/docker.sock` on Unix)
//!
//! Engine calls go through the [`ContainerCreator`] and
//! [`ContainerLifecycle`] traits so verification can run against a mock.

mod connection;

pub use connection::{
    ContainerCreator, ContainerLifecycle, ContainerSnapshot, ContainerStatus,
    CreateContainerFuture, CreateContainerRequest, EngineConnector, FetchLogsFuture,
    InspectContainerFuture, RemoveContainerFuture, ScopedContainer, SocketResolver,
    StartContainerFuture, WaitContainerFuture, WaitOutcome, WaitStrategy,
};

#[cfg(test)]
pub(crate) use connection::test_support;
