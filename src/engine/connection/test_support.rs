//! Mock engine shared by the engine and orchestration unit tests.

use bollard::models::{ContainerCreateBody, ContainerInspectResponse, ContainerState};
use bollard::query_parameters::CreateContainerOptions;
use mockall::mock;

use super::{
    ContainerCreator, ContainerLifecycle, CreateContainerFuture, FetchLogsFuture,
    InspectContainerFuture, RemoveContainerFuture, StartContainerFuture, WaitContainerFuture,
};

mock! {
    #[derive(Debug)]
    pub Engine {}

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

/// Build an inspect response carrying `status` and `exit_code`.
pub(crate) fn inspect_response(
    status: bollard::models::ContainerStateStatusEnum,
    exit_code: Option<i64>,
) -> ContainerInspectResponse {
    ContainerInspectResponse {
        state: Some(ContainerState {
            status: Some(status),
            exit_code,
            ..ContainerState::default()
        }),
        ..ContainerInspectResponse::default()
    }
}

/// Build a not-found error as the engine reports it for missing containers.
pub(crate) fn not_found_error() -> bollard::errors::Error {
    bollard::errors::Error::DockerResponseServerError {
        status_code: 404,
        message: String::from("No such container"),
    }
}
