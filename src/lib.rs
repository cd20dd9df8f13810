//! Verifies that a container image refuses to start when its startup
//! preconditions are broken.
//!
//! `precheck` creates a container from the image under test with bind mounts
//! whose host sources do not exist and environment variables naming files
//! that do not exist. It waits for the entrypoint's diagnostics, then checks
//! that every broken precondition was reported, that the entrypoint finished
//! with `Finished: ERROR`, and that the container never reached a running
//! state. The container is force-removed afterwards whatever happened.
//!
//! # Modules
//!
//! - [`config`]: Configuration with layered precedence (CLI > env > file > defaults)
//! - [`engine`]: Container engine connection and container lifecycle
//! - [`scenario`]: The broken mounts and environment applied to the container
//! - [`report`]: Parsing startup diagnostics and judging them
//! - [`api`]: Orchestration for the `verify`, `plan` and `check-logs` commands
//! - [`error`]: Semantic error types for the application
//! - [`logging`]: Tracing subscriber setup for the binary

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod report;
pub mod scenario;
