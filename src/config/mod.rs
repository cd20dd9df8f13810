//! Configuration system for precheck.
//!
//! This module provides the configuration structures and CLI definitions for
//! the precheck application. Precedence: CLI flags override environment
//! variables, which override configuration files, which override defaults.
//!
//! The configuration file is expected at `~/.config/precheck/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! engine_socket = "unix:///run/user/1000/podman/podman.sock"
//! image = "registry.example/ldp-web:latest"
//!
//! [scenario]
//! service_user = "node"
//! tty = true
//! accepted_statuses = ["created", "exited"]
//!
//! [[scenario.mounts]]
//! source = "/nonexistent/precheck/data"
//! target = "/opt/ldp-web/data"
//!
//! [[scenario.file_references]]
//! name = "SOLID_SSL_KEY"
//! path = "/missing/key"
//!
//! [wait]
//! strategy = "poll"
//! timeout_ms = 30000
//! poll_interval_ms = 250
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{CheckLogsArgs, Cli, Commands, VerifyArgs};
pub use loader::{env_var_names, load_config};
pub use types::{
    AppConfig, BrokenMount, FileReference, ScenarioConfig, WaitConfig, WaitStrategyKind,
};
