//! Command-line argument definitions for precheck.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

use super::WaitStrategyKind;
use crate::engine::ContainerStatus;

/// Command-line interface for precheck.
#[derive(Debug, Parser)]
#[command(name = "precheck")]
#[command(
    author,
    version,
    about = "Verifies that a container image reports broken startup preconditions"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine socket path or URL.
    #[arg(long, global = true)]
    pub engine_socket: Option<String>,

    /// Image under test.
    #[arg(long, global = true)]
    pub image: Option<String>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Launch the image with broken preconditions and check its diagnostics.
    Verify(VerifyArgs),

    /// Print the scenario and container request without contacting an engine.
    Plan,

    /// Evaluate a captured log file against the scenario.
    CheckLogs(CheckLogsArgs),
}

/// Arguments for the `verify` subcommand.
#[derive(Debug, Default, Parser)]
pub struct VerifyArgs {
    /// Fixed container name.
    #[arg(long)]
    pub name: Option<String>,

    /// Wait strategy override.
    #[arg(long, value_enum)]
    pub wait: Option<WaitStrategyKind>,
}

/// Arguments for the `check-logs` subcommand.
#[derive(Debug, Parser)]
pub struct CheckLogsArgs {
    /// Path to the captured log output.
    #[arg(required = true)]
    pub path: Utf8PathBuf,

    /// Container status observed alongside the logs.
    #[arg(long, value_enum, default_value_t = ContainerStatus::Created)]
    pub status: ContainerStatus,
}
