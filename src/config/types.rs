//! Configuration data types for precheck.

use std::collections::HashSet;
use std::time::Duration;

use clap::ValueEnum;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::engine::ContainerStatus;
use crate::error::{ConfigError, Result};

/// A bind mount whose host side is expected not to exist.
///
/// The engine creates missing bind sources as root-owned directories, so the
/// image's service user cannot write to the target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BrokenMount {
    /// Host path, intentionally missing.
    pub source: String,
    /// Absolute path inside the container.
    pub target: String,
}

impl BrokenMount {
    /// Create a mount from host `source` to container `target`.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// An environment variable pointing at a file that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileReference {
    /// Environment variable name.
    pub name: String,
    /// Path the variable names.
    pub path: String,
}

impl FileReference {
    /// Create a reference `name=path`.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

fn default_mounts() -> Vec<BrokenMount> {
    vec![
        BrokenMount::new("/nonexistent/precheck/data", "/opt/ldp-web/data"),
        BrokenMount::new("/nonexistent/precheck/db", "/opt/ldp-web/.db"),
        BrokenMount::new("/nonexistent/precheck/config", "/opt/ldp-web/config"),
    ]
}

fn default_file_references() -> Vec<FileReference> {
    vec![
        FileReference::new("SOLID_SSL_KEY", "/missing/key"),
        FileReference::new("SOLID_SSL_CERT", "/missing/cert"),
    ]
}

/// The broken-precondition scenario applied to the container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Fixed container name. The engine assigns one when unset.
    pub container_name: Option<String>,

    /// User the image's entrypoint checks writability for.
    #[default("node".to_owned())]
    pub service_user: String,

    /// Allocate a pseudo-terminal for the entrypoint.
    #[default(true)]
    pub tty: bool,

    /// Statuses that count as "never reached a running state".
    #[default(vec![ContainerStatus::Created, ContainerStatus::Exited])]
    pub accepted_statuses: Vec<ContainerStatus>,

    /// Bind mounts with missing host sources.
    #[default(default_mounts())]
    pub mounts: Vec<BrokenMount>,

    /// Environment variables naming missing files.
    #[default(default_file_references())]
    pub file_references: Vec<FileReference>,
}

impl ScenarioConfig {
    /// Check that the scenario can produce a meaningful verification.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.service_user.trim().is_empty() {
            return Err(invalid("scenario.service_user", "must not be empty"));
        }
        if self.accepted_statuses.is_empty() {
            return Err(invalid(
                "scenario.accepted_statuses",
                "at least one status is required",
            ));
        }
        if let Some(active) = self.accepted_statuses.iter().find(|s| s.is_active()) {
            return Err(invalid(
                "scenario.accepted_statuses",
                &format!("'{active}' means the main process is running"),
            ));
        }
        if self.mounts.is_empty() && self.file_references.is_empty() {
            return Err(invalid(
                "scenario",
                "at least one broken mount or file reference is required",
            ));
        }
        self.validate_mounts()?;
        self.validate_file_references()
    }

    /// Trim the container name; an empty name means "let the engine choose".
    pub(crate) fn normalise(&mut self) {
        self.container_name = self
            .container_name
            .take()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
    }

    fn validate_mounts(&self) -> Result<()> {
        let mut targets = HashSet::new();
        for mount in &self.mounts {
            if mount.source.trim().is_empty() {
                return Err(invalid("scenario.mounts.source", "must not be empty"));
            }
            if !mount.target.starts_with('/') {
                return Err(invalid(
                    "scenario.mounts.target",
                    &format!("'{}' is not an absolute path", mount.target),
                ));
            }
            if !targets.insert(mount.target.as_str()) {
                return Err(invalid(
                    "scenario.mounts.target",
                    &format!("'{}' is mounted more than once", mount.target),
                ));
            }
        }
        Ok(())
    }

    fn validate_file_references(&self) -> Result<()> {
        for reference in &self.file_references {
            if reference.name.trim().is_empty() || reference.name.contains('=') {
                return Err(invalid(
                    "scenario.file_references.name",
                    &format!("'{}' is not a valid variable name", reference.name),
                ));
            }
            if reference.path.trim().is_empty() {
                return Err(invalid(
                    "scenario.file_references.path",
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }
}

/// How the verification waits for the entrypoint's diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategyKind {
    /// Poll the logs until a `Finished:` marker appears or the timeout elapses.
    #[default]
    Poll,
    /// Sleep for a fixed settle delay, then read the logs once.
    Fixed,
}

impl WaitStrategyKind {
    /// Return the configuration spelling of this strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Poll => "poll",
            Self::Fixed => "fixed",
        }
    }
}

/// Wait behaviour configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct WaitConfig {
    /// Strategy used to wait for diagnostics.
    pub strategy: WaitStrategyKind,

    /// Delay used by the fixed strategy, in milliseconds.
    #[default(2_000)]
    pub settle_delay_ms: u64,

    /// Upper bound on the whole wait, in milliseconds: log polling plus the
    /// wait for the main process to stop.
    #[default(30_000)]
    pub timeout_ms: u64,

    /// Pause between log polls, in milliseconds.
    #[default(250)]
    pub poll_interval_ms: u64,
}

impl WaitConfig {
    /// The overall wait bound as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check the timing values.
    ///
    /// The poll interval is only checked for the polling strategy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the timeout is zero, or, when
    /// polling, when the interval is zero or exceeds the timeout.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(invalid("wait.timeout_ms", "must be greater than zero"));
        }
        if self.strategy != WaitStrategyKind::Poll {
            return Ok(());
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("wait.poll_interval_ms", "must be greater than zero"));
        }
        if self.poll_interval_ms > self.timeout_ms {
            return Err(invalid(
                "wait.poll_interval_ms",
                &format!(
                    "{} exceeds wait.timeout_ms ({})",
                    self.poll_interval_ms, self.timeout_ms
                ),
            ));
        }
        Ok(())
    }
}

/// Root application configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `PRECHECK_CONFIG_PATH` environment variable
/// 2. `.precheck.toml` in the current working directory
/// 3. `.precheck.toml` in the home directory
/// 4. `~/.config/precheck/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "PRECHECK",
    post_merge_hook,
    discovery(
        app_name = "precheck",
        env_var = "PRECHECK_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".precheck.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// The container engine socket path or URL.
    pub engine_socket: Option<String>,

    /// The image under test.
    pub image: Option<String>,

    /// Broken-precondition scenario.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub scenario: ScenarioConfig,

    /// Wait behaviour.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub wait: WaitConfig,
}

impl AppConfig {
    /// Return the configured image, failing when none is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` for a missing or blank image.
    pub fn require_image(&self) -> Result<&str> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .ok_or_else(|| {
                ConfigError::MissingRequired {
                    field: String::from("image"),
                }
                .into()
            })
    }

    /// Validate the scenario and wait sections.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> Result<()> {
        self.scenario.validate()?;
        self.wait.validate()
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        self.scenario.normalise();
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> crate::error::PrecheckError {
    ConfigError::InvalidValue {
        field: String::from(field),
        reason: String::from(reason),
    }
    .into()
}
