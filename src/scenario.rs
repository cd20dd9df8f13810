//! The broken-precondition scenario applied to the image under test.

use crate::config::ScenarioConfig;
use crate::engine::CreateContainerRequest;
use crate::error::Result;
use crate::report::ExpectedDiagnostic;

/// Bind mounts, environment and expected diagnostics derived from a
/// [`ScenarioConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenScenario {
    container_name: Option<String>,
    tty: bool,
    binds: Vec<String>,
    env: Vec<String>,
    expected: Vec<ExpectedDiagnostic>,
}

impl BrokenScenario {
    /// Derive the scenario from configuration.
    ///
    /// Expected diagnostics follow the configured order: one
    /// `not writable by <user>` line per mount target, then one
    /// `does not exist` line per file reference.
    #[must_use]
    pub fn from_config(config: &ScenarioConfig) -> Self {
        let binds = config
            .mounts
            .iter()
            .map(|mount| format!("{}:{}", mount.source, mount.target))
            .collect();
        let env = config
            .file_references
            .iter()
            .map(|reference| format!("{}={}", reference.name, reference.path))
            .collect();

        let not_writable = config
            .mounts
            .iter()
            .map(|mount| ExpectedDiagnostic::NotWritable {
                path: mount.target.clone(),
                user: config.service_user.clone(),
            });
        let missing = config
            .file_references
            .iter()
            .map(|reference| ExpectedDiagnostic::DoesNotExist {
                path: reference.path.clone(),
            });

        Self {
            container_name: config.container_name.clone(),
            tty: config.tty,
            binds,
            env,
            expected: not_writable.chain(missing).collect(),
        }
    }

    /// Bind mounts in `source:target` form.
    #[must_use]
    pub fn binds(&self) -> &[String] {
        &self.binds
    }

    /// Environment entries in `NAME=path` form.
    #[must_use]
    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// Diagnostics the image must print.
    #[must_use]
    pub fn expected_diagnostics(&self) -> &[ExpectedDiagnostic] {
        &self.expected
    }

    /// Build the container-create request for `image`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` for a blank image.
    pub fn create_request(&self, image: &str) -> Result<CreateContainerRequest> {
        Ok(CreateContainerRequest::new(image)?
            .with_name(self.container_name.clone())
            .with_binds(self.binds.clone())
            .with_env(self.env.clone())
            .with_tty(self.tty))
    }
}
