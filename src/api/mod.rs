//! Orchestration API for precheck commands.
//!
//! [`verify`] runs the broken scenario against a live engine, [`plan`]
//! describes it without one and [`check_logs`] judges previously captured
//! output. The CLI binary and library embedders share these functions.
//!
//! Nothing here prints to stdout or stderr or calls `std::process::exit`.

mod check_logs;
mod verify;

pub use check_logs::check_logs;
pub use verify::{VerificationRun, VerifyParams, verify, verify_with_client};

use crate::config::AppConfig;
use crate::engine::CreateContainerRequest;
use crate::error::Result as PrecheckResult;
use crate::report::{Mismatch, Verdict};
use crate::scenario::BrokenScenario;

/// Outcome of a precheck command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The image reported its broken preconditions as expected (exit code 0).
    Success,
    /// The observed startup differed from the expected failure (exit code 1).
    Failed {
        /// Every difference found.
        mismatches: Vec<Mismatch>,
    },
}

impl CommandOutcome {
    /// Map a verdict to an outcome.
    #[must_use]
    pub fn from_verdict(verdict: &Verdict) -> Self {
        if verdict.passed() {
            Self::Success
        } else {
            Self::Failed {
                mismatches: verdict.mismatches.clone(),
            }
        }
    }

    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failed { .. } => 1,
        }
    }
}

/// What `verify` would do, computed without contacting an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// The scenario derived from configuration.
    pub scenario: BrokenScenario,
    /// The container-create request `verify` would send.
    pub request: CreateContainerRequest,
}

/// Build the scenario and container request from `config`.
///
/// # Errors
///
/// Returns `ConfigError::MissingRequired` when no image is configured and
/// `ConfigError::InvalidValue` when the scenario or wait settings are invalid.
pub fn plan(config: &AppConfig) -> PrecheckResult<Plan> {
    config.validate()?;
    let image = config.require_image()?;
    let scenario = BrokenScenario::from_config(&config.scenario);
    let request = scenario.create_request(image)?;
    Ok(Plan { scenario, request })
}
