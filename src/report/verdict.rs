//! Comparing observed container output against the broken scenario.

use std::fmt;

use super::{ERROR_MARKER, ExpectedDiagnostic, SUCCESS_MARKER, StartupReport};
use crate::engine::{ContainerSnapshot, ContainerStatus};
use crate::scenario::BrokenScenario;

/// One way the observed startup differs from the expected failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// A diagnostic line is absent from the logs.
    MissingDiagnostic {
        /// The line that was expected.
        expected: ExpectedDiagnostic,
    },
    /// `Finished: ERROR` is absent from the logs.
    MissingErrorMarker,
    /// `Finished: SUCCESS` is present in the logs.
    UnexpectedSuccessMarker,
    /// The container ended in a status that is not accepted.
    UnexpectedStatus {
        /// Status reported by the engine.
        observed: ContainerStatus,
        /// Statuses that would have passed.
        accepted: Vec<ContainerStatus>,
    },
    /// The main process exited with status 0 despite the broken preconditions.
    CleanExit,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDiagnostic { expected } => {
                write!(f, "missing diagnostic: {expected}")
            }
            Self::MissingErrorMarker => write!(f, "missing '{ERROR_MARKER}'"),
            Self::UnexpectedSuccessMarker => write!(f, "unexpected '{SUCCESS_MARKER}'"),
            Self::UnexpectedStatus { observed, accepted } => {
                let names: Vec<&str> = accepted.iter().map(|s| s.as_str()).collect();
                write!(
                    f,
                    "container status '{observed}' is not one of [{}]",
                    names.join(", ")
                )
            }
            Self::CleanExit => f.write_str("entrypoint exited with status 0"),
        }
    }
}

/// Result of one verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Status reported by the engine.
    pub status: ContainerStatus,
    /// Exit code reported by the engine, when known.
    pub exit_code: Option<i64>,
    /// Parsed startup output.
    pub report: StartupReport,
    /// Every difference from the expected failure. Empty means pass.
    pub mismatches: Vec<Mismatch>,
}

impl Verdict {
    /// Whether the image reported its broken preconditions as expected.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status: {}", self.status)?;
        if let Some(code) = self.exit_code {
            writeln!(f, "exit code: {code}")?;
        }
        writeln!(
            f,
            "checks: {} failed, {} passed",
            self.report.failed.len(),
            self.report.passed.len()
        )?;
        match &self.report.finished {
            Some(marker) => writeln!(f, "finished: {marker}")?,
            None => writeln!(f, "finished: (none)")?,
        }
        for mismatch in &self.mismatches {
            writeln!(f, "  - {mismatch}")?;
        }
        write!(f, "result: {}", if self.passed() { "PASS" } else { "FAIL" })
    }
}

/// Judge `logs` and `status` against `scenario`.
///
/// Every expected diagnostic, `Finished: ERROR` and the absence of
/// `Finished: SUCCESS` are checked as substrings of `logs`. The status must
/// be one of `accepted`.
#[must_use]
pub fn evaluate(
    scenario: &BrokenScenario,
    accepted: &[ContainerStatus],
    status: ContainerStatus,
    logs: &str,
) -> Verdict {
    let mut mismatches: Vec<Mismatch> = scenario
        .expected_diagnostics()
        .iter()
        .filter(|expected| !logs.contains(&expected.line()))
        .map(|expected| Mismatch::MissingDiagnostic {
            expected: expected.clone(),
        })
        .collect();

    if !logs.contains(ERROR_MARKER) {
        mismatches.push(Mismatch::MissingErrorMarker);
    }
    if logs.contains(SUCCESS_MARKER) {
        mismatches.push(Mismatch::UnexpectedSuccessMarker);
    }
    if !accepted.contains(&status) {
        mismatches.push(Mismatch::UnexpectedStatus {
            observed: status,
            accepted: accepted.to_vec(),
        });
    }

    tracing::debug!(%status, mismatches = mismatches.len(), "evaluated startup output");
    Verdict {
        status,
        exit_code: None,
        report: StartupReport::parse(logs),
        mismatches,
    }
}

/// [`evaluate`] with the exit code from an inspect snapshot.
///
/// An exited container whose exit code is 0 is a mismatch: the image must
/// fail when its preconditions are broken.
#[must_use]
pub fn evaluate_snapshot(
    scenario: &BrokenScenario,
    accepted: &[ContainerStatus],
    snapshot: &ContainerSnapshot,
    logs: &str,
) -> Verdict {
    let mut verdict = evaluate(scenario, accepted, snapshot.status, logs);
    verdict.exit_code = snapshot.exit_code;
    if snapshot.status == ContainerStatus::Exited && snapshot.exit_code == Some(0) {
        verdict.mismatches.push(Mismatch::CleanExit);
    }
    verdict
}
