//! Then-step assertions for precondition-verification scenarios.

use precheck::engine::ContainerStatus;
use precheck::report::{ExpectedDiagnostic, Mismatch, Verdict};
use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{VerificationState, VerifyOutcome};

fn completed_verdict(verification_state: &VerificationState) -> StepResult<Verdict> {
    match verification_state.outcome.get() {
        Some(VerifyOutcome::Completed(verdict)) => Ok(verdict),
        Some(VerifyOutcome::Aborted { message, .. }) => {
            Err(format!("expected a verdict, verification aborted: {message}"))
        }
        None => Err(String::from("verification outcome should be set")),
    }
}

#[then("the verdict passes")]
fn verdict_passes(verification_state: &VerificationState) -> StepResult<()> {
    let verdict = completed_verdict(verification_state)?;
    if verdict.passed() {
        return Ok(());
    }
    Err(format!("expected a pass, got mismatches: {:?}", verdict.mismatches))
}

#[then("the verdict fails")]
fn verdict_fails(verification_state: &VerificationState) -> StepResult<()> {
    if completed_verdict(verification_state)?.passed() {
        return Err(String::from("expected the verdict to fail"));
    }
    Ok(())
}

#[then("the verdict reports an unexpected success marker")]
fn verdict_reports_success_marker(verification_state: &VerificationState) -> StepResult<()> {
    let verdict = completed_verdict(verification_state)?;
    if verdict
        .mismatches
        .contains(&Mismatch::UnexpectedSuccessMarker)
    {
        return Ok(());
    }
    Err(format!(
        "expected an unexpected success marker, got {:?}",
        verdict.mismatches
    ))
}

#[then("the verdict reports the exited status")]
fn verdict_reports_exited(verification_state: &VerificationState) -> StepResult<()> {
    let verdict = completed_verdict(verification_state)?;
    if verdict.status == ContainerStatus::Exited {
        return Ok(());
    }
    Err(format!("expected an exited status, got {}", verdict.status))
}

#[then("the container was inspected {count} times")]
fn container_was_inspected(verification_state: &VerificationState, count: usize) -> StepResult<()> {
    let observed = verification_state.inspections.get().unwrap_or(0);
    if observed == count {
        return Ok(());
    }
    Err(format!("expected {count} inspections, observed {observed}"))
}

#[then("the verdict reports an unexpected status")]
fn verdict_reports_status(verification_state: &VerificationState) -> StepResult<()> {
    let verdict = completed_verdict(verification_state)?;
    let found = verdict.mismatches.iter().any(|mismatch| {
        matches!(
            mismatch,
            Mismatch::UnexpectedStatus {
                observed: ContainerStatus::Running,
                ..
            }
        )
    });
    if found {
        return Ok(());
    }
    Err(format!(
        "expected an unexpected running status, got {:?}",
        verdict.mismatches
    ))
}

#[then("the verdict reports a missing diagnostic for {path}")]
fn verdict_reports_missing(verification_state: &VerificationState, path: String) -> StepResult<()> {
    let verdict = completed_verdict(verification_state)?;
    let expected = Mismatch::MissingDiagnostic {
        expected: ExpectedDiagnostic::DoesNotExist { path },
    };
    if verdict.mismatches == vec![expected.clone()] {
        return Ok(());
    }
    Err(format!(
        "expected only {expected:?}, got {:?}",
        verdict.mismatches
    ))
}

#[then("verification aborts with a log capture error")]
fn verification_aborts_with_logs_error(verification_state: &VerificationState) -> StepResult<()> {
    match verification_state.outcome.get() {
        Some(VerifyOutcome::Aborted {
            logs_failed: true, ..
        }) => Ok(()),
        Some(VerifyOutcome::Aborted { message, .. }) => {
            Err(format!("expected a log capture error, got: {message}"))
        }
        Some(VerifyOutcome::Completed(_)) => Err(String::from("expected verification to abort")),
        None => Err(String::from("verification outcome should be set")),
    }
}

#[then("the container was force-removed")]
fn container_was_force_removed(verification_state: &VerificationState) -> StepResult<()> {
    if verification_state.force_removed.get().unwrap_or(false) {
        return Ok(());
    }
    Err(String::from("expected a forced container removal"))
}
