//! Shared behavioural-test state for precondition-verification scenarios.

use bollard::models::ContainerStateStatusEnum;
use precheck::config::WaitStrategyKind;
use precheck::report::Verdict;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// What the verification produced.
#[derive(Debug, Clone)]
pub(crate) enum VerifyOutcome {
    /// Verification ran to a verdict.
    Completed(Verdict),
    /// Verification aborted with an error.
    Aborted {
        /// Whether the error was a log-capture failure.
        logs_failed: bool,
        /// Human-readable error message.
        message: String,
    },
}

/// Shared scenario state for verification behavioural tests.
#[derive(Default, ScenarioState)]
pub(crate) struct VerificationState {
    /// Text the mocked container writes to its logs.
    pub(crate) logs: Slot<String>,

    /// Whether the mocked engine fails log reads.
    pub(crate) logs_fail: Slot<bool>,

    /// Status the mocked engine reports on inspect.
    pub(crate) engine_status: Slot<ContainerStateStatusEnum>,

    /// Whether the container stops once the engine is asked to wait on it.
    pub(crate) exits_on_wait: Slot<bool>,

    /// Configured wait strategy.
    pub(crate) strategy: Slot<WaitStrategyKind>,

    /// Outcome of the verification.
    pub(crate) outcome: Slot<VerifyOutcome>,

    /// Whether the mocked engine received a forced remove.
    pub(crate) force_removed: Slot<bool>,

    /// Number of inspect calls the mocked engine answered.
    pub(crate) inspections: Slot<usize>,
}

/// Fixture providing fresh state for each verification scenario.
#[fixture]
pub(crate) fn verification_state() -> VerificationState {
    let state = VerificationState::default();
    state.logs.set(String::new());
    state.logs_fail.set(false);
    state.engine_status.set(ContainerStateStatusEnum::CREATED);
    state.exits_on_wait.set(false);
    state.strategy.set(WaitStrategyKind::Poll);
    state.force_removed.set(false);
    state
}
