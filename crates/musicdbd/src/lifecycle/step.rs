//! Best-effort execution of refresh and teardown steps.
//!
//! A failing step is logged at warning severity and recorded in the
//! returned outcome. The caller always proceeds to the next step. Panics
//! raised by a collaborator are captured the same way so one misbehaving
//! subsystem cannot skip the rest of teardown.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::LIFECYCLE_TARGET;

/// Sequence a best-effort step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// USR1 cache refresh.
    Refresh,
    /// Shutdown sequencer.
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Refresh => "refresh",
            Self::Teardown => "teardown",
        };
        formatter.write_str(label)
    }
}

/// Result of one best-effort step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    step: &'static str,
    failure: Option<String>,
}

impl StepOutcome {
    /// Step name.
    #[must_use]
    pub fn step(&self) -> &'static str {
        self.step
    }

    /// Returns `true` when the step completed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Rendered failure, when the step failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

/// Ordered outcomes of a best-effort sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    phase: Phase,
    outcomes: Vec<StepOutcome>,
}

impl StepReport {
    pub(crate) fn new(phase: Phase) -> Self {
        Self {
            phase,
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, outcome: StepOutcome) {
        self.outcomes.push(outcome);
    }

    /// Phase the report covers.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Outcomes in execution order.
    #[must_use]
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Names of the executed steps in order.
    pub fn steps(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outcomes.iter().map(StepOutcome::step)
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> + '_ {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }

    /// Returns `true` when every step completed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(StepOutcome::succeeded)
    }
}

/// Runs `action` and converts any error or panic into a logged outcome.
pub(crate) fn best_effort<E, F>(phase: Phase, step: &'static str, action: F) -> StepOutcome
where
    E: std::error::Error,
    F: FnOnce() -> Result<(), E>,
{
    let failure = match panic::catch_unwind(AssertUnwindSafe(action)) {
        Ok(Ok(())) => None,
        Ok(Err(error)) => Some(error.to_string()),
        Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
    };

    match &failure {
        None => debug!(target: LIFECYCLE_TARGET, %phase, step, "step completed"),
        Some(message) => warn!(
            target: LIFECYCLE_TARGET,
            %phase,
            step,
            error = %message,
            "step failed; continuing"
        ),
    }

    StepOutcome { step, failure }
}

/// Renders a panic payload for logging.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
