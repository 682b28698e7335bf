//! Ordered, idempotent teardown.

use std::sync::Arc;

use tracing::{debug, info};

use super::LIFECYCLE_TARGET;
use super::state::{ServiceStateCell, ShutdownFlag, Termination};
use super::step::{Phase, StepOutcome, StepReport, best_effort};
use crate::context::SharedContext;
use crate::health::HealthReporter;
use crate::subsystems::{PlayerBridge, Worker};

/// Result of the single teardown run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    termination: Termination,
    steps: StepReport,
}

impl ShutdownReport {
    /// How the process should exit.
    #[must_use]
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Outcomes of the teardown steps in order.
    #[must_use]
    pub fn steps(&self) -> &StepReport {
        &self.steps
    }
}

/// Stops every subsystem in reverse dependency order.
///
/// The first caller of [`ShutdownSequencer::shutdown`] performs teardown;
/// every later or concurrent caller gets `None` without touching anything.
pub struct ShutdownSequencer {
    state: ServiceStateCell,
    flag: ShutdownFlag,
    tracker: Arc<dyn Worker>,
    randomizer: Arc<dyn Worker>,
    bridge: Arc<dyn PlayerBridge>,
    reporter: Arc<dyn HealthReporter>,
}

impl ShutdownSequencer {
    /// Builds a sequencer sharing the service state and shutdown flag.
    #[must_use]
    pub fn new(
        state: ServiceStateCell,
        flag: ShutdownFlag,
        tracker: Arc<dyn Worker>,
        randomizer: Arc<dyn Worker>,
        bridge: Arc<dyn PlayerBridge>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            state,
            flag,
            tracker,
            randomizer,
            bridge,
            reporter,
        }
    }

    /// Runs teardown once.
    ///
    /// `context` is `None` when initialisation failed before the shared
    /// context existed; server steps are skipped unless a started server is
    /// attached to it.
    pub fn shutdown(&self, context: Option<&SharedContext>) -> Option<ShutdownReport> {
        if !self.state.begin_shutdown() {
            debug!(target: LIFECYCLE_TARGET, "shutdown already in progress; ignoring");
            return None;
        }

        let termination = Termination::from_flag(self.flag.is_requested());
        info!(target: LIFECYCLE_TARGET, %termination, "shutting down");
        self.reporter.shutdown_starting(termination);

        let server = context.and_then(SharedContext::server);
        let mut steps = StepReport::new(Phase::Teardown);

        if let Some(server) = server {
            steps.push(best_effort(Phase::Teardown, "close_connections", || {
                server.close_all_connections()
            }));
        }
        steps.push(stop_worker(self.randomizer.as_ref(), "stop_randomizer"));
        steps.push(stop_worker(self.tracker.as_ref(), "stop_tracker"));
        steps.push(best_effort(Phase::Teardown, "stop_bridge_observer", || {
            self.bridge.stop_observer()
        }));
        if let Some(server) = server {
            steps.push(best_effort(Phase::Teardown, "stop_server", || server.stop()));
        }

        self.state.finish_shutdown();
        let report = ShutdownReport { termination, steps };
        self.reporter.shutdown_completed(&report);
        Some(report)
    }
}

fn stop_worker(worker: &dyn Worker, step: &'static str) -> StepOutcome {
    debug!(target: LIFECYCLE_TARGET, worker = %worker.kind(), "stopping worker");
    best_effort(Phase::Teardown, step, || worker.stop())
}
