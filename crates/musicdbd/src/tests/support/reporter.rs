//! Test double for [`HealthReporter`] that records lifecycle events.

use std::sync::Mutex;

use musicdb_config::Config;

use crate::health::HealthReporter;
use crate::lifecycle::{InitStep, InitializeError, ShutdownReport, StepReport, Termination};
use crate::subsystems::ServerEndpoint;

/// Health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    InitializeStarting,
    InitializeStep(InitStep),
    InitializeSucceeded,
    InitializeFailed(String),
    ServerStarted(String),
    RefreshCompleted { failures: usize },
    ShutdownStarting(Termination),
    ShutdownCompleted(Termination),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Initialisation steps reported so far, in order.
    #[must_use]
    pub fn init_steps(&self) -> Vec<InitStep> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::InitializeStep(step) => Some(step),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn initialize_starting(&self) {
        self.record(HealthEvent::InitializeStarting);
    }

    fn initialize_step(&self, step: InitStep) {
        self.record(HealthEvent::InitializeStep(step));
    }

    fn initialize_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::InitializeSucceeded);
    }

    fn initialize_failed(&self, error: &InitializeError) {
        self.record(HealthEvent::InitializeFailed(error.to_string()));
    }

    fn server_started(&self, endpoint: &ServerEndpoint) {
        self.record(HealthEvent::ServerStarted(endpoint.to_string()));
    }

    fn refresh_completed(&self, report: &StepReport) {
        self.record(HealthEvent::RefreshCompleted {
            failures: report.failures().count(),
        });
    }

    fn shutdown_starting(&self, termination: Termination) {
        self.record(HealthEvent::ShutdownStarting(termination));
    }

    fn shutdown_completed(&self, report: &ShutdownReport) {
        self.record(HealthEvent::ShutdownCompleted(report.termination()));
    }
}
