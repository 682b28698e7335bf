//! Structured health reporting for service lifecycle events.

use std::sync::Arc;

use musicdb_config::Config;

use crate::lifecycle::{InitStep, InitializeError, ShutdownReport, StepReport, Termination};
use crate::subsystems::ServerEndpoint;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle milestones to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before the first initialisation step.
    fn initialize_starting(&self);

    /// Invoked as each initialisation step begins.
    fn initialize_step(&self, step: InitStep);

    /// Invoked after every initialisation step completed.
    fn initialize_succeeded(&self, config: &Config);

    /// Invoked when initialisation fails.
    fn initialize_failed(&self, error: &InitializeError);

    /// Invoked once the request server accepts connections.
    fn server_started(&self, endpoint: &ServerEndpoint);

    /// Invoked after a USR1 refresh ran all its steps.
    fn refresh_completed(&self, report: &StepReport);

    /// Invoked when the shutdown sequencer is entered.
    fn shutdown_starting(&self, termination: Termination);

    /// Invoked after the last teardown step.
    fn shutdown_completed(&self, report: &ShutdownReport);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn initialize_starting(&self) {
        (**self).initialize_starting();
    }

    fn initialize_step(&self, step: InitStep) {
        (**self).initialize_step(step);
    }

    fn initialize_succeeded(&self, config: &Config) {
        (**self).initialize_succeeded(config);
    }

    fn initialize_failed(&self, error: &InitializeError) {
        (**self).initialize_failed(error);
    }

    fn server_started(&self, endpoint: &ServerEndpoint) {
        (**self).server_started(endpoint);
    }

    fn refresh_completed(&self, report: &StepReport) {
        (**self).refresh_completed(report);
    }

    fn shutdown_starting(&self, termination: Termination) {
        (**self).shutdown_starting(termination);
    }

    fn shutdown_completed(&self, report: &ShutdownReport) {
        (**self).shutdown_completed(report);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn initialize_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "initialize_starting",
            "initializing service"
        );
    }

    fn initialize_step(&self, step: InitStep) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "initialize_step",
            step = %step,
            "running initialization step"
        );
    }

    fn initialize_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "initialize_succeeded",
            state_file = %config.state_file(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "service initialized"
        );
    }

    fn initialize_failed(&self, error: &InitializeError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "initialize_failed",
            error = %error,
            details = ?error,
            "service initialization failed"
        );
    }

    fn server_started(&self, endpoint: &ServerEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_started",
            endpoint = %endpoint,
            "request server accepting connections"
        );
    }

    fn refresh_completed(&self, report: &StepReport) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "refresh_completed",
            steps = report.outcomes().len(),
            failures = report.failures().count(),
            "cache refresh finished"
        );
    }

    fn shutdown_starting(&self, termination: Termination) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_starting",
            termination = %termination,
            "shutting down service"
        );
    }

    fn shutdown_completed(&self, report: &ShutdownReport) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_completed",
            termination = %report.termination(),
            failures = report.steps().failures().count(),
            "service shut down"
        );
    }
}
