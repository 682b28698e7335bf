//! Launch sequencing around the service lifecycle.

use std::env;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use tracing::{error, info, warn};

use musicdb_config::{Config, RuntimePaths};

use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::lifecycle::{LifecycleManager, SignalInstaller, SystemSignalInstaller, Termination};
use crate::placeholder;
use crate::subsystems::{DatabaseHandle, Subsystems};
use crate::telemetry;

use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::LaunchError;
use super::guard::{HealthState, ProcessGuard};
use super::{FOREGROUND_ENV_VAR, PROCESS_TARGET};

/// Launch mode for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fork into the background and detach from the controlling terminal.
    Background,
    /// Remain attached to the terminal; used for debugging and tests.
    Foreground,
}

impl LaunchMode {
    fn detect() -> Self {
        if env::var_os(FOREGROUND_ENV_VAR).is_some() {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// Abstraction over configuration loading.
pub trait ConfigLoader: Send + Sync {
    /// Loads the service configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Process-level collaborators.
pub(crate) struct ProcessControl<D> {
    pub(crate) mode: LaunchMode,
    pub(crate) daemonizer: D,
}

/// Service collaborators handed to the lifecycle.
pub(crate) struct ServiceDeps<L> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) subsystems: Subsystems,
    pub(crate) signals: Arc<dyn SignalInstaller>,
    pub(crate) database: Arc<dyn DatabaseHandle>,
}

/// Everything needed to launch the service.
pub(crate) struct LaunchPlan<L, D> {
    pub(crate) process: ProcessControl<D>,
    pub(crate) services: ServiceDeps<L>,
}

/// Runs the service with the production collaborators.
pub fn run_daemon() -> Result<Termination, LaunchError> {
    let plan = LaunchPlan {
        process: ProcessControl {
            mode: LaunchMode::detect(),
            daemonizer: SystemDaemonizer::new(),
        },
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            subsystems: placeholder::subsystems(),
            signals: Arc::new(SystemSignalInstaller),
            database: Arc::new(placeholder::PlaceholderDatabase),
        },
    };
    run_daemon_with(plan)
}

/// Runs the service with injected collaborators.
///
/// Errors are only returned for failures that happen before a lifecycle
/// exists. Once the lifecycle is built, every failure is routed through the
/// shutdown sequencer and reported as [`Termination::Forced`].
pub(crate) fn run_daemon_with<L, D>(plan: LaunchPlan<L, D>) -> Result<Termination, LaunchError>
where
    L: ConfigLoader,
    D: Daemonizer,
{
    let LaunchPlan { process, services } = plan;
    let ProcessControl { mode, daemonizer } = process;
    let ServiceDeps {
        loader,
        reporter,
        subsystems,
        signals,
        database,
    } = services;

    let config = loader.load()?;
    telemetry::initialise(&config)?;
    info!(target: PROCESS_TARGET, ?mode, "starting musicdb");

    let runtime_paths = RuntimePaths::from_config(&config)?;
    let mut guard = ProcessGuard::acquire(runtime_paths)?;
    if mode == LaunchMode::Background {
        daemonizer.daemonize(guard.paths())?;
    }
    guard.write_pid(std::process::id())?;
    guard.write_health(HealthState::Starting)?;

    let mut lifecycle = LifecycleManager::new(subsystems, signals, reporter);
    let termination = match bring_up(&mut lifecycle, &guard, config, database) {
        Ok(()) => lifecycle.run(),
        Err(BringUpError::Launch(launch_error)) => {
            lifecycle.terminate();
            return Err(launch_error);
        }
        Err(BringUpError::Lifecycle) => lifecycle.terminate(),
    };

    if let Err(health_error) = guard.write_health(HealthState::Stopping) {
        warn!(
            target: PROCESS_TARGET,
            error = %health_error,
            "failed to publish stopping health state"
        );
    }
    info!(target: PROCESS_TARGET, %termination, "musicdb stopped");
    Ok(termination)
}

enum BringUpError {
    Lifecycle,
    Launch(LaunchError),
}

fn bring_up(
    lifecycle: &mut LifecycleManager,
    guard: &ProcessGuard,
    config: Config,
    database: Arc<dyn DatabaseHandle>,
) -> Result<(), BringUpError> {
    if let Err(init_error) = lifecycle.initialize(config, database) {
        error!(
            target: PROCESS_TARGET,
            error = %init_error,
            "initialization failed; shutting down"
        );
        return Err(BringUpError::Lifecycle);
    }
    if let Err(server_error) = lifecycle.start_server() {
        error!(
            target: PROCESS_TARGET,
            error = %server_error,
            "request server failed to start; shutting down"
        );
        return Err(BringUpError::Lifecycle);
    }
    guard
        .write_health(HealthState::Ready)
        .map_err(BringUpError::Launch)
}
