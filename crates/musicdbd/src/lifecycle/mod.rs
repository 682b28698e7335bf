//! Service lifecycle: ordered start-up, the event loop, signal handling and
//! idempotent teardown.
//!
//! [`LifecycleManager`] owns the service state, the shutdown flag and the
//! shared context. Every exit path (requested, interrupted, failed) funnels
//! into exactly one [`ShutdownSequencer`] run and comes back to the caller as
//! a [`Termination`]; the process exits only from `main`.

mod errors;
mod refresh;
mod sequencer;
mod signals;
mod state;
mod step;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use musicdb_config::Config;

use crate::context::SharedContext;
use crate::health::HealthReporter;
use crate::persisted_state::PersistedState;
use crate::subsystems::{
    DatabaseHandle, DatabaseSchema, RequestServer, ServerEndpoint, SubsystemError, Subsystems,
    Worker,
};

pub use self::errors::{EventLoopError, InitializeError, ServerStartError};
pub use self::refresh::CacheRefreshCoordinator;
pub use self::sequencer::{ShutdownReport, ShutdownSequencer};
pub use self::signals::{
    ControlSignal, Dispatch, SignalDispatcher, SignalError, SignalInstaller, SignalSource,
    SystemSignalInstaller,
};
pub use self::state::{ServiceState, ServiceStateCell, ShutdownFlag, Termination};
pub use self::step::{Phase, StepOutcome, StepReport};

pub(crate) const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Pause between event-loop iterations.
pub const EVENT_LOOP_INTERVAL: Duration = Duration::from_millis(100);

/// Ordered initialisation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    /// Keep configuration and database handle.
    StoreConfiguration,
    /// Seed the process random generator.
    SeedRandom,
    /// Load persisted runtime state.
    LoadState,
    /// Construct the search cache.
    OpenSearchCache,
    /// Start the playback history worker.
    StartTracker,
    /// Start the media-player bridge.
    StartBridge,
    /// Populate the search cache.
    WarmSearchCache,
    /// Start the recommendation worker.
    StartRandomizer,
    /// Install OS signal handlers.
    InstallSignals,
}

impl fmt::Display for InitStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StoreConfiguration => "store_configuration",
            Self::SeedRandom => "seed_random",
            Self::LoadState => "load_state",
            Self::OpenSearchCache => "open_search_cache",
            Self::StartTracker => "start_tracker",
            Self::StartBridge => "start_bridge",
            Self::WarmSearchCache => "warm_search_cache",
            Self::StartRandomizer => "start_randomizer",
            Self::InstallSignals => "install_signals",
        };
        formatter.write_str(label)
    }
}

/// Coordinates the service from initialisation to termination.
pub struct LifecycleManager {
    subsystems: Subsystems,
    installer: Arc<dyn SignalInstaller>,
    reporter: Arc<dyn HealthReporter>,
    state: ServiceStateCell,
    flag: ShutdownFlag,
    sequencer: ShutdownSequencer,
    dispatcher: SignalDispatcher,
    context: Option<SharedContext>,
    signals: Option<Box<dyn SignalSource>>,
    interval: Duration,
}

impl LifecycleManager {
    /// Wires the lifecycle around the given collaborators.
    #[must_use]
    pub fn new(
        subsystems: Subsystems,
        installer: Arc<dyn SignalInstaller>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        let state = ServiceStateCell::new();
        let flag = ShutdownFlag::new();
        let sequencer = ShutdownSequencer::new(
            state.clone(),
            flag.clone(),
            Arc::clone(&subsystems.tracker),
            Arc::clone(&subsystems.randomizer),
            Arc::clone(&subsystems.bridge),
            Arc::clone(&reporter),
        );
        let refresh =
            CacheRefreshCoordinator::new(Arc::clone(&subsystems.bridge), Arc::clone(&reporter));
        let dispatcher = SignalDispatcher::new(flag.clone(), refresh);
        Self {
            subsystems,
            installer,
            reporter,
            state,
            flag,
            sequencer,
            dispatcher,
            context: None,
            signals: None,
            interval: EVENT_LOOP_INTERVAL,
        }
    }

    /// Overrides the pause between loop iterations.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current service state.
    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.state.current()
    }

    /// Handle to the shutdown flag.
    #[must_use]
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.flag.clone()
    }

    /// Shared context, once initialisation built it.
    #[must_use]
    pub fn context(&self) -> Option<&SharedContext> {
        self.context.as_ref()
    }

    /// Brings the service up.
    ///
    /// Steps run strictly in order and the first failure aborts the rest.
    /// On error the caller must still invoke [`Self::terminate`].
    pub fn initialize(
        &mut self,
        config: Config,
        database: Arc<dyn DatabaseHandle>,
    ) -> Result<(), InitializeError> {
        self.reporter.initialize_starting();
        let result = self.run_initialize(config, database);
        if let Err(error) = &result {
            self.reporter.initialize_failed(error);
        }
        result
    }

    fn run_initialize(
        &mut self,
        config: Config,
        database: Arc<dyn DatabaseHandle>,
    ) -> Result<(), InitializeError> {
        let found = database.schema();
        if found != DatabaseSchema::Music {
            return Err(InitializeError::WrongDatabase {
                expected: DatabaseSchema::Music,
                found,
            });
        }
        self.state
            .transition(ServiceState::Uninitialized, ServiceState::Initializing)
            .map_err(|state| InitializeError::AlreadyInitialized { state })?;

        self.reporter.initialize_step(InitStep::StoreConfiguration);
        self.reporter.initialize_step(InitStep::SeedRandom);
        let rng_seed = rand::random::<u64>();
        self.reporter.initialize_step(InitStep::LoadState);
        let state = PersistedState::load(config.state_file(), Arc::clone(&database))?;
        self.reporter.initialize_step(InitStep::OpenSearchCache);
        let search = self.subsystems.search.open(Arc::clone(&database))?;
        let context = self
            .context
            .insert(SharedContext::new(config, database, rng_seed, state, search));

        self.reporter.initialize_step(InitStep::StartTracker);
        start_worker(self.subsystems.tracker.as_ref(), context)?;
        self.reporter.initialize_step(InitStep::StartBridge);
        self.subsystems.bridge.start(context)?;
        self.reporter.initialize_step(InitStep::WarmSearchCache);
        context
            .search_cache()
            .refresh()
            .map_err(|source| InitializeError::CacheWarmup { source })?;
        self.reporter.initialize_step(InitStep::StartRandomizer);
        start_worker(self.subsystems.randomizer.as_ref(), context)?;
        self.reporter.initialize_step(InitStep::InstallSignals);
        self.signals = Some(self.installer.install(&self.flag)?);

        self.state
            .transition(ServiceState::Initializing, ServiceState::Running)
            .map_err(|state| InitializeError::Interrupted { state })?;
        self.reporter.initialize_succeeded(context.config());
        Ok(())
    }

    /// Sets up and starts the request server.
    ///
    /// The server is attached to the shared context only when both steps
    /// succeed, so teardown never touches a server that did not come up.
    pub fn start_server(&self) -> Result<(), ServerStartError> {
        let state = self.state.current();
        let Some(context) = self
            .context
            .as_ref()
            .filter(|_| state == ServiceState::Running)
        else {
            return Err(ServerStartError::NotRunning { state });
        };
        if context.server().is_some() {
            return Err(ServerStartError::AlreadyStarted);
        }

        let config = context.config();
        if !config.tls_configured() {
            warn!(
                target: LIFECYCLE_TARGET,
                cert = %config.tls_cert(),
                key = %config.tls_key(),
                "TLS certificate or key not configured; clients will reject the connection"
            );
        }

        let endpoint = ServerEndpoint::from_config(config);
        let server = Arc::clone(&self.subsystems.server);
        server
            .setup(&endpoint)
            .map_err(|source| ServerStartError::Setup { source })
            .and_then(|()| server.start().map_err(|source| ServerStartError::Start { source }))
            .inspect_err(|error| {
                error!(
                    target: LIFECYCLE_TARGET,
                    endpoint = %endpoint,
                    error = %error,
                    "failed to start request server"
                );
            })?;

        context.attach_server(server);
        self.reporter.server_started(&endpoint);
        Ok(())
    }

    /// Runs the event loop until shutdown and returns how it ended.
    ///
    /// Each iteration pumps one batch of server events, checks the shutdown
    /// flag, sleeps, then drains and dispatches pending control signals.
    pub fn run(&mut self) -> Termination {
        let Some(server) = self
            .context
            .as_ref()
            .and_then(SharedContext::server)
            .map(Arc::clone)
        else {
            error!(
                target: LIFECYCLE_TARGET,
                "request server not running; refusing to enter the event loop"
            );
            return self.terminate();
        };

        info!(target: LIFECYCLE_TARGET, "setup complete; entering event loop");
        loop {
            if let Err(failure) = pump_events(server.as_ref()) {
                error!(
                    target: LIFECYCLE_TARGET,
                    error = %failure,
                    details = ?failure,
                    "unhandled error in event loop; forcing shutdown"
                );
                return self.terminate();
            }

            if self.flag.is_requested() {
                return self.terminate();
            }

            thread::sleep(self.interval);

            let pending = self
                .signals
                .as_mut()
                .map(|source| source.pending())
                .unwrap_or_default();
            for signal in pending {
                if let Some(context) = self.context.as_ref()
                    && self.dispatcher.dispatch(signal, context) == Dispatch::Interrupt
                {
                    warn!(target: LIFECYCLE_TARGET, "user interrupt received; shutting down");
                    self.flag.request();
                    return self.terminate();
                }
            }
        }
    }

    /// Runs the shutdown sequencer. Returns `None` when teardown already ran.
    pub fn shutdown(&self) -> Option<ShutdownReport> {
        self.sequencer.shutdown(self.context.as_ref())
    }

    /// Runs the shutdown sequencer and reports how the process should exit.
    pub fn terminate(&self) -> Termination {
        self.shutdown().map_or_else(
            || Termination::from_flag(self.flag.is_requested()),
            |report| report.termination(),
        )
    }
}

fn start_worker(worker: &dyn Worker, context: &SharedContext) -> Result<(), SubsystemError> {
    info!(target: LIFECYCLE_TARGET, worker = %worker.kind(), "starting worker");
    worker.start(context)
}

fn pump_events(server: &dyn RequestServer) -> Result<(), EventLoopError> {
    match panic::catch_unwind(AssertUnwindSafe(|| server.handle_events())) {
        Ok(result) => result.map_err(|source| EventLoopError::Events { source }),
        Err(payload) => Err(EventLoopError::Panicked {
            message: step::panic_message(payload.as_ref()),
        }),
    }
}
