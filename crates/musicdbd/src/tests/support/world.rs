//! BDD world wiring a [`LifecycleManager`] to recording collaborators.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use musicdb_config::Config;

use crate::lifecycle::{
    ControlSignal, InitializeError, LifecycleManager, ServerStartError, Termination,
};
use crate::subsystems::{DatabaseSchema, SubsystemError, SubsystemKind};

use super::config::test_config;
use super::reporter::RecordingHealthReporter;
use super::subsystems::{
    CallLog, RecordingServer, ScriptedSignalInstaller, SignalQueue, TestDatabase,
    recording_subsystems,
};

const TEST_LOOP_INTERVAL: Duration = Duration::from_millis(1);

/// Calls the shutdown sequencer makes, in the order it makes them.
const TEARDOWN_CALLS: [&str; 5] = [
    "server.close_all_connections",
    "randomizer.stop",
    "tracker.stop",
    "bridge.stop_observer",
    "server.stop",
];

/// Scenario world shared across lifecycle steps.
pub struct LifecycleWorld {
    _dir: TempDir,
    config: Config,
    schema: DatabaseSchema,
    pub log: CallLog,
    pub signals: SignalQueue,
    pub server: Arc<RecordingServer>,
    pub reporter: Arc<RecordingHealthReporter>,
    lifecycle: LifecycleManager,
    init_result: Option<Result<(), InitializeError>>,
    server_result: Option<Result<(), ServerStartError>>,
    termination: Option<Termination>,
}

impl LifecycleWorld {
    /// Builds a world whose collaborators all succeed.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let config = test_config(&dir);
        let log = CallLog::default();
        let signals = SignalQueue::default();
        let reporter = Arc::new(RecordingHealthReporter::default());
        let (subsystems, server) = recording_subsystems(&log);
        let installer = Arc::new(ScriptedSignalInstaller::new(signals.clone(), log.clone()));
        let lifecycle = LifecycleManager::new(subsystems, installer, reporter.clone())
            .with_interval(TEST_LOOP_INTERVAL);
        Self {
            _dir: dir,
            config,
            schema: DatabaseSchema::Music,
            log,
            signals,
            server,
            reporter,
            lifecycle,
            init_result: None,
            server_result: None,
            termination: None,
        }
    }

    /// Hands `initialize` a handle to a different database.
    pub fn use_schema(&mut self, schema: DatabaseSchema) {
        self.schema = schema;
    }

    /// Runs `initialize` once.
    pub fn initialize(&mut self) {
        if self.init_result.is_some() {
            return;
        }
        let result = self
            .lifecycle
            .initialize(self.config.clone(), Arc::new(TestDatabase(self.schema)));
        self.init_result = Some(result);
    }

    /// Runs `start_server` once.
    pub fn start_server(&mut self) {
        if self.server_result.is_none() {
            self.server_result = Some(self.lifecycle.start_server());
        }
    }

    /// Delivers `signal` during the given event iteration.
    pub fn signal_during(&self, iteration: usize, signal: ControlSignal) {
        let queue = self.signals.clone();
        self.server.on_iteration(iteration, move || {
            queue.push(signal);
            Ok(())
        });
    }

    /// Makes event processing fail during the given iteration.
    pub fn fail_during(&self, iteration: usize) {
        self.server.on_iteration(iteration, || {
            Err(SubsystemError::new(
                SubsystemKind::RequestServer,
                "socket closed unexpectedly",
            ))
        });
    }

    /// Makes event processing panic during the given iteration.
    pub fn panic_during(&self, iteration: usize) {
        self.server
            .on_iteration(iteration, || panic!("event handler crashed"));
    }

    /// Enters the event loop.
    pub fn run(&mut self) {
        self.termination = Some(self.lifecycle.run());
    }

    /// Invokes the shutdown path directly, as a failed start-up would.
    pub fn terminate(&mut self) {
        self.termination = Some(self.lifecycle.terminate());
    }

    /// Runs the sequencer again and reports whether it did anything.
    pub fn shutdown_again(&self) -> bool {
        self.lifecycle.shutdown().is_some()
    }

    #[must_use]
    pub fn init_result(&self) -> Option<&Result<(), InitializeError>> {
        self.init_result.as_ref()
    }

    #[must_use]
    pub fn server_result(&self) -> Option<&Result<(), ServerStartError>> {
        self.server_result.as_ref()
    }

    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Teardown calls recorded so far, in order.
    #[must_use]
    pub fn teardown_calls(&self) -> Vec<String> {
        self.log
            .calls()
            .into_iter()
            .filter(|call| TEARDOWN_CALLS.contains(&call.as_str()))
            .collect()
    }

    /// Start-up calls recorded so far, in order.
    #[must_use]
    pub fn startup_calls(&self) -> Vec<String> {
        self.log
            .calls()
            .into_iter()
            .filter(|call| {
                call.ends_with(".start") || call.ends_with(".open") || call.ends_with(".install")
            })
            .collect()
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture constructing a fresh world.
#[must_use]
pub fn world() -> RefCell<LifecycleWorld> {
    RefCell::new(LifecycleWorld::new())
}
