//! Recording collaborators that append every call to a shared [`CallLog`].
//!
//! Calls are recorded as `"<subsystem>.<operation>"`. Any call name passed
//! to [`CallLog::fail_on`] is still recorded but then returns an error.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::broadcast::BroadcastPacket;
use crate::context::SharedContext;
use crate::lifecycle::{ControlSignal, ShutdownFlag, SignalError, SignalInstaller, SignalSource};
use crate::subsystems::{
    DatabaseHandle, DatabaseSchema, PlayerBridge, RequestServer, SearchCache, SearchCacheProvider,
    ServerEndpoint, SubsystemError, SubsystemKind, Subsystems, Worker,
};

/// Ordered log of collaborator calls plus the set of calls that must fail.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl CallLog {
    /// Makes every future `call` return an error.
    pub fn fail_on(&self, call: &str) {
        self.failing
            .lock()
            .expect("call log mutex poisoned")
            .insert(call.to_owned());
    }

    /// Snapshot of the recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log mutex poisoned").clone()
    }

    /// Number of times `call` was recorded.
    #[must_use]
    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .iter()
            .filter(|recorded| recorded.as_str() == call)
            .count()
    }

    /// Records `call` and fails it when requested.
    pub fn invoke(&self, kind: SubsystemKind, call: &str) -> Result<(), SubsystemError> {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .push(call.to_owned());
        let fails = self
            .failing
            .lock()
            .expect("call log mutex poisoned")
            .contains(call);
        if fails {
            Err(SubsystemError::new(kind, format!("{call} failed on request")))
        } else {
            Ok(())
        }
    }
}

/// Database handle reporting a fixed schema.
#[derive(Debug, Clone, Copy)]
pub struct TestDatabase(pub DatabaseSchema);

impl DatabaseHandle for TestDatabase {
    fn schema(&self) -> DatabaseSchema {
        self.0
    }
}

/// Tracker or randomizer double.
#[derive(Debug)]
pub struct RecordingWorker {
    kind: SubsystemKind,
    log: CallLog,
}

impl RecordingWorker {
    #[must_use]
    pub fn new(kind: SubsystemKind, log: CallLog) -> Self {
        Self { kind, log }
    }
}

impl Worker for RecordingWorker {
    fn kind(&self) -> SubsystemKind {
        self.kind
    }

    fn start(&self, _context: &SharedContext) -> Result<(), SubsystemError> {
        self.log.invoke(self.kind, &format!("{}.start", self.kind))
    }

    fn stop(&self) -> Result<(), SubsystemError> {
        self.log.invoke(self.kind, &format!("{}.stop", self.kind))
    }
}

/// Media-player bridge double.
#[derive(Debug)]
pub struct RecordingBridge {
    log: CallLog,
}

impl RecordingBridge {
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl PlayerBridge for RecordingBridge {
    fn start(&self, _context: &SharedContext) -> Result<(), SubsystemError> {
        self.log.invoke(SubsystemKind::Bridge, "bridge.start")
    }

    fn resync(&self) -> Result<(), SubsystemError> {
        self.log.invoke(SubsystemKind::Bridge, "bridge.resync")
    }

    fn stop_observer(&self) -> Result<(), SubsystemError> {
        self.log.invoke(SubsystemKind::Bridge, "bridge.stop_observer")
    }
}

/// Search cache double.
#[derive(Debug)]
pub struct RecordingSearchCache {
    log: CallLog,
}

impl RecordingSearchCache {
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl SearchCache for RecordingSearchCache {
    fn refresh(&self) -> Result<(), SubsystemError> {
        self.log.invoke(SubsystemKind::SearchCache, "search.refresh")
    }
}

/// Factory handing out [`RecordingSearchCache`] instances.
#[derive(Debug)]
pub struct RecordingSearchProvider {
    log: CallLog,
}

impl RecordingSearchProvider {
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl SearchCacheProvider for RecordingSearchProvider {
    fn open(
        &self,
        _database: Arc<dyn DatabaseHandle>,
    ) -> Result<Arc<dyn SearchCache>, SubsystemError> {
        self.log.invoke(SubsystemKind::SearchCache, "search.open")?;
        Ok(Arc::new(RecordingSearchCache::new(self.log.clone())))
    }
}

type IterationHook = Box<dyn Fn() -> Result<(), SubsystemError> + Send + Sync>;

/// Request server double.
///
/// `handle_events` is counted rather than logged; hooks registered with
/// [`RecordingServer::on_iteration`] run on the matching call.
pub struct RecordingServer {
    log: CallLog,
    iterations: AtomicUsize,
    hooks: Mutex<HashMap<usize, IterationHook>>,
    endpoint: Mutex<Option<ServerEndpoint>>,
}

impl RecordingServer {
    #[must_use]
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            iterations: AtomicUsize::new(0),
            hooks: Mutex::new(HashMap::new()),
            endpoint: Mutex::new(None),
        }
    }

    /// Runs `hook` during the `iteration`-th call to `handle_events`
    /// (1-based).
    pub fn on_iteration(
        &self,
        iteration: usize,
        hook: impl Fn() -> Result<(), SubsystemError> + Send + Sync + 'static,
    ) {
        self.hooks
            .lock()
            .expect("server hooks mutex poisoned")
            .insert(iteration, Box::new(hook));
    }

    /// Number of `handle_events` calls so far.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations.load(Ordering::SeqCst)
    }

    /// Endpoint passed to `setup`, if it was called.
    #[must_use]
    pub fn endpoint(&self) -> Option<ServerEndpoint> {
        self.endpoint
            .lock()
            .expect("server endpoint mutex poisoned")
            .clone()
    }
}

impl RequestServer for RecordingServer {
    fn setup(&self, endpoint: &ServerEndpoint) -> Result<(), SubsystemError> {
        *self.endpoint.lock().expect("server endpoint mutex poisoned") = Some(endpoint.clone());
        self.log.invoke(SubsystemKind::RequestServer, "server.setup")
    }

    fn start(&self) -> Result<(), SubsystemError> {
        self.log.invoke(SubsystemKind::RequestServer, "server.start")
    }

    fn stop(&self) -> Result<(), SubsystemError> {
        self.log.invoke(SubsystemKind::RequestServer, "server.stop")
    }

    fn handle_events(&self) -> Result<(), SubsystemError> {
        let iteration = self.iterations.fetch_add(1, Ordering::SeqCst) + 1;
        let hooks = self.hooks.lock().expect("server hooks mutex poisoned");
        match hooks.get(&iteration) {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }

    fn close_all_connections(&self) -> Result<(), SubsystemError> {
        self.log
            .invoke(SubsystemKind::RequestServer, "server.close_all_connections")
    }

    fn broadcast(&self, _packet: &BroadcastPacket) -> Result<(), SubsystemError> {
        self.log.invoke(SubsystemKind::RequestServer, "server.broadcast")
    }
}

/// Builds a full subsystem set sharing `log`, returning the server too so
/// tests can script event iterations.
pub fn recording_subsystems(log: &CallLog) -> (Subsystems, Arc<RecordingServer>) {
    let server = Arc::new(RecordingServer::new(log.clone()));
    let subsystems = Subsystems {
        tracker: Arc::new(RecordingWorker::new(SubsystemKind::Tracker, log.clone())),
        randomizer: Arc::new(RecordingWorker::new(SubsystemKind::Randomizer, log.clone())),
        bridge: Arc::new(RecordingBridge::new(log.clone())),
        search: Arc::new(RecordingSearchProvider::new(log.clone())),
        server: server.clone(),
    };
    (subsystems, server)
}

/// Queue standing in for OS signal delivery.
#[derive(Debug, Clone, Default)]
pub struct SignalQueue {
    pending: Arc<Mutex<VecDeque<ControlSignal>>>,
}

impl SignalQueue {
    /// Delivers `signal` before the next drain.
    pub fn push(&self, signal: ControlSignal) {
        self.pending
            .lock()
            .expect("signal queue mutex poisoned")
            .push_back(signal);
    }
}

impl SignalSource for SignalQueue {
    fn pending(&mut self) -> Vec<ControlSignal> {
        self.pending
            .lock()
            .expect("signal queue mutex poisoned")
            .drain(..)
            .collect()
    }
}

/// Installer handing out a [`SignalQueue`].
#[derive(Debug, Clone)]
pub struct ScriptedSignalInstaller {
    queue: SignalQueue,
    log: CallLog,
}

impl ScriptedSignalInstaller {
    #[must_use]
    pub fn new(queue: SignalQueue, log: CallLog) -> Self {
        Self { queue, log }
    }
}

impl SignalInstaller for ScriptedSignalInstaller {
    fn install(&self, _flag: &ShutdownFlag) -> Result<Box<dyn SignalSource>, SignalError> {
        self.log
            .invoke(SubsystemKind::RequestServer, "signals.install")
            .map_err(|error| SignalError::Install {
                source: io::Error::other(error.to_string()),
            })?;
        Ok(Box::new(self.queue.clone()))
    }
}
