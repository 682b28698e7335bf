//! Service state machine, shutdown flag, and termination kinds.

use std::fmt;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Lifecycle phase of the service. Ordering follows the lifecycle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    /// Nothing has been started.
    Uninitialized = 0,
    /// `initialize` is running its steps.
    Initializing = 1,
    /// Subsystems are up; the event loop may run.
    Running = 2,
    /// The shutdown sequencer has been entered.
    ShuttingDown = 3,
    /// Teardown finished.
    Terminated = 4,
}

impl ServiceState {
    /// Lowercase label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Terminated => "terminated",
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            2 => Self::Running,
            3 => Self::ShuttingDown,
            _ => Self::Terminated,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Shared atomic cell holding the [`ServiceState`].
///
/// Only forward transitions are accepted.
#[derive(Debug, Clone)]
pub struct ServiceStateCell {
    inner: Arc<AtomicU8>,
}

impl Default for ServiceStateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceStateCell {
    /// Creates a cell in [`ServiceState::Uninitialized`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(ServiceState::Uninitialized as u8)),
        }
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> ServiceState {
        ServiceState::from_raw(self.inner.load(Ordering::SeqCst))
    }

    /// Moves from `from` to `to` if the cell still holds `from`.
    ///
    /// Returns the observed state on failure. Backward or self transitions
    /// are always rejected.
    pub fn transition(&self, from: ServiceState, to: ServiceState) -> Result<(), ServiceState> {
        if to <= from {
            return Err(self.current());
        }
        self.inner
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(ServiceState::from_raw)
    }

    /// Enters [`ServiceState::ShuttingDown`] from any earlier state.
    ///
    /// Exactly one caller observes `true`.
    pub fn begin_shutdown(&self) -> bool {
        self.inner
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |raw| {
                (raw < ServiceState::ShuttingDown as u8).then_some(ServiceState::ShuttingDown as u8)
            })
            .is_ok()
    }

    /// Marks teardown as finished.
    pub(crate) fn finish_shutdown(&self) {
        self.inner
            .store(ServiceState::Terminated as u8, Ordering::SeqCst);
    }
}

/// Process-wide "shutdown was requested" flag.
///
/// The TERM handler flips it from signal context; everything else only reads
/// it or sets it from the main thread.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Creates a cleared flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that an orderly shutdown was requested.
    pub fn request(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once a shutdown was requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Raw atomic for registration with the OS signal machinery.
    pub(crate) fn as_atomic(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.inner)
    }
}

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Shutdown was requested (TERM or user interrupt). Exit code 0.
    Clean,
    /// Shutdown was forced by an error. Exit code 1.
    Forced,
}

impl Termination {
    /// Maps the shutdown flag to a termination kind.
    #[must_use]
    pub fn from_flag(requested: bool) -> Self {
        if requested { Self::Clean } else { Self::Forced }
    }

    /// Numeric process exit status.
    #[must_use]
    pub fn exit_status(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Forced => 1,
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clean => "clean",
            Self::Forced => "forced",
        };
        formatter.write_str(label)
    }
}

impl From<Termination> for ExitCode {
    fn from(termination: Termination) -> Self {
        Self::from(termination.exit_status())
    }
}
