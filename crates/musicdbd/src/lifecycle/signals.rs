//! OS control signals and their dispatch on the main thread.
//!
//! Signal context only records what arrived. TERM additionally flips the
//! shutdown flag directly through `signal_hook::flag`. All actual work runs
//! when the event loop drains the pending signals.

use std::io;

use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{info, warn};

use super::LIFECYCLE_TARGET;
use super::refresh::CacheRefreshCoordinator;
use super::state::ShutdownFlag;
use crate::context::SharedContext;

/// Control signals understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// USR1: refresh caches.
    Refresh,
    /// TERM: request an orderly shutdown.
    Terminate,
    /// INT: user interrupt.
    Interrupt,
    /// Anything else; logged and ignored.
    Other(i32),
}

impl ControlSignal {
    /// Classifies a raw signal number.
    #[must_use]
    pub fn from_raw(signal: i32) -> Self {
        match signal {
            SIGUSR1 => Self::Refresh,
            SIGTERM => Self::Terminate,
            SIGINT => Self::Interrupt,
            other => Self::Other(other),
        }
    }
}

/// Errors reported while installing signal handlers.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Non-blocking queue of signals received since the last drain.
pub trait SignalSource: Send {
    /// Returns every signal received since the previous call.
    fn pending(&mut self) -> Vec<ControlSignal>;
}

/// Installs handlers and hands back the matching [`SignalSource`].
pub trait SignalInstaller: Send + Sync {
    /// Registers handlers for USR1, TERM and INT.
    fn install(&self, flag: &ShutdownFlag) -> Result<Box<dyn SignalSource>, SignalError>;
}

/// Installer backed by `signal-hook`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSignalInstaller;

impl SignalInstaller for SystemSignalInstaller {
    fn install(&self, flag: &ShutdownFlag) -> Result<Box<dyn SignalSource>, SignalError> {
        signal_hook::flag::register(SIGTERM, flag.as_atomic())
            .map_err(|source| SignalError::Install { source })?;
        let signals = Signals::new([SIGUSR1, SIGTERM, SIGINT])
            .map_err(|source| SignalError::Install { source })?;
        info!(target: LIFECYCLE_TARGET, "signal handlers installed");
        Ok(Box::new(SystemSignals { signals }))
    }
}

struct SystemSignals {
    signals: Signals,
}

impl SignalSource for SystemSignals {
    fn pending(&mut self) -> Vec<ControlSignal> {
        self.signals.pending().map(ControlSignal::from_raw).collect()
    }
}

/// What the event loop must do after a signal was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Keep looping.
    Continue,
    /// A user interrupt arrived; shut down cleanly now.
    Interrupt,
}

/// Routes control signals to their handlers.
pub struct SignalDispatcher {
    flag: ShutdownFlag,
    refresh: CacheRefreshCoordinator,
}

impl SignalDispatcher {
    /// Builds a dispatcher over the shutdown flag and refresh coordinator.
    #[must_use]
    pub fn new(flag: ShutdownFlag, refresh: CacheRefreshCoordinator) -> Self {
        Self { flag, refresh }
    }

    /// Handles one signal. TERM only sets the flag; teardown happens on the
    /// next loop iteration.
    pub fn dispatch(&self, signal: ControlSignal, context: &SharedContext) -> Dispatch {
        match signal {
            ControlSignal::Refresh => {
                info!(target: LIFECYCLE_TARGET, "refresh signal received");
                self.refresh.refresh(context);
                Dispatch::Continue
            }
            ControlSignal::Terminate => {
                info!(target: LIFECYCLE_TARGET, "termination signal received; shutdown requested");
                self.flag.request();
                Dispatch::Continue
            }
            ControlSignal::Interrupt => Dispatch::Interrupt,
            ControlSignal::Other(signal) => {
                warn!(target: LIFECYCLE_TARGET, signal, "ignoring unexpected signal");
                Dispatch::Continue
            }
        }
    }
}

impl std::fmt::Debug for SignalDispatcher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SignalDispatcher")
            .field("flag", &self.flag)
            .finish_non_exhaustive()
    }
}
