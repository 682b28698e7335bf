use thiserror::Error;

use super::signals::SignalError;
use super::state::ServiceState;
use crate::persisted_state::StateError;
use crate::subsystems::{DatabaseSchema, SubsystemError};

/// Errors raised by [`super::LifecycleManager::initialize`].
///
/// The caller must still run the shutdown sequencer after any of these.
#[derive(Debug, Error)]
pub enum InitializeError {
    /// `initialize` already ran or the service moved past it.
    #[error("service cannot be initialized while {state}")]
    AlreadyInitialized {
        /// State observed when the call was rejected.
        state: ServiceState,
    },
    /// The supplied handle is not connected to the music database.
    #[error("expected a {expected} database handle, got {found}")]
    WrongDatabase {
        /// Schema the service requires.
        expected: DatabaseSchema,
        /// Schema the handle reported.
        found: DatabaseSchema,
    },
    /// Persisted state could not be loaded.
    #[error("failed to load persisted state: {source}")]
    State {
        /// Underlying state error.
        #[source]
        source: StateError,
    },
    /// A subsystem could not be constructed or started.
    #[error("subsystem startup failed: {source}")]
    Subsystem {
        /// Error reported by the subsystem.
        #[source]
        source: SubsystemError,
    },
    /// The synchronous search cache warm-up failed.
    #[error("initial search cache refresh failed: {source}")]
    CacheWarmup {
        /// Error reported by the cache.
        #[source]
        source: SubsystemError,
    },
    /// Signal handlers could not be installed.
    #[error(transparent)]
    Signals(#[from] SignalError),
    /// Shutdown began while initialisation was still running.
    #[error("initialization interrupted: service is {state}")]
    Interrupted {
        /// State observed at the end of initialisation.
        state: ServiceState,
    },
}

impl From<StateError> for InitializeError {
    fn from(source: StateError) -> Self {
        Self::State { source }
    }
}

impl From<SubsystemError> for InitializeError {
    fn from(source: SubsystemError) -> Self {
        Self::Subsystem { source }
    }
}

/// Errors raised by [`super::LifecycleManager::start_server`].
#[derive(Debug, Error)]
pub enum ServerStartError {
    /// `initialize` has not completed.
    #[error("request server cannot start while the service is {state}")]
    NotRunning {
        /// State observed when the call was rejected.
        state: ServiceState,
    },
    /// The server was already started.
    #[error("request server already started")]
    AlreadyStarted,
    /// `RequestServer::setup` failed.
    #[error("request server setup failed: {source}")]
    Setup {
        /// Error reported by the server.
        #[source]
        source: SubsystemError,
    },
    /// `RequestServer::start` failed.
    #[error("request server start failed: {source}")]
    Start {
        /// Error reported by the server.
        #[source]
        source: SubsystemError,
    },
}

/// Unhandled failure escaping the event loop.
#[derive(Debug, Error)]
pub enum EventLoopError {
    /// Event processing returned an error.
    #[error("event processing failed: {source}")]
    Events {
        /// Error reported by the server.
        #[source]
        source: SubsystemError,
    },
    /// Event processing panicked.
    #[error("event processing panicked: {message}")]
    Panicked {
        /// Rendered panic payload.
        message: String,
    },
}
