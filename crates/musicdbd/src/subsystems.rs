//! Collaborator seams for the subsystems the lifecycle core coordinates.
//!
//! The daemon never reaches into the tracker, randomizer, media-player bridge,
//! search cache, or request server. It only drives their lifecycle surface
//! through the traits below, which keeps the core testable with recording
//! doubles and lets the real implementations evolve independently.
//!
//! Every `stop`-style operation must treat "never started" as a no-op: the
//! shutdown sequencer calls them unconditionally, including after a failed
//! initialisation.

use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

use musicdb_config::Config;

use crate::broadcast::BroadcastPacket;
use crate::context::SharedContext;

/// Subsystems addressed by the lifecycle core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemKind {
    /// Background worker recording playback history.
    Tracker,
    /// Background worker producing recommendation queues.
    Randomizer,
    /// Client and observer of the external media-playback daemon.
    Bridge,
    /// In-memory search index rebuilt from the database.
    SearchCache,
    /// Socket server accepting client connections.
    RequestServer,
}

impl SubsystemKind {
    /// Stable lowercase label used in logs and test steps.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tracker => "tracker",
            Self::Randomizer => "randomizer",
            Self::Bridge => "bridge",
            Self::SearchCache => "search cache",
            Self::RequestServer => "request server",
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
#[error("{kind} failed: {message}")]
pub struct SubsystemError {
    /// Subsystem that reported the failure.
    pub kind: SubsystemKind,
    message: String,
}

impl SubsystemError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(kind: SubsystemKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Database flavours known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseSchema {
    /// The music library database the service is built around.
    Music,
    /// Playback history database owned by the tracker.
    Tracker,
    /// Lyrics database.
    Lycra,
}

impl fmt::Display for DatabaseSchema {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Music => "music",
            Self::Tracker => "tracker",
            Self::Lycra => "lycra",
        };
        formatter.write_str(label)
    }
}

/// Long-lived database handle shared across the process.
pub trait DatabaseHandle: Send + Sync {
    /// Schema the handle is connected to.
    fn schema(&self) -> DatabaseSchema;
}

/// Rebuildable search index.
pub trait SearchCache: Send + Sync {
    /// Rebuilds the index from the current database contents.
    fn refresh(&self) -> Result<(), SubsystemError>;
}

/// Constructs search caches bound to a database handle.
pub trait SearchCacheProvider: Send + Sync {
    /// Opens a cache over `database` without populating it.
    fn open(&self, database: Arc<dyn DatabaseHandle>)
    -> Result<Arc<dyn SearchCache>, SubsystemError>;
}

/// Named background worker with an explicit start/stop surface.
pub trait Worker: Send + Sync {
    /// Which worker this is.
    fn kind(&self) -> SubsystemKind;

    /// Starts the worker against the shared context.
    fn start(&self, context: &SharedContext) -> Result<(), SubsystemError>;

    /// Stops the worker. Must succeed quietly when it was never started.
    fn stop(&self) -> Result<(), SubsystemError>;
}

/// Bridge to the external media-playback daemon.
pub trait PlayerBridge: Send + Sync {
    /// Connects the client and starts the observer.
    fn start(&self, context: &SharedContext) -> Result<(), SubsystemError>;

    /// Asks the playback daemon to resynchronise its library view.
    fn resync(&self) -> Result<(), SubsystemError>;

    /// Disconnects and stops the observer. Must tolerate "never started".
    fn stop_observer(&self) -> Result<(), SubsystemError>;
}

/// Address and TLS material handed to the request server during setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    /// Bind address.
    pub address: String,
    /// Listening port.
    pub port: u16,
    /// TLS certificate path.
    pub tls_cert: Utf8PathBuf,
    /// TLS private key path.
    pub tls_key: Utf8PathBuf,
}

impl ServerEndpoint {
    /// Extracts the endpoint from the resolved configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            address: config.websocket_address().to_owned(),
            port: config.websocket_port(),
            tls_cert: config.tls_cert().to_path_buf(),
            tls_key: config.tls_key().to_path_buf(),
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "wss://{}:{}", self.address, self.port)
    }
}

/// Client-facing request server.
pub trait RequestServer: Send + Sync {
    /// Prepares the listener for `endpoint`.
    fn setup(&self, endpoint: &ServerEndpoint) -> Result<(), SubsystemError>;

    /// Starts accepting connections.
    fn start(&self) -> Result<(), SubsystemError>;

    /// Stops the listener.
    fn stop(&self) -> Result<(), SubsystemError>;

    /// Processes one bounded batch of pending events.
    fn handle_events(&self) -> Result<(), SubsystemError>;

    /// Closes every client connection.
    fn close_all_connections(&self) -> Result<(), SubsystemError>;

    /// Sends `packet` to every connected client.
    fn broadcast(&self, packet: &BroadcastPacket) -> Result<(), SubsystemError>;
}

/// The set of collaborators the lifecycle manager drives.
#[derive(Clone)]
pub struct Subsystems {
    /// Playback history worker.
    pub tracker: Arc<dyn Worker>,
    /// Recommendation worker.
    pub randomizer: Arc<dyn Worker>,
    /// Media-player bridge.
    pub bridge: Arc<dyn PlayerBridge>,
    /// Factory for the search cache.
    pub search: Arc<dyn SearchCacheProvider>,
    /// Request server; only attached to the shared context once started.
    pub server: Arc<dyn RequestServer>,
}
