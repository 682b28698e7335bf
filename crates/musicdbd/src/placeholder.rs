//! Placeholder collaborators used until the real subsystems are wired in.
//!
//! Each one logs the request and succeeds, so the daemon can be launched,
//! signalled and stopped end to end.

use std::sync::Arc;

use crate::broadcast::BroadcastPacket;
use crate::context::SharedContext;
use crate::subsystems::{
    DatabaseHandle, DatabaseSchema, PlayerBridge, RequestServer, SearchCache, SearchCacheProvider,
    ServerEndpoint, SubsystemError, SubsystemKind, Subsystems, Worker,
};

const PLACEHOLDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::placeholder");

fn not_wired(kind: SubsystemKind, operation: &'static str) {
    tracing::warn!(
        target: PLACEHOLDER_TARGET,
        subsystem = %kind,
        operation,
        "subsystem operation requested but not yet implemented"
    );
}

/// Builds the placeholder subsystem set.
pub(crate) fn subsystems() -> Subsystems {
    Subsystems {
        tracker: Arc::new(PlaceholderWorker(SubsystemKind::Tracker)),
        randomizer: Arc::new(PlaceholderWorker(SubsystemKind::Randomizer)),
        bridge: Arc::new(PlaceholderBridge),
        search: Arc::new(PlaceholderSearch),
        server: Arc::new(PlaceholderServer),
    }
}

/// Handle that claims to be connected to the music database.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PlaceholderDatabase;

impl DatabaseHandle for PlaceholderDatabase {
    fn schema(&self) -> DatabaseSchema {
        DatabaseSchema::Music
    }
}

#[derive(Debug, Clone, Copy)]
struct PlaceholderWorker(SubsystemKind);

impl Worker for PlaceholderWorker {
    fn kind(&self) -> SubsystemKind {
        self.0
    }

    fn start(&self, _context: &SharedContext) -> Result<(), SubsystemError> {
        not_wired(self.0, "start");
        Ok(())
    }

    fn stop(&self) -> Result<(), SubsystemError> {
        not_wired(self.0, "stop");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct PlaceholderBridge;

impl PlayerBridge for PlaceholderBridge {
    fn start(&self, _context: &SharedContext) -> Result<(), SubsystemError> {
        not_wired(SubsystemKind::Bridge, "start");
        Ok(())
    }

    fn resync(&self) -> Result<(), SubsystemError> {
        not_wired(SubsystemKind::Bridge, "resync");
        Ok(())
    }

    fn stop_observer(&self) -> Result<(), SubsystemError> {
        not_wired(SubsystemKind::Bridge, "stop_observer");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct PlaceholderSearch;

impl SearchCacheProvider for PlaceholderSearch {
    fn open(
        &self,
        _database: Arc<dyn DatabaseHandle>,
    ) -> Result<Arc<dyn SearchCache>, SubsystemError> {
        not_wired(SubsystemKind::SearchCache, "open");
        Ok(Arc::new(Self))
    }
}

impl SearchCache for PlaceholderSearch {
    fn refresh(&self) -> Result<(), SubsystemError> {
        not_wired(SubsystemKind::SearchCache, "refresh");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct PlaceholderServer;

impl RequestServer for PlaceholderServer {
    fn setup(&self, endpoint: &ServerEndpoint) -> Result<(), SubsystemError> {
        tracing::warn!(
            target: PLACEHOLDER_TARGET,
            endpoint = %endpoint,
            "request server setup requested but not yet implemented"
        );
        Ok(())
    }

    fn start(&self) -> Result<(), SubsystemError> {
        not_wired(SubsystemKind::RequestServer, "start");
        Ok(())
    }

    fn stop(&self) -> Result<(), SubsystemError> {
        not_wired(SubsystemKind::RequestServer, "stop");
        Ok(())
    }

    // Called every loop iteration; stays silent.
    fn handle_events(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    fn close_all_connections(&self) -> Result<(), SubsystemError> {
        not_wired(SubsystemKind::RequestServer, "close_all_connections");
        Ok(())
    }

    fn broadcast(&self, packet: &BroadcastPacket) -> Result<(), SubsystemError> {
        tracing::warn!(
            target: PLACEHOLDER_TARGET,
            fncsig = %packet.fncsig,
            "broadcast requested but no clients can be connected yet"
        );
        Ok(())
    }
}
