//! USR1 cache refresh.

use std::sync::Arc;

use tracing::info;

use super::LIFECYCLE_TARGET;
use super::step::{Phase, StepReport, best_effort};
use crate::broadcast::BroadcastPacket;
use crate::context::SharedContext;
use crate::health::HealthReporter;
use crate::subsystems::{PlayerBridge, SubsystemError, SubsystemKind};

/// Rebuilds caches and tells clients to refetch.
///
/// Each step is best-effort; a failing step never prevents the next.
pub struct CacheRefreshCoordinator {
    bridge: Arc<dyn PlayerBridge>,
    reporter: Arc<dyn HealthReporter>,
}

impl CacheRefreshCoordinator {
    /// Builds a coordinator over the bridge and reporter.
    #[must_use]
    pub fn new(bridge: Arc<dyn PlayerBridge>, reporter: Arc<dyn HealthReporter>) -> Self {
        Self { bridge, reporter }
    }

    /// Runs the refresh: search cache, bridge resync, then the broadcast.
    pub fn refresh(&self, context: &SharedContext) -> StepReport {
        info!(target: LIFECYCLE_TARGET, "updating caches");
        let mut report = StepReport::new(Phase::Refresh);

        report.push(best_effort(Phase::Refresh, "search_cache", || {
            context.search_cache().refresh()
        }));
        report.push(best_effort(Phase::Refresh, "bridge_resync", || {
            self.bridge.resync()
        }));
        report.push(best_effort(Phase::Refresh, "broadcast", || {
            let server = context.server().ok_or_else(|| {
                SubsystemError::new(
                    SubsystemKind::RequestServer,
                    "cannot broadcast cache update: server not started",
                )
            })?;
            server.broadcast(&BroadcastPacket::cache_update())
        }));

        self.reporter.refresh_completed(&report);
        report
    }
}
