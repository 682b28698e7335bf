//! Recording doubles and scenario worlds shared by the lifecycle suites.

mod config;
mod reporter;
mod subsystems;
mod world;

pub use config::{TestConfigLoader, context_without_server, test_config};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use subsystems::{
    CallLog, RecordingBridge, RecordingSearchCache, RecordingServer, RecordingWorker,
    ScriptedSignalInstaller, SignalQueue, TestDatabase, recording_subsystems,
};
pub use world::{LifecycleWorld, world};
