//! Process lifecycle coordinator for the MusicDB background service.
//!
//! The daemon owns the shared runtime context, starts the tracker, media
//! player bridge, search cache and randomizer in dependency order, runs the
//! single event loop around the request server, and reacts to control
//! signals: `USR1` refreshes caches, `TERM` requests an orderly shutdown and
//! `INT` is treated as a user interrupt.
//!
//! Teardown is strictly ordered and runs at most once no matter how many
//! paths ask for it. The library never exits the process; it hands a
//! [`Termination`] back to `main`, which maps it to exit code 0 (requested)
//! or 1 (forced by an error).
//!
//! Subsystems are reached only through the traits in [`subsystems`], so the
//! real implementations can be swapped in without touching the lifecycle.

mod broadcast;
mod context;
mod health;
pub mod lifecycle;
mod persisted_state;
mod placeholder;
mod process;
pub mod subsystems;
mod telemetry;

pub use broadcast::BroadcastPacket;
pub use context::SharedContext;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use lifecycle::{
    InitializeError, LifecycleManager, ServerStartError, ServiceState, ShutdownFlag,
    ShutdownReport, Termination,
};
pub use persisted_state::{PersistedState, StateError};
pub use process::{
    ConfigLoader, DaemonizeError, Daemonizer, LaunchError, LaunchMode, SystemConfigLoader,
    SystemDaemonizer, run_daemon,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
