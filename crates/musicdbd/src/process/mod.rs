//! Process supervision: singleton lock, pid file, health snapshot, and
//! daemonisation around the service lifecycle.

pub(crate) mod daemonizer;
mod errors;
mod files;
mod guard;
pub(crate) mod launch;

pub use daemonizer::{DaemonizeError, Daemonizer, SystemDaemonizer};
pub use errors::LaunchError;
pub use launch::{ConfigLoader, LaunchMode, SystemConfigLoader, run_daemon};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const FOREGROUND_ENV_VAR: &str = "MUSICDB_FOREGROUND";
