//! Detaches the service from its controlling terminal.

use daemonize_me::Daemon;
use std::ffi::OsStr;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;
use musicdb_config::RuntimePaths;

/// Abstraction over daemonisation strategies.
pub trait Daemonizer: Send + Sync {
    /// Detaches the process into the background.
    fn daemonize(&self, paths: &RuntimePaths) -> Result<(), DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// System-level daemonisation failed.
    #[error("{0}")]
    System(#[from] daemonize_me::DaemonError),
}

/// Daemoniser backed by `daemonize-me`.
///
/// The working directory becomes the runtime directory so the detached
/// process never pins the directory it was launched from.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl SystemDaemonizer {
    /// Builds a new system daemoniser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self, paths: &RuntimePaths) -> Result<(), DaemonizeError> {
        info!(
            target: PROCESS_TARGET,
            runtime = %paths.runtime_dir().display(),
            "detaching musicdb into the background"
        );
        Daemon::new()
            .work_dir(paths.runtime_dir())
            .name(OsStr::new(env!("CARGO_PKG_NAME")))
            .start()?;
        info!(target: PROCESS_TARGET, "detached; continuing in child process");
        Ok(())
    }
}
