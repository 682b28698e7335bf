//! Derives runtime artefact paths for the daemon supervisor.
//!
//! The runtime directory is the parent of the configured pid file. It houses
//! the pid file operators signal through (`kill -USR1 $(cat musicdb.pid)`),
//! the startup lock, and the health snapshot.

use std::fs::DirBuilder;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Config;

/// Canonical paths for runtime artefacts written by the daemon.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    runtime_dir: PathBuf,
    lock_path: PathBuf,
    pid_path: PathBuf,
    health_path: PathBuf,
}

impl RuntimePaths {
    /// Derives runtime paths from the configuration, creating the runtime
    /// directory when it is missing.
    pub fn from_config(config: &Config) -> Result<Self, RuntimePathsError> {
        let pid_path = config.pid_file();
        let runtime_dir = match pid_path.parent().filter(|parent| !parent.as_str().is_empty()) {
            Some(parent) => parent.as_std_path().to_path_buf(),
            None => {
                return Err(RuntimePathsError::MissingPidParent {
                    path: pid_path.to_string(),
                });
            }
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&runtime_dir)
            .map_err(|source| RuntimePathsError::RuntimeDirectory {
                path: runtime_dir.clone(),
                source,
            })?;

        let stem = pid_path.file_stem().unwrap_or("musicdb");
        Ok(Self {
            lock_path: runtime_dir.join(format!("{stem}.lock")),
            health_path: runtime_dir.join(format!("{stem}.health")),
            pid_path: pid_path.as_std_path().to_path_buf(),
            runtime_dir,
        })
    }

    /// Directory holding runtime artefacts.
    pub fn runtime_dir(&self) -> &Path {
        self.runtime_dir.as_path()
    }

    /// Path to the lock file guarding singleton startup.
    pub fn lock_path(&self) -> &Path {
        self.lock_path.as_path()
    }

    /// Path to the PID file.
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Path to the health snapshot.
    pub fn health_path(&self) -> &Path {
        self.health_path.as_path()
    }
}

/// Errors raised while deriving daemon runtime paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// The pid file path lacked a parent directory.
    #[error("pid file '{path}' has no parent directory")]
    MissingPidParent { path: String },
    /// Creating the runtime directory failed.
    #[error("failed to prepare runtime directory '{path}': {source}")]
    RuntimeDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
