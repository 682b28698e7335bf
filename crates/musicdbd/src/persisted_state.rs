//! Runtime state persisted between daemon runs.
//!
//! The state file is a flat JSON object (selected genres, queue end-of-queue
//! events and similar). A missing file is normal on first boot and yields an
//! empty state; unreadable or malformed content aborts initialisation.

use std::fs;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::subsystems::DatabaseHandle;

const STATE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::state");

/// Errors raised while loading persisted state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Reading the state file failed.
    #[error("failed to read state file '{path}': {source}")]
    Read {
        /// State file path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The state file did not contain a JSON object.
    #[error("failed to parse state file '{path}': {source}")]
    Parse {
        /// State file path.
        path: Utf8PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// State loaded from disk, bound to the database it describes.
pub struct PersistedState {
    path: Utf8PathBuf,
    database: Arc<dyn DatabaseHandle>,
    entries: Map<String, Value>,
}

impl PersistedState {
    /// Loads the state stored at `path`.
    pub fn load(path: &Utf8Path, database: Arc<dyn DatabaseHandle>) -> Result<Self, StateError> {
        let entries = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => {
                serde_json::from_str::<Map<String, Value>>(&content).map_err(|source| {
                    StateError::Parse {
                        path: path.to_path_buf(),
                        source,
                    }
                })?
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(
                    target: STATE_TARGET,
                    file = %path,
                    "no persisted state found; starting with an empty state"
                );
                Map::new()
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        info!(
            target: STATE_TARGET,
            file = %path,
            entries = entries.len(),
            schema = %database.schema(),
            "persisted state loaded"
        );
        Ok(Self {
            path: path.to_path_buf(),
            database,
            entries,
        })
    }

    /// File the state was loaded from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Database the state is bound to.
    #[must_use]
    pub fn database(&self) -> &Arc<dyn DatabaseHandle> {
        &self.database
    }

    /// Looks up a single entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns `true` when no entries were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for PersistedState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PersistedState")
            .field("path", &self.path)
            .field("schema", &self.database.schema())
            .field("entries", &self.entries.len())
            .finish()
    }
}
