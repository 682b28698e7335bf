//! Configuration fixtures rooted in temporary directories.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use tempfile::TempDir;

use musicdb_config::{Config, LogTarget};

use crate::context::SharedContext;
use crate::persisted_state::PersistedState;
use crate::process::ConfigLoader;
use crate::subsystems::{DatabaseSchema, SearchCache};

use super::subsystems::TestDatabase;

/// Configuration whose pid and state files live under `dir`.
#[must_use]
pub fn test_config(dir: &TempDir) -> Config {
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .expect("temporary directory was not valid UTF-8");
    Config {
        pid_file: root.join("run").join("musicdb.pid"),
        state_file: root.join("state.json"),
        ..Config::default()
    }
}

/// Shared context over the music schema with no server attached.
#[must_use]
pub fn context_without_server(search: impl SearchCache + 'static) -> SharedContext {
    let database = Arc::new(TestDatabase(DatabaseSchema::Music));
    let state = PersistedState::load(
        &Utf8PathBuf::from("/nonexistent/musicdb/state.json"),
        database.clone(),
    )
    .expect("missing state file should load as empty");
    SharedContext::new(Config::default(), database, 7, state, Arc::new(search))
}

/// Loader returning [`test_config`] for a directory it owns.
///
/// Launches install the global subscriber, so records go to a log file in
/// the directory instead of stderr.
pub struct TestConfigLoader {
    dir: TempDir,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary directory"),
        }
    }

    /// Configuration the loader hands out.
    #[must_use]
    pub fn config(&self) -> Config {
        let config = test_config(&self.dir);
        Config {
            log_target: LogTarget::File(config.state_file().with_file_name("musicdb.log")),
            ..config
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config())
    }
}
