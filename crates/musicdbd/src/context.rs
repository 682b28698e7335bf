//! Process-wide runtime state shared with every subsystem.

use std::sync::{Arc, OnceLock};

use rand::SeedableRng;
use rand::rngs::StdRng;

use musicdb_config::Config;

use crate::persisted_state::PersistedState;
use crate::subsystems::{DatabaseHandle, RequestServer, SearchCache};

/// Runtime context built once during initialisation.
///
/// The context holds no worker threads. It only carries the handles the
/// workers need. The request server slot stays empty until the server has
/// been set up and started, so teardown can skip server steps when it never
/// came up.
pub struct SharedContext {
    config: Config,
    database: Arc<dyn DatabaseHandle>,
    rng_seed: u64,
    state: PersistedState,
    search: Arc<dyn SearchCache>,
    server: OnceLock<Arc<dyn RequestServer>>,
}

impl SharedContext {
    pub(crate) fn new(
        config: Config,
        database: Arc<dyn DatabaseHandle>,
        rng_seed: u64,
        state: PersistedState,
        search: Arc<dyn SearchCache>,
    ) -> Self {
        Self {
            config,
            database,
            rng_seed,
            state,
            search,
            server: OnceLock::new(),
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Music database handle.
    #[must_use]
    pub fn database(&self) -> &Arc<dyn DatabaseHandle> {
        &self.database
    }

    /// Seed drawn from OS entropy during initialisation.
    #[must_use]
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Fresh generator seeded with [`Self::rng_seed`].
    #[must_use]
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.rng_seed)
    }

    /// Persisted runtime state.
    #[must_use]
    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    /// Search cache handle.
    #[must_use]
    pub fn search_cache(&self) -> &Arc<dyn SearchCache> {
        &self.search
    }

    /// Request server, present only once it has started.
    #[must_use]
    pub fn server(&self) -> Option<&Arc<dyn RequestServer>> {
        self.server.get()
    }

    /// Stores the started server. Returns `false` when one was already set.
    pub(crate) fn attach_server(&self, server: Arc<dyn RequestServer>) -> bool {
        self.server.set(server).is_ok()
    }
}

impl std::fmt::Debug for SharedContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SharedContext")
            .field("config", &self.config)
            .field("rng_seed", &self.rng_seed)
            .field("state", &self.state)
            .field("server_started", &self.server.get().is_some())
            .finish_non_exhaustive()
    }
}
