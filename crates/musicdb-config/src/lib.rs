//! Layered configuration for the MusicDB daemon.
//!
//! Values resolve in increasing precedence: built-in defaults, a TOML file
//! (`--config-path` or `MUSICDB_CONFIG_PATH`), `MUSICDB_*` environment
//! variables, and finally command-line flags. Loading is handled by
//! [`ortho_config`]; this crate only declares the fields and their defaults.

mod defaults;
mod logging;
mod runtime;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_STATE_FILE, DEFAULT_WEBSOCKET_ADDRESS, DEFAULT_WEBSOCKET_PORT,
    UNSET_TLS_PATH, default_log_filter_string, default_log_format,
    default_log_target, default_pid_file, default_state_file, default_tls_path,
    default_websocket_address,
};
pub use logging::{LogFormat, LogFormatParseError, LogTarget};
pub use runtime::{RuntimePaths, RuntimePathsError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "MUSICDB")]
pub struct Config {
    /// File holding the daemon pid; signals are addressed through it.
    #[ortho_config(default = default_pid_file())]
    pub pid_file: Utf8PathBuf,
    /// Persisted runtime state loaded during initialisation.
    #[ortho_config(default = default_state_file())]
    pub state_file: Utf8PathBuf,
    /// Address the request server binds to.
    #[ortho_config(default = default_websocket_address())]
    pub websocket_address: String,
    /// Port the request server listens on.
    #[ortho_config(default = DEFAULT_WEBSOCKET_PORT)]
    pub websocket_port: u16,
    /// TLS certificate presented by the request server.
    #[ortho_config(default = default_tls_path())]
    pub tls_cert: Utf8PathBuf,
    /// Private key matching [`Config::tls_cert`].
    #[ortho_config(default = default_tls_path())]
    pub tls_key: Utf8PathBuf,
    /// `tracing` filter directive.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Output sink for log records.
    #[ortho_config(default = default_log_target())]
    pub log_target: LogTarget,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid_file: default_pid_file(),
            state_file: default_state_file(),
            websocket_address: default_websocket_address(),
            websocket_port: DEFAULT_WEBSOCKET_PORT,
            tls_cert: default_tls_path(),
            tls_key: default_tls_path(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_target: default_log_target(),
        }
    }
}

impl Config {
    /// Pid file location.
    #[must_use]
    pub fn pid_file(&self) -> &Utf8Path {
        self.pid_file.as_path()
    }

    /// Persisted state location.
    #[must_use]
    pub fn state_file(&self) -> &Utf8Path {
        self.state_file.as_path()
    }

    /// Address the request server binds to.
    #[must_use]
    pub fn websocket_address(&self) -> &str {
        self.websocket_address.as_str()
    }

    /// Port the request server listens on.
    #[must_use]
    pub fn websocket_port(&self) -> u16 {
        self.websocket_port
    }

    /// TLS certificate path.
    #[must_use]
    pub fn tls_cert(&self) -> &Utf8Path {
        self.tls_cert.as_path()
    }

    /// TLS private key path.
    #[must_use]
    pub fn tls_key(&self) -> &Utf8Path {
        self.tls_key.as_path()
    }

    /// Returns `false` while either TLS path still points at the unset
    /// placeholder.
    #[must_use]
    pub fn tls_configured(&self) -> bool {
        self.tls_cert.as_str() != UNSET_TLS_PATH && self.tls_key.as_str() != UNSET_TLS_PATH
    }

    /// Log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Log output sink.
    #[must_use]
    pub fn log_target(&self) -> &LogTarget {
        &self.log_target
    }
}
