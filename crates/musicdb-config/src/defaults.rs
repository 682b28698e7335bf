use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::logging::{LogFormat, LogTarget};

/// Default address the request server binds to.
pub const DEFAULT_WEBSOCKET_ADDRESS: &str = "127.0.0.1";

/// Default port the request server listens on.
pub const DEFAULT_WEBSOCKET_PORT: u16 = 9000;

/// Placeholder used for TLS material that has not been configured.
pub const UNSET_TLS_PATH: &str = "/dev/null";

/// Default location of the persisted runtime state.
pub const DEFAULT_STATE_FILE: &str = "/opt/musicdb/data/mdbstate/state.json";

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default log sink for the daemon.
pub fn default_log_target() -> LogTarget {
    LogTarget::Stderr
}

/// Default address of the request server.
pub fn default_websocket_address() -> String {
    DEFAULT_WEBSOCKET_ADDRESS.to_owned()
}

/// Default TLS certificate and key location.
pub fn default_tls_path() -> Utf8PathBuf {
    Utf8PathBuf::from(UNSET_TLS_PATH)
}

/// Default persisted state location.
pub fn default_state_file() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_STATE_FILE)
}

/// Computes the default pid file location.
///
/// The pid file lives in the per-user runtime directory when one exists and
/// falls back to a uid-namespaced directory below the system temp dir.
pub fn default_pid_file() -> Utf8PathBuf {
    default_runtime_base().join("musicdb.pid")
}

#[cfg(unix)]
fn default_runtime_base() -> Utf8PathBuf {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("musicdb");
    if apply_namespace {
        base.push(user_namespace());
    }
    base
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn user_namespace() -> String {
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(not(unix))]
fn default_runtime_base() -> Utf8PathBuf {
    fallback_base_directory().join("musicdb")
}
