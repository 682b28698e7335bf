//! Notifications pushed to every connected client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const BROADCAST_METHOD: &str = "broadcast";

/// Packet fanned out by the request server to all clients.
///
/// Unlike a response it answers no particular request. `arguments` and
/// `pass` serialise as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastPacket {
    /// Always `"broadcast"`.
    pub method: String,
    /// Name of the originating function or event.
    pub fncname: String,
    /// Signature the clients dispatch on.
    pub fncsig: String,
    /// Optional payload.
    pub arguments: Option<Value>,
    /// Credential echo; unused for server-originated broadcasts.
    pub pass: Option<String>,
}

impl BroadcastPacket {
    /// Builds a broadcast without a credential echo.
    #[must_use]
    pub fn new(
        fncname: impl Into<String>,
        fncsig: impl Into<String>,
        arguments: Option<Value>,
    ) -> Self {
        Self {
            method: BROADCAST_METHOD.to_owned(),
            fncname: fncname.into(),
            fncsig: fncsig.into(),
            arguments,
            pass: None,
        }
    }

    /// Packet telling clients to refresh their caches after a USR1 refresh.
    #[must_use]
    pub fn cache_update() -> Self {
        Self::new("SIGUSR1", "UpdateCaches", None)
    }
}
