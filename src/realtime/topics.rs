//! Bus topic names

/// Per-resource informer state, all plugins and connections multiplexed
pub const INFORMER_STATE: &str = "informer/STATE";

/// Coarse connection lifecycle (`CONNECTED`, `DISCONNECTED`, ...)
pub const CONNECTION_STATUS: &str = "connection/status";

/// Informer state scoped to a single connection
pub fn scoped_informer_state(plugin_id: &str, connection_id: &str) -> String {
    format!("{}/{}/{}", plugin_id, connection_id, INFORMER_STATE)
}
