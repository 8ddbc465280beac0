/**
 * Informer Event Types
 *
 * This module defines the typed payloads carried on the event bus:
 * fine-grained per-resource `SyncEvent`s published by informers and coarse
 * `LifecycleEvent`s published when a connection starts or stops.
 *
 * Payloads arrive as untyped JSON and are validated here, at the ingestion
 * boundary, before anything downstream sees them. Validation only checks
 * shape and identity fields; a well-formed event for an unknown connection is
 * accepted at face value.
 */
use crate::shared::error::SharedError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status string carried by a lifecycle event when a connection goes away
pub const DISCONNECTED: &str = "DISCONNECTED";

/// Status string carried by a lifecycle event when a connection comes up
pub const CONNECTED: &str = "CONNECTED";

/// Sync state of one resource type's informer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceSyncState {
    /// Informer registered but not started
    Pending,
    /// Initial list/watch in progress
    Syncing,
    /// Initial sync completed
    Synced,
    /// Informer failed
    Error,
    /// Informer stopped before completing
    Cancelled,
}

impl ResourceSyncState {
    /// Whether no further progress is expected from this state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Synced | Self::Error | Self::Cancelled)
    }
}

impl fmt::Display for ResourceSyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Identity of one connection within one plugin
///
/// Displays as `pluginId/connectionId`, which is the tracker key format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerKey {
    pub plugin_id: String,
    pub connection_id: String,
}

impl TrackerKey {
    pub fn new(plugin_id: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            connection_id: connection_id.into(),
        }
    }
}

impl fmt::Display for TrackerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plugin_id, self.connection_id)
    }
}

/// Structured error attached to an informer that ended in `Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncErrorPayload {
    pub code: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Per-resource informer state notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    #[serde(rename = "pluginID", alias = "pluginId")]
    pub plugin_id: String,
    #[serde(rename = "connectionID", alias = "connectionId")]
    pub connection_id: String,
    pub resource_key: String,
    pub state: ResourceSyncState,
    #[serde(default)]
    pub resource_count: i64,
    /// Total number of objects expected, `-1` when unknown
    #[serde(default = "unknown_total")]
    pub total_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SyncErrorPayload>,
}

fn unknown_total() -> i64 {
    -1
}

impl SyncEvent {
    /// Create an event with no object counts
    pub fn new(
        plugin_id: impl Into<String>,
        connection_id: impl Into<String>,
        resource_key: impl Into<String>,
        state: ResourceSyncState,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            connection_id: connection_id.into(),
            resource_key: resource_key.into(),
            state,
            resource_count: 0,
            total_count: unknown_total(),
            error: None,
        }
    }

    /// Set the object counts
    pub fn with_counts(mut self, resource_count: i64, total_count: i64) -> Self {
        self.resource_count = resource_count;
        self.total_count = total_count;
        self
    }

    /// Attach a structured error payload
    pub fn with_error(mut self, error: SyncErrorPayload) -> Self {
        self.error = Some(error);
        self
    }

    /// Key of the tracker this event belongs to
    pub fn tracker_key(&self) -> TrackerKey {
        TrackerKey::new(self.plugin_id.clone(), self.connection_id.clone())
    }

    /// Total object count, if the informer reported one
    pub fn known_total(&self) -> Option<u64> {
        u64::try_from(self.total_count).ok()
    }

    /// Decode and validate a bus payload
    pub fn from_value(value: serde_json::Value) -> Result<Self, SharedError> {
        let event: Self = serde_json::from_value(value)?;
        event.validate()?;
        Ok(event)
    }

    /// Check identity fields and counts
    pub fn validate(&self) -> Result<(), SharedError> {
        require_non_empty("pluginID", &self.plugin_id)?;
        require_non_empty("connectionID", &self.connection_id)?;
        require_non_empty("resourceKey", &self.resource_key)?;
        if self.resource_count < 0 {
            return Err(SharedError::validation(
                "resourceCount",
                format!("must be non-negative, got {}", self.resource_count),
            ));
        }
        if self.total_count < -1 {
            return Err(SharedError::validation(
                "totalCount",
                format!("must be -1 or non-negative, got {}", self.total_count),
            ));
        }
        Ok(())
    }
}

/// Coarse connection lifecycle notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "pluginID", alias = "pluginId")]
    pub plugin_id: String,
    #[serde(rename = "connectionID", alias = "connectionId")]
    pub connection_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LifecycleEvent {
    pub fn new(
        plugin_id: impl Into<String>,
        connection_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            connection_id: connection_id.into(),
            status: status.into(),
            name: None,
        }
    }

    pub fn connected(plugin_id: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self::new(plugin_id, connection_id, CONNECTED)
    }

    pub fn disconnected(plugin_id: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self::new(plugin_id, connection_id, DISCONNECTED)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Any status other than `DISCONNECTED` marks the connection as started
    pub fn is_disconnect(&self) -> bool {
        self.status == DISCONNECTED
    }

    pub fn tracker_key(&self) -> TrackerKey {
        TrackerKey::new(self.plugin_id.clone(), self.connection_id.clone())
    }

    /// Decode and validate a bus payload
    pub fn from_value(value: serde_json::Value) -> Result<Self, SharedError> {
        let event: Self = serde_json::from_value(value)?;
        require_non_empty("pluginID", &event.plugin_id)?;
        require_non_empty("connectionID", &event.connection_id)?;
        Ok(event)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), SharedError> {
    if value.trim().is_empty() {
        return Err(SharedError::validation(field, "must not be empty"));
    }
    Ok(())
}
