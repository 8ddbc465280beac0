//! Connection snapshot types
//!
//! Point-in-time results returned by the query layer. They enrich the live
//! view with display metadata and seed per-connection informer state, but
//! never decide whether a connection counts as started.

use crate::shared::event::ResourceSyncState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display metadata for one configured connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Connection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Result of the "list all connections" query, keyed by plugin id
pub type ConnectionSnapshot = HashMap<String, Vec<Connection>>;

/// Result of the "get informer summary" query for one connection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformerSummary {
    #[serde(default)]
    pub resources: HashMap<String, ResourceSyncState>,
    #[serde(default)]
    pub resource_counts: HashMap<String, i64>,
    #[serde(default)]
    pub total_resources: usize,
    #[serde(default)]
    pub synced_count: usize,
    #[serde(default)]
    pub error_count: usize,
}
