//! # Connection Status Correlation
//!
//! Merges three independently arriving signals into one list of started
//! connections:
//!
//! 1. **Snapshot query**: connection metadata per plugin. Only enriches
//!    entries; never decides whether a connection is started.
//! 2. **Lifecycle events**: `DISCONNECTED` removes the key from the started
//!    set, any other status adds it.
//! 3. **Sync events**: receiving one proves the connection is started.
//!
//! The correlator owns the started set and the snapshot cache. It reads
//! [`ActiveSync`] values when building a view but never mutates tracker state;
//! on disconnect it reports the change and the owner drops the tracker.

use crate::shared::connection::{Connection, ConnectionSnapshot};
use crate::shared::event::{LifecycleEvent, TrackerKey};
use crate::sync::aggregator::{aggregate_progress, has_active_syncing, is_sync_done, ActiveSync};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One started connection as seen by consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusEntry {
    pub plugin_id: String,
    pub connection_id: String,
    /// Snapshot name, or the connection id until metadata arrives
    pub name: String,
    pub avatar: Option<String>,
    /// Absent until the first sync event for this connection
    pub sync: Option<ActiveSync>,
    pub is_syncing: bool,
    pub has_errors: bool,
}

/// Consumer-facing view over every started connection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusView {
    /// Entries ordered by plugin id, then connection id
    pub entries: Vec<ConnectionStatusEntry>,
    pub connected_count: usize,
    pub syncing_count: usize,
    pub error_count: usize,
    pub has_syncing: bool,
    pub aggregate_progress: f64,
}

impl ConnectionStatusView {
    /// Entries grouped by plugin id
    pub fn by_plugin(&self) -> BTreeMap<&str, Vec<&ConnectionStatusEntry>> {
        let mut groups: BTreeMap<&str, Vec<&ConnectionStatusEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.plugin_id.as_str()).or_default().push(entry);
        }
        groups
    }

    pub fn entry(&self, plugin_id: &str, connection_id: &str) -> Option<&ConnectionStatusEntry> {
        self.entries
            .iter()
            .find(|entry| entry.plugin_id == plugin_id && entry.connection_id == connection_id)
    }
}

/// Effect of a lifecycle event on the started set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleChange {
    /// Key is now started; `newly` is false if it already was
    Started { newly: bool },
    /// Key was disconnected; the owner must drop its tracker
    Stopped { was_started: bool },
}

/// Started set plus latest snapshot
#[derive(Debug, Default)]
pub struct ConnectionStatusCorrelator {
    started: BTreeSet<TrackerKey>,
    snapshot: ConnectionSnapshot,
}

impl ConnectionStatusCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a coarse lifecycle event
    pub fn on_lifecycle(&mut self, event: &LifecycleEvent) -> LifecycleChange {
        let key = event.tracker_key();
        if event.is_disconnect() {
            let was_started = self.started.remove(&key);
            tracing::info!("[Correlator] {} disconnected", key);
            LifecycleChange::Stopped { was_started }
        } else {
            let newly = self.started.insert(key.clone());
            if newly {
                tracing::info!("[Correlator] {} started ({})", key, event.status);
            }
            LifecycleChange::Started { newly }
        }
    }

    /// Record that a sync event arrived for `key`
    ///
    /// Returns `true` if the key was not started before.
    pub fn on_sync_event(&mut self, key: &TrackerKey) -> bool {
        if self.started.contains(key) {
            return false;
        }
        tracing::info!("[Correlator] {} started by informer event", key);
        self.started.insert(key.clone())
    }

    /// Replace the cached snapshot
    pub fn apply_snapshot(&mut self, snapshot: ConnectionSnapshot) {
        tracing::debug!(
            "[Correlator] Snapshot updated: {} plugins, {} connections",
            snapshot.len(),
            snapshot.values().map(Vec::len).sum::<usize>()
        );
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &ConnectionSnapshot {
        &self.snapshot
    }

    pub fn is_started(&self, key: &TrackerKey) -> bool {
        self.started.contains(key)
    }

    pub fn started(&self) -> impl Iterator<Item = &TrackerKey> {
        self.started.iter()
    }

    pub fn started_count(&self) -> usize {
        self.started.len()
    }

    /// Snapshot metadata for a connection, if any has arrived
    pub fn metadata(&self, key: &TrackerKey) -> Option<&Connection> {
        self.snapshot
            .get(&key.plugin_id)?
            .iter()
            .find(|connection| connection.id == key.connection_id)
    }

    /// Build the consumer view from the started set and current summaries
    pub fn build_view(&self, syncs: &HashMap<TrackerKey, ActiveSync>) -> ConnectionStatusView {
        let entries: Vec<ConnectionStatusEntry> = self
            .started
            .iter()
            .map(|key| self.entry_for(key, syncs.get(key)))
            .collect();

        ConnectionStatusView {
            connected_count: entries.len(),
            syncing_count: entries.iter().filter(|entry| entry.is_syncing).count(),
            error_count: entries.iter().filter(|entry| entry.has_errors).count(),
            has_syncing: has_active_syncing(syncs.values()),
            aggregate_progress: aggregate_progress(syncs.values()),
            entries,
        }
    }

    fn entry_for(&self, key: &TrackerKey, sync: Option<&ActiveSync>) -> ConnectionStatusEntry {
        let metadata = self.metadata(key);
        let name = metadata
            .map(|connection| connection.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&key.connection_id)
            .to_string();

        ConnectionStatusEntry {
            plugin_id: key.plugin_id.clone(),
            connection_id: key.connection_id.clone(),
            name,
            avatar: metadata.and_then(|connection| connection.avatar.clone()),
            is_syncing: sync.is_some_and(|sync| !is_sync_done(sync)),
            has_errors: sync.is_some_and(|sync| sync.error_count > 0),
            sync: sync.cloned(),
        }
    }
}
