//! # Resource Tracker Store
//!
//! Keyed map from `(pluginId, connectionId)` to the raw per-resource state
//! table of that connection.
//!
//! Trackers are created lazily by the first event for an unseen key and are
//! only ever mutated through [`TrackerStore::apply_event`]. Events are applied
//! last-write-wins per resource key; see `DESIGN.md` for the ordering contract
//! expected from the transport.

use crate::shared::connection::InformerSummary;
use crate::shared::event::{ResourceSyncState, SyncEvent, TrackerKey};
use std::collections::HashMap;

/// Per-connection table of resource key to sync state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTracker {
    key: TrackerKey,
    states: HashMap<String, ResourceSyncState>,
}

impl ResourceTracker {
    /// Create an empty tracker
    pub fn new(key: TrackerKey) -> Self {
        Self {
            key,
            states: HashMap::new(),
        }
    }

    /// Seed a tracker from a point-in-time informer summary
    pub fn from_summary(key: TrackerKey, summary: &InformerSummary) -> Self {
        Self {
            key,
            states: summary.resources.clone(),
        }
    }

    pub fn key(&self) -> &TrackerKey {
        &self.key
    }

    pub fn plugin_id(&self) -> &str {
        &self.key.plugin_id
    }

    pub fn connection_id(&self) -> &str {
        &self.key.connection_id
    }

    pub fn states(&self) -> &HashMap<String, ResourceSyncState> {
        &self.states
    }

    pub fn state(&self, resource_key: &str) -> Option<ResourceSyncState> {
        self.states.get(resource_key).copied()
    }

    /// Number of resource types tracked
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Overwrite one resource's state, returning the previous one
    pub fn set_state(&mut self, resource_key: &str, state: ResourceSyncState) -> Option<ResourceSyncState> {
        self.states.insert(resource_key.to_string(), state)
    }
}

/// Owner of all live trackers
#[derive(Debug, Default)]
pub struct TrackerStore {
    trackers: HashMap<TrackerKey, ResourceTracker>,
}

impl TrackerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event, creating the tracker if this key is new
    ///
    /// Never fails: identities are taken at face value.
    pub fn apply_event(&mut self, event: &SyncEvent) -> &ResourceTracker {
        let key = event.tracker_key();
        let tracker = self.trackers.entry(key).or_insert_with_key(|key| {
            tracing::debug!("[Ingest] New tracker for {}", key);
            ResourceTracker::new(key.clone())
        });

        let previous = tracker.set_state(&event.resource_key, event.state);
        tracing::debug!(
            "[Ingest] {}: {} {:?} -> {}",
            tracker.key(),
            event.resource_key,
            previous,
            event.state
        );
        tracker
    }

    /// Replace a tracker wholesale, e.g. when seeding from a summary
    pub fn insert(&mut self, tracker: ResourceTracker) -> Option<ResourceTracker> {
        self.trackers.insert(tracker.key().clone(), tracker)
    }

    pub fn get(&self, key: &TrackerKey) -> Option<&ResourceTracker> {
        self.trackers.get(key)
    }

    pub fn remove(&mut self, key: &TrackerKey) -> Option<ResourceTracker> {
        self.trackers.remove(key)
    }

    pub fn contains(&self, key: &TrackerKey) -> bool {
        self.trackers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn clear(&mut self) {
        self.trackers.clear();
    }
}
