//! # Sync Aggregation
//!
//! Pure folds from raw per-resource states into progress summaries.
//!
//! A tracker folds into one [`ActiveSync`]; many `ActiveSync`s fold into the
//! global "is anything still syncing" flag and a resource-weighted progress
//! ratio. Every function here is total: no input makes them panic or fail.

use crate::shared::event::{ResourceSyncState, TrackerKey};
use crate::sync::store::ResourceTracker;
use serde::Serialize;

/// Derived progress summary for one connection
///
/// Recomputed from the owning tracker on every event and replaced wholesale;
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSync {
    pub plugin_id: String,
    pub connection_id: String,
    pub total_resources: usize,
    pub synced_count: usize,
    pub error_count: usize,
    /// Resources in any terminal state
    pub done_count: usize,
    /// `done_count / total_resources`, 0 for an empty tracker
    pub progress: f64,
}

impl ActiveSync {
    pub fn key(&self) -> TrackerKey {
        TrackerKey::new(self.plugin_id.clone(), self.connection_id.clone())
    }
}

/// Fold a tracker into its summary
pub fn compute_active_sync(tracker: &ResourceTracker) -> ActiveSync {
    let mut synced_count = 0;
    let mut error_count = 0;
    let mut done_count = 0;

    for state in tracker.states().values() {
        match state {
            ResourceSyncState::Synced => synced_count += 1,
            ResourceSyncState::Error => error_count += 1,
            _ => {}
        }
        if state.is_terminal() {
            done_count += 1;
        }
    }

    let total_resources = tracker.len();
    let progress = if total_resources > 0 {
        done_count as f64 / total_resources as f64
    } else {
        0.0
    };

    ActiveSync {
        plugin_id: tracker.plugin_id().to_string(),
        connection_id: tracker.connection_id().to_string(),
        total_resources,
        synced_count,
        error_count,
        done_count,
        progress,
    }
}

/// Whether every resource reached a terminal state
///
/// An empty summary is indeterminate, not complete, so it is never done.
pub fn is_sync_done(sync: &ActiveSync) -> bool {
    sync.total_resources > 0 && sync.done_count >= sync.total_resources
}

/// Whether any summary is still in progress
pub fn has_active_syncing<'a, I>(syncs: I) -> bool
where
    I: IntoIterator<Item = &'a ActiveSync>,
{
    syncs.into_iter().any(|sync| !is_sync_done(sync))
}

/// Global progress weighted by resource count
///
/// `Σ done / Σ total` across all summaries, so a connection watching 50
/// resource types weighs more than one watching 2. Returns 0 when there is
/// nothing to count.
pub fn aggregate_progress<'a, I>(syncs: I) -> f64
where
    I: IntoIterator<Item = &'a ActiveSync>,
{
    let (done, total) = syncs
        .into_iter()
        .fold((0usize, 0usize), |(done, total), sync| {
            (done + sync.done_count, total + sync.total_resources)
        });

    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    }
}
