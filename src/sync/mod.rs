//! # Active Sync Tracking
//!
//! Ingestion, aggregation and expiry of per-connection informer progress.
//!
//! ## Architecture
//!
//! - **Store**: raw per-resource state tables, one per connection
//! - **Aggregator**: pure folds into [`ActiveSync`] summaries and global counters
//! - **Expiry**: removal timers for connections whose sync has finished
//!
//! [`ActiveSyncTracker`] owns all three and is the only place tracker state is
//! mutated. Every inbound event runs to completion through it: update the
//! store, recompute the summary, then cancel and possibly re-arm the removal
//! timer for that key.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use informer_sync::shared::{ResourceSyncState, SyncEvent};
//! use informer_sync::sync::ActiveSyncTracker;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let (mut tracker, mut expired) = ActiveSyncTracker::new(Duration::from_secs(5));
//! let sync = tracker.apply_event(&SyncEvent::new("k8s", "cluster-1", "Pod", ResourceSyncState::Synced));
//! assert_eq!(sync.progress, 1.0);
//!
//! // Feed timer reports back in from the same loop that applies events
//! while let Some(expiry) = expired.recv().await {
//!     tracker.handle_expiry(&expiry);
//! }
//! # }
//! ```

pub mod aggregator;
pub mod expiry;
pub mod store;

pub use aggregator::{aggregate_progress, compute_active_sync, has_active_syncing, is_sync_done, ActiveSync};
pub use expiry::{Expiry, ExpiryScheduler};
pub use store::{ResourceTracker, TrackerStore};

use crate::shared::connection::InformerSummary;
use crate::shared::event::{SyncEvent, TrackerKey};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

/// Global progress counters across every live tracker
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub active_count: usize,
    pub has_syncing: bool,
    pub progress: f64,
}

/// Store, derived summaries and removal timers for all connections
#[derive(Debug)]
pub struct ActiveSyncTracker {
    store: TrackerStore,
    syncs: HashMap<TrackerKey, ActiveSync>,
    expiry: ExpiryScheduler,
}

impl ActiveSyncTracker {
    /// Create a tracker and the receiver its removal timers report to
    pub fn new(grace_period: Duration) -> (Self, mpsc::UnboundedReceiver<Expiry>) {
        let (expiry, expired_rx) = ExpiryScheduler::new(grace_period);
        let tracker = Self {
            store: TrackerStore::new(),
            syncs: HashMap::new(),
            expiry,
        };
        (tracker, expired_rx)
    }

    /// Apply one sync event and return the connection's new summary
    pub fn apply_event(&mut self, event: &SyncEvent) -> ActiveSync {
        let tracker = self.store.apply_event(event);
        let sync = compute_active_sync(tracker);
        self.settle(sync)
    }

    /// Replace a connection's tracker with a point-in-time summary
    ///
    /// Goes through the same recompute and expiry path as an event.
    pub fn seed(&mut self, key: TrackerKey, summary: &InformerSummary) -> ActiveSync {
        let tracker = ResourceTracker::from_summary(key, summary);
        let sync = compute_active_sync(&tracker);
        self.store.insert(tracker);
        self.settle(sync)
    }

    fn settle(&mut self, sync: ActiveSync) -> ActiveSync {
        let key = sync.key();
        self.expiry.cancel(&key);
        if is_sync_done(&sync) {
            tracing::info!(
                "[Expiry] {} finished ({}/{} done, {} errors)",
                key,
                sync.done_count,
                sync.total_resources,
                sync.error_count
            );
            self.expiry.arm(key.clone());
        }
        self.syncs.insert(key, sync.clone());
        sync
    }

    /// Apply a timer report, evicting the key if the report is current
    ///
    /// Returns `true` if something was evicted.
    pub fn handle_expiry(&mut self, expiry: &Expiry) -> bool {
        if !self.expiry.take_expired(expiry) {
            return false;
        }
        self.store.remove(&expiry.key);
        self.syncs.remove(&expiry.key);
        tracing::info!("[Expiry] Evicted {} after grace period", expiry.key);
        true
    }

    /// Drop a connection immediately, e.g. on disconnect
    pub fn remove(&mut self, key: &TrackerKey) -> Option<ActiveSync> {
        self.expiry.cancel(key);
        self.store.remove(key);
        let removed = self.syncs.remove(key);
        if removed.is_some() {
            tracing::info!("[Ingest] Removed tracker for {}", key);
        }
        removed
    }

    pub fn active_sync(&self, key: &TrackerKey) -> Option<&ActiveSync> {
        self.syncs.get(key)
    }

    pub fn active_syncs(&self) -> impl Iterator<Item = &ActiveSync> {
        self.syncs.values()
    }

    pub fn syncs(&self) -> &HashMap<TrackerKey, ActiveSync> {
        &self.syncs
    }

    pub fn tracker(&self, key: &TrackerKey) -> Option<&ResourceTracker> {
        self.store.get(key)
    }

    pub fn is_expiry_armed(&self, key: &TrackerKey) -> bool {
        self.expiry.is_armed(key)
    }

    pub fn len(&self) -> usize {
        self.syncs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syncs.is_empty()
    }

    /// Global counters over every live summary
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            active_count: self.syncs.len(),
            has_syncing: has_active_syncing(self.syncs.values()),
            progress: aggregate_progress(self.syncs.values()),
        }
    }

    /// Cancel every pending removal timer
    pub fn shutdown(&mut self) {
        self.expiry.cancel_all();
    }
}
