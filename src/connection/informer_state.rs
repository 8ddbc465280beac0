//! # Per-Connection Informer State
//!
//! Lower-resolution consumer for a single connection: seeded from the
//! "get informer summary" query, then kept current by the connection's scoped
//! `{pluginID}/{connectionID}/informer/STATE` topic.
//!
//! Unlike the global tracker this view also keeps object counts and the last
//! structured error per resource, and it never expires on its own; it lives
//! as long as its [`InformerWatch`].

use crate::connection::client::ConnectionClient;
use crate::realtime::{topics, EventBus, SubscriptionScope};
use crate::shared::connection::InformerSummary;
use crate::shared::event::{ResourceSyncState, SyncErrorPayload, SyncEvent, TrackerKey};
use crate::sync::aggregator::{compute_active_sync, is_sync_done, ActiveSync};
use crate::sync::store::ResourceTracker;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Object counts and last error for one resource type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDetail {
    pub resource_count: i64,
    /// `-1` when unknown
    pub total_count: i64,
    pub error: Option<SyncErrorPayload>,
}

/// Informer state for one connection
#[derive(Debug, Clone, PartialEq)]
pub struct InformerStateView {
    tracker: ResourceTracker,
    details: HashMap<String, ResourceDetail>,
}

impl InformerStateView {
    pub fn new(key: TrackerKey) -> Self {
        Self {
            tracker: ResourceTracker::new(key),
            details: HashMap::new(),
        }
    }

    /// Seed from a point-in-time summary
    pub fn from_summary(key: TrackerKey, summary: &InformerSummary) -> Self {
        let details = summary
            .resources
            .keys()
            .map(|resource| {
                let detail = ResourceDetail {
                    resource_count: summary.resource_counts.get(resource).copied().unwrap_or(0),
                    total_count: -1,
                    error: None,
                };
                (resource.clone(), detail)
            })
            .collect();

        Self {
            tracker: ResourceTracker::from_summary(key, summary),
            details,
        }
    }

    pub fn key(&self) -> &TrackerKey {
        self.tracker.key()
    }

    /// Apply a scoped event
    ///
    /// Events for other connections are ignored and return `false`.
    pub fn apply_event(&mut self, event: &SyncEvent) -> bool {
        if event.plugin_id != self.tracker.plugin_id() || event.connection_id != self.tracker.connection_id() {
            tracing::debug!(
                "[Informer] {} ignoring event for {}",
                self.tracker.key(),
                event.tracker_key()
            );
            return false;
        }

        self.tracker.set_state(&event.resource_key, event.state);
        let detail = self.details.entry(event.resource_key.clone()).or_default();
        detail.resource_count = event.resource_count;
        detail.total_count = event.total_count;
        // a recovered informer clears its previous error
        detail.error = match event.state {
            ResourceSyncState::Error => event.error.clone(),
            _ => None,
        };
        true
    }

    pub fn state(&self, resource_key: &str) -> Option<ResourceSyncState> {
        self.tracker.state(resource_key)
    }

    pub fn detail(&self, resource_key: &str) -> Option<&ResourceDetail> {
        self.details.get(resource_key)
    }

    /// Objects listed so far for one resource type
    pub fn resource_count(&self, resource_key: &str) -> Option<i64> {
        self.details.get(resource_key).map(|detail| detail.resource_count)
    }

    /// Structured errors of resources currently in `Error`, sorted by key
    pub fn errors(&self) -> Vec<(&str, &SyncErrorPayload)> {
        let mut errors: Vec<_> = self
            .details
            .iter()
            .filter_map(|(key, detail)| detail.error.as_ref().map(|error| (key.as_str(), error)))
            .collect();
        errors.sort_by(|a, b| a.0.cmp(b.0));
        errors
    }

    pub fn active_sync(&self) -> ActiveSync {
        compute_active_sync(&self.tracker)
    }

    pub fn is_done(&self) -> bool {
        is_sync_done(&self.active_sync())
    }
}

/// Live [`InformerStateView`] for one connection
///
/// Dropping the watch cancels its subscription and update task.
#[derive(Debug)]
pub struct InformerWatch {
    state: watch::Receiver<InformerStateView>,
    scope: SubscriptionScope,
    task: JoinHandle<()>,
}

impl InformerWatch {
    /// Subscribe to the connection's scoped topic and seed from its summary
    ///
    /// The subscription is registered before the summary is fetched, so events
    /// published while the query is in flight are applied on top of it. A
    /// failed query starts from an empty view.
    pub async fn start<C: ConnectionClient>(bus: &EventBus, client: Arc<C>, key: TrackerKey) -> Self {
        let topic = topics::scoped_informer_state(&key.plugin_id, &key.connection_id);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scope = SubscriptionScope::new();
        scope.subscribe(bus, &topic, move |message| {
            let _ = tx.send(message);
        });

        let view = match client.get_informer_summary(&key.plugin_id, &key.connection_id).await {
            Ok(summary) => InformerStateView::from_summary(key, &summary),
            Err(e) => {
                tracing::warn!("[Informer] Summary for {} unavailable: {}", key, e);
                InformerStateView::new(key)
            }
        };

        let (state_tx, state_rx) = watch::channel(view.clone());
        let task = tokio::spawn(async move {
            let mut view = view;
            while let Some(message) = rx.recv().await {
                match SyncEvent::from_value(message.payload) {
                    Ok(event) => {
                        if view.apply_event(&event) {
                            state_tx.send_replace(view.clone());
                        }
                    }
                    Err(e) => {
                        tracing::warn!("[Informer] Dropping payload on {}: {}", message.topic, e);
                    }
                }
            }
        });

        Self {
            state: state_rx,
            scope,
            task,
        }
    }

    /// Current view
    pub fn current(&self) -> InformerStateView {
        self.state.borrow().clone()
    }

    /// Receiver notified on every applied event
    pub fn subscribe(&self) -> watch::Receiver<InformerStateView> {
        self.state.clone()
    }
}

impl Drop for InformerWatch {
    fn drop(&mut self) {
        self.scope.shutdown();
        self.task.abort();
    }
}
