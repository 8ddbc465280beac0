//! # Sync Monitor
//!
//! Runtime that wires the bus, the tracker and the correlator together.
//!
//! ## Architecture
//!
//! One task owns all mutable state ([`ActiveSyncTracker`] and
//! [`ConnectionStatusCorrelator`]) and drains a single `tokio::select!` loop:
//!
//! - decoded `informer/STATE` and `connection/status` payloads
//! - removal timer reports from the expiry scheduler
//! - snapshot query results
//! - commands from [`SyncMonitorHandle`]
//!
//! Each message runs to completion before the next one is taken, so no state
//! is ever shared between concurrent writers. After every message that changes
//! something, a fresh [`ConnectionStatusView`] is published on a `watch`
//! channel.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use informer_sync::connection::InMemoryClient;
//! use informer_sync::monitor::SyncMonitor;
//! use informer_sync::realtime::EventBus;
//! use informer_sync::shared::MonitorConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), informer_sync::error::MonitorError> {
//! let bus = EventBus::new(256);
//! let client = Arc::new(InMemoryClient::new());
//! let monitor = SyncMonitor::spawn(&bus, client, MonitorConfig::default());
//!
//! let status = monitor.status();
//! println!("{} connections, {:.0}% synced", status.connected_count, status.aggregate_progress * 100.0);
//!
//! monitor.disconnect("kubernetes", "cluster-1").await?;
//! monitor.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::connection::client::ConnectionClient;
use crate::connection::correlator::{ConnectionStatusCorrelator, ConnectionStatusView, LifecycleChange};
use crate::error::MonitorError;
use crate::realtime::{topics, BusMessage, EventBus, SubscriptionScope};
use crate::shared::config::MonitorConfig;
use crate::shared::connection::ConnectionSnapshot;
use crate::shared::event::{LifecycleEvent, SyncEvent, TrackerKey};
use crate::sync::{ActiveSync, ActiveSyncTracker, Expiry, SyncSummary};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Messages applied by the monitor loop
#[derive(Debug)]
enum Inbound {
    Sync(SyncEvent),
    Lifecycle(LifecycleEvent),
    /// Snapshot result tagged with the sequence number of its fetch
    Snapshot(u64, ConnectionSnapshot),
    Refresh,
    ActiveSyncs(oneshot::Sender<Vec<ActiveSync>>),
    Summary(oneshot::Sender<SyncSummary>),
    Shutdown,
}

/// Entry point for spawning a monitor
pub struct SyncMonitor;

impl SyncMonitor {
    /// Subscribe to the global topics and start the monitor task
    ///
    /// An initial snapshot fetch is issued immediately. Must be called from
    /// within a Tokio runtime.
    pub fn spawn<C: ConnectionClient>(bus: &EventBus, client: Arc<C>, config: MonitorConfig) -> SyncMonitorHandle<C> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatusView::default());

        let mut scope = SubscriptionScope::new();
        let sync_tx = inbound_tx.clone();
        scope.subscribe(bus, topics::INFORMER_STATE, move |message| {
            if let Some(event) = decode(message, SyncEvent::from_value) {
                let _ = sync_tx.send(Inbound::Sync(event));
            }
        });
        let lifecycle_tx = inbound_tx.clone();
        scope.subscribe(bus, topics::CONNECTION_STATUS, move |message| {
            if let Some(event) = decode(message, LifecycleEvent::from_value) {
                let _ = lifecycle_tx.send(Inbound::Lifecycle(event));
            }
        });

        let (tracker, expired_rx) = ActiveSyncTracker::new(config.grace_period);
        let mut state = MonitorLoop {
            tracker,
            correlator: ConnectionStatusCorrelator::new(),
            client: Arc::clone(&client),
            inbound_tx: inbound_tx.clone(),
            status_tx,
            config,
            snapshot_requested: 0,
            snapshot_applied: 0,
        };

        tracing::info!(
            "[Monitor] Starting (grace period {:?})",
            state.config.grace_period
        );
        state.fetch_snapshot();
        let task = tokio::spawn(state.run(inbound_rx, expired_rx));

        SyncMonitorHandle {
            client,
            inbound_tx,
            status_rx,
            scope,
            task: Some(task),
        }
    }
}

fn decode<T, F>(message: BusMessage, decode: F) -> Option<T>
where
    F: FnOnce(serde_json::Value) -> Result<T, crate::shared::SharedError>,
{
    match decode(message.payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("[Monitor] Dropping payload on {}: {}", message.topic, e);
            None
        }
    }
}

struct MonitorLoop<C> {
    tracker: ActiveSyncTracker,
    correlator: ConnectionStatusCorrelator,
    client: Arc<C>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    status_tx: watch::Sender<ConnectionStatusView>,
    config: MonitorConfig,
    /// Sequence number of the most recently issued snapshot fetch
    snapshot_requested: u64,
    /// Sequence number of the snapshot currently applied
    snapshot_applied: u64,
}

impl<C: ConnectionClient> MonitorLoop<C> {
    async fn run(
        mut self,
        mut inbound_rx: mpsc::UnboundedReceiver<Inbound>,
        mut expired_rx: mpsc::UnboundedReceiver<Expiry>,
    ) {
        loop {
            let changed = tokio::select! {
                message = inbound_rx.recv() => match message {
                    Some(Inbound::Shutdown) | None => break,
                    Some(message) => self.handle(message),
                },
                Some(expiry) = expired_rx.recv() => self.tracker.handle_expiry(&expiry),
            };
            if changed {
                self.publish();
            }
        }

        self.tracker.shutdown();
        tracing::info!("[Monitor] Stopped");
    }

    /// Apply one message; returns whether the view may have changed
    fn handle(&mut self, message: Inbound) -> bool {
        match message {
            Inbound::Sync(event) => {
                self.correlator.on_sync_event(&event.tracker_key());
                self.tracker.apply_event(&event);
                true
            }
            Inbound::Lifecycle(event) => {
                if let LifecycleChange::Stopped { .. } = self.correlator.on_lifecycle(&event) {
                    self.tracker.remove(&event.tracker_key());
                }
                if self.config.refetch_on_lifecycle {
                    self.fetch_snapshot();
                }
                true
            }
            Inbound::Snapshot(seq, snapshot) => {
                // fetches run concurrently; a slow older query must not
                // replace a newer result
                if seq <= self.snapshot_applied {
                    tracing::debug!(
                        "[Monitor] Skipping stale snapshot #{} (have #{})",
                        seq,
                        self.snapshot_applied
                    );
                    return false;
                }
                self.snapshot_applied = seq;
                self.correlator.apply_snapshot(snapshot);
                true
            }
            Inbound::Refresh => {
                self.fetch_snapshot();
                false
            }
            Inbound::ActiveSyncs(reply) => {
                let _ = reply.send(self.tracker.active_syncs().cloned().collect());
                false
            }
            Inbound::Summary(reply) => {
                let _ = reply.send(self.tracker.summary());
                false
            }
            Inbound::Shutdown => false,
        }
    }

    fn publish(&self) {
        let view = self.correlator.build_view(self.tracker.syncs());
        self.status_tx.send_replace(view);
    }

    /// Query the snapshot off-loop; the result comes back as a message
    fn fetch_snapshot(&mut self) {
        self.snapshot_requested += 1;
        let seq = self.snapshot_requested;
        let client = Arc::clone(&self.client);
        let inbound_tx = self.inbound_tx.clone();
        tokio::spawn(async move {
            match client.list_connections().await {
                Ok(snapshot) => {
                    let _ = inbound_tx.send(Inbound::Snapshot(seq, snapshot));
                }
                Err(e) => {
                    // keep showing the last snapshot; the next trigger retries
                    tracing::warn!("[Monitor] Snapshot fetch failed: {}", e);
                }
            }
        });
    }
}

/// Handle to a running monitor
///
/// Dropping the handle cancels the bus subscriptions and sends the monitor
/// task a shutdown message, which it applies after any messages already
/// queued.
pub struct SyncMonitorHandle<C> {
    client: Arc<C>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    status_rx: watch::Receiver<ConnectionStatusView>,
    scope: SubscriptionScope,
    task: Option<JoinHandle<()>>,
}

impl<C: ConnectionClient> SyncMonitorHandle<C> {
    /// Latest consumer view
    pub fn status(&self) -> ConnectionStatusView {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified whenever the view changes
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatusView> {
        self.status_rx.clone()
    }

    /// Every live `ActiveSync`, including connections that are not started
    pub async fn active_syncs(&self) -> Result<Vec<ActiveSync>, MonitorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inbound_tx.send(Inbound::ActiveSyncs(reply_tx))?;
        reply_rx.await.map_err(|_| MonitorError::ChannelClosed)
    }

    /// Global progress counters
    pub async fn summary(&self) -> Result<SyncSummary, MonitorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inbound_tx.send(Inbound::Summary(reply_tx))?;
        reply_rx.await.map_err(|_| MonitorError::ChannelClosed)
    }

    /// Re-fetch the connection snapshot
    pub fn refresh(&self) -> Result<(), MonitorError> {
        self.inbound_tx.send(Inbound::Refresh)?;
        Ok(())
    }

    /// Ask the backend to stop a connection
    ///
    /// Local state only changes when the resulting `DISCONNECTED` event arrives.
    pub async fn disconnect(&self, plugin_id: &str, connection_id: &str) -> Result<(), MonitorError> {
        let key = TrackerKey::new(plugin_id, connection_id);
        tracing::info!("[Monitor] Disconnect requested for {}", key);
        self.client.stop_connection(plugin_id, connection_id).await?;
        Ok(())
    }

    /// Ask the backend to restart a connection's informers
    pub async fn retry_informer(&self, plugin_id: &str, connection_id: &str) -> Result<(), MonitorError> {
        let key = TrackerKey::new(plugin_id, connection_id);
        tracing::info!("[Monitor] Informer retry requested for {}", key);
        self.client.start_connection_informer(plugin_id, connection_id).await?;
        Ok(())
    }

    /// Cancel subscriptions and timers, then wait for the task to finish
    pub async fn shutdown(mut self) {
        self.scope.shutdown();
        let _ = self.inbound_tx.send(Inbound::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("[Monitor] Task ended abnormally: {}", e);
            }
        }
    }
}

impl<C> Drop for SyncMonitorHandle<C> {
    fn drop(&mut self) {
        self.scope.shutdown();
        let _ = self.inbound_tx.send(Inbound::Shutdown);
    }
}
