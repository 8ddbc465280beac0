//! End-to-end monitor tests over the in-process bus

use crate::common::*;
use assert_matches::assert_matches;
use informer_sync::connection::{ClientAction, InMemoryClient};
use informer_sync::error::{ClientError, MonitorError};
use informer_sync::monitor::SyncMonitor;
use informer_sync::realtime::{topics, EventBus};
use informer_sync::shared::{Connection, LifecycleEvent, ResourceSyncState, TrackerKey};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_status_view_follows_scenario() {
    let bus = EventBus::new(64);
    let client = Arc::new(InMemoryClient::new());
    client.set_snapshot(snapshot(&[(PLUGIN, "cluster-1", "Production")]));
    let monitor = SyncMonitor::spawn(&bus, Arc::clone(&client), test_config());
    settle().await;

    publish_lifecycle(&bus, &LifecycleEvent::connected(PLUGIN, "cluster-1"));
    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Synced);
    publish_sync(&bus, "cluster-1", "Service", ResourceSyncState::Syncing);
    settle().await;

    let status = monitor.status();
    assert_eq!(status.connected_count, 1);
    assert!(status.has_syncing);
    let entry = status.entry(PLUGIN, "cluster-1").expect("started entry");
    assert_eq!(entry.name, "Production");
    assert!(entry.is_syncing);
    crate::assert_approx_eq!(entry.sync.as_ref().map(|sync| sync.progress).unwrap_or_default(), 0.5);

    publish_sync(&bus, "cluster-1", "Service", ResourceSyncState::Synced);
    settle().await;
    let status = monitor.status();
    assert!(!status.has_syncing);
    crate::assert_approx_eq!(status.aggregate_progress, 1.0);

    tokio::time::sleep(GRACE + Duration::from_millis(10)).await;
    settle().await;

    let status = monitor.status();
    // evicted from the aggregate map but still started
    assert_eq!(status.connected_count, 1);
    assert!(status.entry(PLUGIN, "cluster-1").and_then(|entry| entry.sync.as_ref()).is_none());
    assert!(crate::assert_ok!(monitor.active_syncs().await).is_empty());
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_grouped_by_plugin() {
    let bus = EventBus::new(64);
    let monitor = SyncMonitor::spawn(&bus, Arc::new(InMemoryClient::new()), test_config());

    publish_lifecycle(&bus, &LifecycleEvent::connected("k8s", "cluster-2"));
    publish_lifecycle(&bus, &LifecycleEvent::connected("k8s", "cluster-1"));
    publish_lifecycle(&bus, &LifecycleEvent::connected("aws", "prod"));
    settle().await;

    let status = monitor.status();
    let groups = status.by_plugin();
    assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["aws", "k8s"]);
    let k8s: Vec<&str> = groups["k8s"].iter().map(|entry| entry.connection_id.as_str()).collect();
    assert_eq!(k8s, vec!["cluster-1", "cluster-2"]);
    // unknown names fall back to the connection id
    assert_eq!(groups["aws"][0].name, "prod");
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_errors_surface_as_data() {
    let bus = EventBus::new(64);
    let monitor = SyncMonitor::spawn(&bus, Arc::new(InMemoryClient::new()), test_config());

    publish_sync(&bus, "cluster-1", "Secret", ResourceSyncState::Error);
    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Synced);
    settle().await;

    let status = monitor.status();
    assert_eq!(status.error_count, 1);
    let entry = status.entry(PLUGIN, "cluster-1").expect("started by sync event");
    assert!(entry.has_errors);
    assert!(!entry.is_syncing);

    let summary = crate::assert_ok!(monitor.summary().await);
    assert_eq!(summary.active_count, 1);
    assert!(!summary.has_syncing);
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_payloads_are_dropped() {
    let bus = EventBus::new(64);
    let monitor = SyncMonitor::spawn(&bus, Arc::new(InMemoryClient::new()), test_config());

    bus.publish(topics::INFORMER_STATE, json!({ "pluginID": "k8s" }));
    bus.publish(
        topics::INFORMER_STATE,
        json!({ "pluginID": "", "connectionID": "c", "resourceKey": "Pod", "state": "synced" }),
    );
    bus.publish(topics::CONNECTION_STATUS, json!("not an object"));
    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Syncing);
    settle().await;

    let syncs = crate::assert_ok!(monitor.active_syncs().await);
    assert_eq!(syncs.len(), 1);
    assert_eq!(syncs[0].key(), TrackerKey::new(PLUGIN, "cluster-1"));
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_then_late_replay() {
    let bus = EventBus::new(64);
    let monitor = SyncMonitor::spawn(&bus, Arc::new(InMemoryClient::new()), test_config());

    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Synced);
    publish_sync(&bus, "cluster-1", "Service", ResourceSyncState::Syncing);
    settle().await;
    publish_lifecycle(&bus, &LifecycleEvent::disconnected(PLUGIN, "cluster-1"));
    settle().await;
    assert_eq!(monitor.status().connected_count, 0);

    publish_sync(&bus, "cluster-1", "Service", ResourceSyncState::Synced);
    settle().await;

    let syncs = crate::assert_ok!(monitor.active_syncs().await);
    assert_eq!(syncs.len(), 1);
    assert_eq!(syncs[0].total_resources, 1);
    assert_eq!(monitor.status().connected_count, 1);
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_refresh_picks_up_new_metadata() {
    let bus = EventBus::new(64);
    let client = Arc::new(InMemoryClient::new());
    let monitor = SyncMonitor::spawn(&bus, Arc::clone(&client), test_config());
    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Syncing);
    settle().await;
    assert_eq!(monitor.status().entries[0].name, "cluster-1");

    client.upsert_connection(PLUGIN, Connection::new("cluster-1", "Staging").with_avatar("k8s.svg"));
    crate::assert_ok!(monitor.refresh());
    settle().await;

    let status = monitor.status();
    assert_eq!(status.entries[0].name, "Staging");
    assert_eq!(status.entries[0].avatar.as_deref(), Some("k8s.svg"));
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_actions_delegate_and_propagate_failures() {
    let bus = EventBus::new(64);
    let client = Arc::new(InMemoryClient::new());
    let monitor = SyncMonitor::spawn(&bus, Arc::clone(&client), test_config());

    crate::assert_ok!(monitor.disconnect(PLUGIN, "cluster-1").await);
    crate::assert_ok!(monitor.retry_informer(PLUGIN, "cluster-1").await);
    let key = TrackerKey::new(PLUGIN, "cluster-1");
    assert_eq!(
        client.actions(),
        vec![ClientAction::StopConnection(key.clone()), ClientAction::StartInformer(key)]
    );

    client.fail_actions(true);
    let result = monitor.retry_informer(PLUGIN, "cluster-1").await;
    assert_matches!(result, Err(MonitorError::Client(ClientError::Action { .. })));
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_status_watch_notified() {
    let bus = EventBus::new(64);
    let monitor = SyncMonitor::spawn(&bus, Arc::new(InMemoryClient::new()), test_config());
    let mut updates = monitor.subscribe_status();
    updates.borrow_and_update();

    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Pending);
    crate::assert_ok!(crate::assert_ok!(tokio::time::timeout(Duration::from_secs(1), updates.changed()).await));
    assert_eq!(updates.borrow().connected_count, 1);
    monitor.shutdown().await;
}
