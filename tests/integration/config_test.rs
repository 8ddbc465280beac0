//! Configuration effects on a running monitor

use crate::common::*;
use informer_sync::connection::InMemoryClient;
use informer_sync::monitor::SyncMonitor;
use informer_sync::realtime::EventBus;
use informer_sync::shared::{LifecycleEvent, MonitorConfig, ResourceSyncState};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_operation_display_keeps_finished_sync_longer() {
    let bus = EventBus::new(64);
    let monitor = SyncMonitor::spawn(&bus, Arc::new(InMemoryClient::new()), MonitorConfig::operation_display());

    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Synced);
    settle().await;

    tokio::time::sleep(GRACE * 2).await;
    settle().await;
    assert_eq!(crate::assert_ok!(monitor.active_syncs().await).len(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    assert!(crate::assert_ok!(monitor.active_syncs().await).is_empty());
    monitor.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_refetch_can_be_disabled() {
    let config = crate::assert_ok!(MonitorConfig::from_toml_str(
        r#"
        grace_period_ms = 1000
        refetch_on_lifecycle = false
        "#,
    ));
    assert_eq!(config.grace_period, Duration::from_secs(1));

    let bus = EventBus::from_config(&config);
    let client = Arc::new(InMemoryClient::new());
    let monitor = SyncMonitor::spawn(&bus, Arc::clone(&client), config);
    settle().await;

    publish_lifecycle(&bus, &LifecycleEvent::connected(PLUGIN, "cluster-1"));
    publish_lifecycle(&bus, &LifecycleEvent::connected(PLUGIN, "cluster-2"));
    settle().await;

    // only the initial fetch
    assert_eq!(client.list_calls(), 1);
    assert_eq!(monitor.status().connected_count, 2);
    monitor.shutdown().await;
}
