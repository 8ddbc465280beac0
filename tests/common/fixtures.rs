//! Event fixtures and runtime helpers

use informer_sync::realtime::{topics, EventBus};
use informer_sync::shared::{
    Connection, ConnectionSnapshot, InformerSummary, LifecycleEvent, MonitorConfig, ResourceSyncState, SyncEvent,
};
use std::time::Duration;

pub const PLUGIN: &str = "k8s";
pub const GRACE: Duration = Duration::from_secs(5);

pub fn sync_event(connection: &str, resource: &str, state: ResourceSyncState) -> SyncEvent {
    SyncEvent::new(PLUGIN, connection, resource, state)
}

pub fn test_config() -> MonitorConfig {
    MonitorConfig::builder()
        .grace_period(GRACE)
        .bus_capacity(64)
        .build()
        .expect("valid test config")
}

pub fn publish_sync(bus: &EventBus, connection: &str, resource: &str, state: ResourceSyncState) {
    bus.publish_json(topics::INFORMER_STATE, &sync_event(connection, resource, state))
        .expect("serializable event");
}

pub fn publish_lifecycle(bus: &EventBus, event: &LifecycleEvent) {
    bus.publish_json(topics::CONNECTION_STATUS, event)
        .expect("serializable event");
}

pub fn snapshot(entries: &[(&str, &str, &str)]) -> ConnectionSnapshot {
    let mut snapshot = ConnectionSnapshot::new();
    for (plugin, id, name) in entries {
        snapshot
            .entry(plugin.to_string())
            .or_default()
            .push(Connection::new(*id, *name));
    }
    snapshot
}

pub fn summary(resources: &[(&str, ResourceSyncState)]) -> InformerSummary {
    let mut summary = InformerSummary::default();
    for (resource, state) in resources {
        summary.resources.insert(resource.to_string(), *state);
    }
    summary.total_resources = summary.resources.len();
    summary
}

/// Let spawned tasks drain their queues without advancing time
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
