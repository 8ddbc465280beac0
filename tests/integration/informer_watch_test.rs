//! Per-connection informer view over the scoped topic

use crate::common::*;
use informer_sync::connection::{InMemoryClient, InformerWatch};
use informer_sync::realtime::{topics, EventBus};
use informer_sync::shared::{ResourceSyncState, SyncErrorPayload, TrackerKey};
use std::sync::Arc;
use std::time::Duration;

fn forbidden() -> SyncErrorPayload {
    SyncErrorPayload {
        code: "FORBIDDEN".to_string(),
        title: "Access denied".to_string(),
        message: "secrets is forbidden".to_string(),
        suggestions: vec!["Grant list on secrets".to_string()],
    }
}

#[tokio::test]
async fn test_watch_ignores_global_topic_and_other_connections() {
    let bus = EventBus::new(64);
    let client = Arc::new(InMemoryClient::new());
    let key = TrackerKey::new(PLUGIN, "cluster-1");
    client.set_summary(key.clone(), summary(&[("Pod", ResourceSyncState::Syncing)]));

    let watch = InformerWatch::start(&bus, client, key).await;
    let mut updates = watch.subscribe();

    // global topic is not this view's source
    publish_sync(&bus, "cluster-1", "Pod", ResourceSyncState::Synced);
    // scoped topic of another connection
    let other = topics::scoped_informer_state(PLUGIN, "cluster-2");
    crate::assert_ok!(bus.publish_json(&other, &sync_event("cluster-2", "Pod", ResourceSyncState::Synced)));
    settle().await;
    assert_eq!(watch.current().state("Pod"), Some(ResourceSyncState::Syncing));

    let scoped = topics::scoped_informer_state(PLUGIN, "cluster-1");
    let event = sync_event("cluster-1", "Secret", ResourceSyncState::Error).with_error(forbidden());
    crate::assert_ok!(bus.publish_json(&scoped, &event));
    crate::assert_ok!(crate::assert_ok!(tokio::time::timeout(Duration::from_secs(1), updates.changed()).await));

    let view = watch.current();
    let errors = view.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "Secret");
    assert_eq!(errors[0].1.code, "FORBIDDEN");
    assert_eq!(view.active_sync().total_resources, 2);
    assert_eq!(view.active_sync().error_count, 1);
}

#[tokio::test]
async fn test_drop_releases_subscription() {
    let bus = EventBus::new(64);
    let key = TrackerKey::new(PLUGIN, "cluster-1");
    let scoped = topics::scoped_informer_state(PLUGIN, "cluster-1");

    let watch = InformerWatch::start(&bus, Arc::new(InMemoryClient::new()), key).await;
    assert_eq!(bus.subscriber_count(&scoped), 1);

    drop(watch);
    settle().await;
    assert_eq!(bus.subscriber_count(&scoped), 0);
}
