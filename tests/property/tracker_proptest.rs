//! Property-based tests for tracker ingestion

use informer_sync::shared::{ResourceSyncState, SyncEvent, TrackerKey};
use informer_sync::sync::{compute_active_sync, ActiveSyncTracker, TrackerStore};
use proptest::prelude::*;
use std::time::Duration;

/// Forward path for one resource: optional Pending, optional Syncing, then an
/// optional terminal state
fn forward_path() -> impl Strategy<Value = Vec<ResourceSyncState>> {
    (
        any::<bool>(),
        any::<bool>(),
        prop::option::of(prop_oneof![
            Just(ResourceSyncState::Synced),
            Just(ResourceSyncState::Error),
            Just(ResourceSyncState::Cancelled),
        ]),
    )
        .prop_map(|(pending, syncing, terminal)| {
            let mut path = Vec::new();
            if pending {
                path.push(ResourceSyncState::Pending);
            }
            if syncing {
                path.push(ResourceSyncState::Syncing);
            }
            path.extend(terminal);
            path
        })
}

/// Interleave per-resource forward paths in a random but order-preserving way
fn forward_sequence() -> impl Strategy<Value = Vec<(usize, ResourceSyncState)>> {
    prop::collection::vec(forward_path(), 1..8).prop_flat_map(|paths| {
        let slots: Vec<usize> = paths
            .iter()
            .enumerate()
            .flat_map(|(resource, path)| std::iter::repeat(resource).take(path.len()))
            .collect();
        let len = slots.len();
        Just(slots).prop_shuffle().prop_map(move |order| {
            let mut cursors = vec![0usize; paths.len()];
            let mut sequence = Vec::with_capacity(len);
            for resource in order {
                sequence.push((resource, paths[resource][cursors[resource]]));
                cursors[resource] += 1;
            }
            sequence
        })
    })
}

fn event(resource: usize, state: ResourceSyncState) -> SyncEvent {
    SyncEvent::new("k8s", "cluster-1", format!("resource-{}", resource), state)
}

proptest! {
    #[test]
    fn test_done_count_monotonic_under_forward_transitions(sequence in forward_sequence()) {
        let mut store = TrackerStore::new();
        let mut previous = 0usize;
        for (resource, state) in sequence {
            let sync = compute_active_sync(store.apply_event(&event(resource, state)));
            prop_assert!(sync.done_count >= previous);
            previous = sync.done_count;
        }
    }

    #[test]
    fn test_repeated_event_is_idempotent(
        prefix in prop::collection::vec((0usize..4, 0usize..5), 0..12),
        last in (0usize..4, 0usize..5),
    ) {
        let states = [
            ResourceSyncState::Pending,
            ResourceSyncState::Syncing,
            ResourceSyncState::Synced,
            ResourceSyncState::Error,
            ResourceSyncState::Cancelled,
        ];
        let mut store = TrackerStore::new();
        for (resource, state) in prefix {
            store.apply_event(&event(resource, states[state]));
        }

        let repeated = event(last.0, states[last.1]);
        let once = compute_active_sync(store.apply_event(&repeated));
        let twice = compute_active_sync(store.apply_event(&repeated));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_removed_key_replays_fresh(replayed in 0usize..4, history in prop::collection::vec(0usize..4, 1..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let _guard = runtime.enter();

        let (mut tracker, _expired) = ActiveSyncTracker::new(Duration::from_secs(5));
        for resource in history {
            tracker.apply_event(&event(resource, ResourceSyncState::Synced));
        }
        let key = TrackerKey::new("k8s", "cluster-1");
        prop_assert!(tracker.remove(&key).is_some());
        prop_assert!(!tracker.is_expiry_armed(&key));

        let sync = tracker.apply_event(&event(replayed, ResourceSyncState::Syncing));
        prop_assert_eq!(sync.total_resources, 1);
        prop_assert_eq!(sync.done_count, 0);
        tracker.shutdown();
    }
}
