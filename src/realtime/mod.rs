//! Real-time Event Bus
//!
//! In-process transport for informer notifications.
//!
//! # Architecture
//!
//! - **`broadcast`** - `EventBus`: one broadcast channel per named topic
//! - **`subscription`** - handler registration with cancel handles and scopes
//! - **`topics`** - well-known topic names
//!
//! # Topics
//!
//! - `informer/STATE` - `SyncEvent` payloads for every plugin and connection
//! - `connection/status` - `LifecycleEvent` payloads
//! - `{pluginID}/{connectionID}/informer/STATE` - `SyncEvent`s for one connection
//!
//! # Example
//!
//! ```rust,no_run
//! use informer_sync::realtime::{topics, EventBus, SubscriptionScope};
//!
//! # async fn example() {
//! let bus = EventBus::new(256);
//! let mut scope = SubscriptionScope::new();
//! scope.subscribe(&bus, topics::INFORMER_STATE, |message| {
//!     println!("{}", message.payload);
//! });
//! bus.publish(topics::INFORMER_STATE, serde_json::json!({"state": "synced"}));
//! scope.shutdown();
//! # }
//! ```

/// Topic broadcasting
pub mod broadcast;

/// Subscription handles and scopes
pub mod subscription;

/// Topic names
pub mod topics;

pub use broadcast::{BusMessage, EventBus};
pub use subscription::{SubscriptionHandle, SubscriptionScope};
