//! informer-sync - Informer Progress Tracking
//!
//! Tracks the real-time synchronization progress of many independent
//! informers (one per resource type, per connection, per plugin) and exposes
//! consistent aggregated progress and health views.
//!
//! # Overview
//!
//! Informers publish out-of-order, partial and sometimes duplicate
//! notifications. This library reconciles them into one coherent picture:
//!
//! - Per-connection resource state tables, updated last-write-wins
//! - Derived progress summaries at connection and global granularity
//! - Terminal completion detection and time-bounded eviction
//! - A started-connection view correlating snapshot queries, lifecycle events
//!   and per-resource sync events
//!
//! # Module Structure
//!
//! - **`shared`** - Payload, snapshot, configuration and error types
//! - **`sync`** - Tracker store, aggregation and expiry scheduling
//! - **`connection`** - Status correlation, per-connection informer view and
//!   the external client seam
//! - **`realtime`** - In-process named-topic event bus
//! - **`monitor`** - Runtime tying everything together
//! - **`error`** - Runtime and client error types
//!
//! # Feature Flags
//!
//! - **`cli`** - Builds the `informer-sync-replay` binary with a
//!   `tracing-subscriber` log sink
//!
//! # Usage
//!
//! ```rust,no_run
//! use informer_sync::connection::InMemoryClient;
//! use informer_sync::monitor::SyncMonitor;
//! use informer_sync::realtime::{topics, EventBus};
//! use informer_sync::shared::{MonitorConfig, ResourceSyncState, SyncEvent};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = EventBus::new(256);
//! let monitor = SyncMonitor::spawn(&bus, Arc::new(InMemoryClient::new()), MonitorConfig::from_env()?);
//!
//! let event = SyncEvent::new("kubernetes", "cluster-1", "core::v1::Pod", ResourceSyncState::Synced);
//! bus.publish_json(topics::INFORMER_STATE, &event)?;
//!
//! let status = monitor.status();
//! for (plugin, entries) in status.by_plugin() {
//!     println!("{}: {} connections", plugin, entries.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! All state mutation happens inside a single monitor task that applies one
//! message at a time. Timer tasks and query tasks only ever send messages back
//! into that loop.
//!
//! # Error Handling
//!
//! - Aggregation is pure and total
//! - Invalid bus payloads are logged and dropped at the ingestion boundary
//! - Snapshot query failures keep the last-known snapshot
//! - Action failures are returned to the caller

/// Shared types and data structures
pub mod shared;

/// Tracker store, aggregation and expiry
pub mod sync;

/// Connection status correlation
pub mod connection;

/// In-process event bus
pub mod realtime;

/// Monitor runtime
pub mod monitor;

/// Runtime error types
pub mod error;
