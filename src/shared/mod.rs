//! Shared Module
//!
//! This module contains the types shared by every layer of the crate: the
//! event payloads carried on the bus, snapshot types returned by the query
//! layer, configuration and error types.
//!
//! # Overview
//!
//! All payload types derive `Serialize`/`Deserialize` and mirror the wire
//! names used by informer publishers (`pluginID`, `connectionID`, camelCase
//! otherwise).

/// Informer and lifecycle event payloads
pub mod event;

/// Connection snapshot and informer summary types
pub mod connection;

/// Shared error types
pub mod error;

/// Monitor configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, MonitorConfig, MonitorConfigBuilder};
pub use connection::{Connection, ConnectionSnapshot, InformerSummary};
pub use error::SharedError;
pub use event::{LifecycleEvent, ResourceSyncState, SyncErrorPayload, SyncEvent, TrackerKey};
