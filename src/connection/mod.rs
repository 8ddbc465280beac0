//! Connection Status Module
//!
//! Everything that looks at connections rather than individual resources:
//!
//! - **`client`** - seam to the external query/action layer
//! - **`correlator`** - started set, snapshot cache and the consumer view
//! - **`informer_state`** - single-connection informer view

/// External query/action seam
pub mod client;

/// Connection status correlation
pub mod correlator;

/// Per-connection informer view
pub mod informer_state;

pub use client::{ClientAction, ConnectionClient, InMemoryClient};
pub use correlator::{ConnectionStatusCorrelator, ConnectionStatusEntry, ConnectionStatusView, LifecycleChange};
pub use informer_state::{InformerStateView, InformerWatch, ResourceDetail};
