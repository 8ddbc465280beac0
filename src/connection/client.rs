//! # Connection Client
//!
//! Seam to the external query/action layer.
//!
//! The monitor never talks to plugins directly. It asks a [`ConnectionClient`]
//! for snapshots and forwards user actions to it. [`InMemoryClient`] is a
//! fully in-process implementation used by the replay tool and by tests.

use crate::error::ClientError;
use crate::shared::connection::{Connection, ConnectionSnapshot, InformerSummary};
use crate::shared::event::TrackerKey;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// External query and action functions
pub trait ConnectionClient: Send + Sync + 'static {
    /// "list all connections", keyed by plugin id
    fn list_connections(&self) -> impl Future<Output = Result<ConnectionSnapshot, ClientError>> + Send;

    /// Point-in-time informer summary for one connection
    fn get_informer_summary(
        &self,
        plugin_id: &str,
        connection_id: &str,
    ) -> impl Future<Output = Result<InformerSummary, ClientError>> + Send;

    /// Stop a connection; the resulting lifecycle event updates local state
    fn stop_connection(
        &self,
        plugin_id: &str,
        connection_id: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Restart a connection's informers
    fn start_connection_informer(
        &self,
        plugin_id: &str,
        connection_id: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Action recorded by [`InMemoryClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    StopConnection(TrackerKey),
    StartInformer(TrackerKey),
}

#[derive(Debug, Default)]
struct InMemoryState {
    snapshot: ConnectionSnapshot,
    summaries: HashMap<TrackerKey, InformerSummary>,
    actions: Vec<ClientAction>,
    fail_queries: bool,
    fail_actions: bool,
    list_calls: usize,
}

/// In-process client backed by plain maps
#[derive(Debug, Default)]
pub struct InMemoryClient {
    state: Mutex<InMemoryState>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a connection in the snapshot
    pub fn upsert_connection(&self, plugin_id: &str, connection: Connection) {
        let mut state = self.state();
        let connections = state.snapshot.entry(plugin_id.to_string()).or_default();
        match connections.iter_mut().find(|existing| existing.id == connection.id) {
            Some(existing) => *existing = connection,
            None => connections.push(connection),
        }
    }

    pub fn set_snapshot(&self, snapshot: ConnectionSnapshot) {
        self.state().snapshot = snapshot;
    }

    pub fn set_summary(&self, key: TrackerKey, summary: InformerSummary) {
        self.state().summaries.insert(key, summary);
    }

    /// Make every query fail until reset
    pub fn fail_queries(&self, fail: bool) {
        self.state().fail_queries = fail;
    }

    /// Make every action fail until reset
    pub fn fail_actions(&self, fail: bool) {
        self.state().fail_actions = fail;
    }

    /// Actions invoked so far, oldest first
    pub fn actions(&self) -> Vec<ClientAction> {
        self.state().actions.clone()
    }

    /// Number of "list all connections" calls, successful or not
    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    fn record(&self, operation: &str, action: ClientAction) -> Result<(), ClientError> {
        let mut state = self.state();
        if state.fail_actions {
            let key = match &action {
                ClientAction::StopConnection(key) | ClientAction::StartInformer(key) => key.clone(),
            };
            return Err(ClientError::action(
                operation,
                key.plugin_id,
                key.connection_id,
                "rejected",
            ));
        }
        state.actions.push(action);
        Ok(())
    }
}

impl ConnectionClient for InMemoryClient {
    async fn list_connections(&self) -> Result<ConnectionSnapshot, ClientError> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.fail_queries {
            return Err(ClientError::query("list connections", "unavailable"));
        }
        Ok(state.snapshot.clone())
    }

    async fn get_informer_summary(
        &self,
        plugin_id: &str,
        connection_id: &str,
    ) -> Result<InformerSummary, ClientError> {
        let state = self.state();
        if state.fail_queries {
            return Err(ClientError::query("get informer summary", "unavailable"));
        }
        Ok(state
            .summaries
            .get(&TrackerKey::new(plugin_id, connection_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn stop_connection(&self, plugin_id: &str, connection_id: &str) -> Result<(), ClientError> {
        self.record(
            "stop connection",
            ClientAction::StopConnection(TrackerKey::new(plugin_id, connection_id)),
        )
    }

    async fn start_connection_informer(
        &self,
        plugin_id: &str,
        connection_id: &str,
    ) -> Result<(), ClientError> {
        self.record(
            "start connection informer",
            ClientAction::StartInformer(TrackerKey::new(plugin_id, connection_id)),
        )
    }
}
