/**
 * Runtime Error Types
 *
 * This module defines the errors surfaced by the monitor runtime and the
 * external query/action layer.
 *
 * # Error Categories
 *
 * ## Client Errors
 *
 * Failures reported by the external query or action layer. Query failures are
 * swallowed by the monitor (the last-known snapshot stays in place); action
 * failures are returned to whoever invoked the action.
 *
 * ## Payload Errors
 *
 * Bus payloads that fail decoding or validation. These are logged and dropped
 * at the ingestion boundary; they only surface as values from the explicit
 * decode helpers.
 *
 * ## Runtime Errors
 *
 * The monitor task is gone, so commands can no longer be delivered.
 */

use crate::shared::{ConfigError, SharedError};
use thiserror::Error;

/// Failure reported by the external query/action layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// A snapshot query failed
    #[error("query '{operation}' failed: {message}")]
    Query {
        /// Query that failed
        operation: String,
        /// Human-readable error message
        message: String,
    },

    /// A connection action failed
    #[error("action '{operation}' failed for {plugin_id}/{connection_id}: {message}")]
    Action {
        /// Action that failed
        operation: String,
        plugin_id: String,
        connection_id: String,
        /// Human-readable error message
        message: String,
    },
}

impl ClientError {
    /// Create a new query error
    pub fn query(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new action error
    pub fn action(
        operation: impl Into<String>,
        plugin_id: impl Into<String>,
        connection_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Action {
            operation: operation.into(),
            plugin_id: plugin_id.into(),
            connection_id: connection_id.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the monitor runtime
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Payload(#[from] SharedError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The monitor task has stopped
    #[error("monitor is not running")]
    ChannelClosed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for MonitorError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::ChannelClosed
    }
}
