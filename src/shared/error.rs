//! Payload errors
//!
//! Raised by [`SyncEvent::from_value`](crate::shared::SyncEvent::from_value)
//! and [`LifecycleEvent::from_value`](crate::shared::LifecycleEvent::from_value)
//! when a bus payload cannot be decoded, or decodes but names no connection
//! or resource. Consumers log these and drop the payload.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Payload is not the expected JSON shape
    #[error("malformed payload: {message}")]
    SerializationError { message: String },

    /// Payload decoded but a field is out of range
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },
}

impl SharedError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Offending field, for validation failures
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            Self::SerializationError { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
