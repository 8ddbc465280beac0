/**
 * Topic Broadcasting
 *
 * This module provides the in-process event bus: one `tokio::sync::broadcast`
 * channel per named topic, created lazily on first use. Publishers and
 * subscribers only share topic names, never channel handles.
 *
 * # Delivery
 *
 * Delivery is at-most-once. A message published to a topic with no receivers
 * is dropped, and a receiver that falls more than the channel capacity behind
 * skips the overflow. Ordering is preserved per topic, never across topics.
 */

use crate::shared::config::MonitorConfig;
use crate::shared::error::SharedError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// One message on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Topic the message was published on
    pub topic: String,
    /// Topic-specific payload, decoded by the consumer
    pub payload: serde_json::Value,
    /// RFC3339 publish time
    pub timestamp: String,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Named-topic broadcast bus
///
/// Cheap to clone; clones share the same topics.
#[derive(Debug, Clone)]
pub struct EventBus {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<BusMessage>>>>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus whose topics buffer `capacity` messages per receiver
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Create a bus sized by `config.bus_capacity`
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.bus_capacity)
    }

    /// Per-receiver buffer size of every topic
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<BusMessage>>> {
        // The map stays consistent even if a holder panicked
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get or create the sender for a topic
    pub fn sender(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        let capacity = self.capacity;
        self.channels()
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .clone()
    }

    /// Subscribe a raw receiver to a topic
    pub fn receiver(&self, topic: &str) -> broadcast::Receiver<BusMessage> {
        self.sender(topic).subscribe()
    }

    /// Publish a payload to a topic
    ///
    /// Returns the number of receivers the message reached (0 if none).
    pub fn publish(&self, topic: &str, payload: serde_json::Value) -> usize {
        let sender = match self.channels().get(topic) {
            Some(sender) => sender.clone(),
            None => {
                tracing::debug!("[Bus] No subscribers on {}", topic);
                return 0;
            }
        };

        match sender.send(BusMessage::new(topic, payload)) {
            Ok(receivers) => {
                tracing::debug!("[Bus] Published on {} to {} receivers", topic, receivers);
                receivers
            }
            Err(_) => {
                tracing::debug!("[Bus] No subscribers on {}", topic);
                0
            }
        }
    }

    /// Serialize and publish a typed payload
    pub fn publish_json<T: Serialize>(&self, topic: &str, payload: &T) -> Result<usize, SharedError> {
        let value = serde_json::to_value(payload)?;
        Ok(self.publish(topic, value))
    }

    /// Number of live receivers on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.channels()
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Drop topics nobody listens to any more
    pub fn cleanup_inactive_channels(&self) {
        self.channels().retain(|_, sender| sender.receiver_count() > 0);
    }

    /// Number of topics with a channel
    pub fn topic_count(&self) -> usize {
        self.channels().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::shared::config::DEFAULT_BUS_CAPACITY)
    }
}
