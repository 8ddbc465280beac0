/**
 * Topic Subscriptions
 *
 * `EventBus::subscribe(topic, handler)` registers a handler and returns a
 * `SubscriptionHandle`. The handler runs on a dedicated forwarding task, one
 * message at a time, in publish order. Canceling or dropping the handle stops
 * delivery.
 *
 * `EventBus::stream(topic)` is the pull-based alternative for consumers that
 * would rather `.next().await` than register a callback.
 *
 * `SubscriptionScope` is the lifetime owner for a group of subscriptions
 * (one consumer, one screen, one monitor) and cancels all of them together on
 * `shutdown()` or drop.
 *
 * # Connection Management
 *
 * - Lagged receivers log the number of skipped messages and keep going
 * - A closed channel ends the forwarding task
 */

use crate::realtime::broadcast::{BusMessage, EventBus};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Cancel handle for one subscription
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: Uuid,
    topic: String,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether the forwarding task is still running
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop delivering messages to the handler
    pub fn cancel(self) {
        // dropping aborts the task
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("[Bus] Subscription {} on {} canceled", self.id, self.topic);
    }
}

impl EventBus {
    /// Run `handler` for every message published on `topic`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, topic: &str, mut handler: F) -> SubscriptionHandle
    where
        F: FnMut(BusMessage) + Send + 'static,
    {
        let id = Uuid::new_v4();
        let mut rx = self.receiver(topic);
        let task_topic = topic.to_string();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => handler(message),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Bus] Subscriber on {} lagged, skipped {} messages",
                            task_topic,
                            skipped
                        );
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("[Bus] Topic {} closed, ending subscription", task_topic);
                        return;
                    }
                }
            }
        });

        tracing::debug!("[Bus] Subscription {} on {} active", id, topic);
        SubscriptionHandle {
            id,
            topic: topic.to_string(),
            task,
        }
    }

    /// Messages published on `topic` from now on, as a stream
    ///
    /// Ends when the topic's channel closes. Lagged messages are skipped.
    pub fn stream(&self, topic: &str) -> impl Stream<Item = BusMessage> + Send + 'static {
        let rx = self.receiver(topic);
        let topic = topic.to_string();

        stream::unfold((rx, topic), |(mut rx, topic)| async move {
            loop {
                match rx.recv().await {
                    Ok(message) => return Some((message, (rx, topic))),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("[Bus] Stream on {} lagged, skipped {} messages", topic, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("[Bus] Topic {} closed, ending stream", topic);
                        return None;
                    }
                }
            }
        })
    }
}

/// Owner of a group of subscriptions that share a lifetime
#[derive(Debug, Default)]
pub struct SubscriptionScope {
    handles: Vec<SubscriptionHandle>,
}

impl SubscriptionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a subscription
    pub fn add(&mut self, handle: SubscriptionHandle) {
        self.handles.push(handle);
    }

    /// Subscribe and keep the handle in this scope
    pub fn subscribe<F>(&mut self, bus: &EventBus, topic: &str, handler: F)
    where
        F: FnMut(BusMessage) + Send + 'static,
    {
        self.add(bus.subscribe(topic, handler));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel every subscription in the scope
    pub fn shutdown(&mut self) {
        if !self.handles.is_empty() {
            tracing::debug!("[Bus] Canceling {} subscriptions", self.handles.len());
        }
        self.handles.clear();
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.shutdown();
    }
}
