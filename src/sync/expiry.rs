//! # Expiry Scheduler
//!
//! Per-tracker removal timers for connections whose sync has finished.
//!
//! ## Behavior
//!
//! - **Arm**: spawn a timer task that reports an [`Expiry`] once the grace
//!   period elapses. Arming a key that already has a timer replaces it.
//! - **Cancel**: abort the timer task for one key, or all of them on teardown.
//! - **Generations**: every armed timer carries a generation number. A firing
//!   is only honoured if it still matches the timer currently armed for its
//!   key, so a report that was already queued when the key was re-armed or
//!   canceled is ignored.
//!
//! Timer tasks never touch tracker state. They only send an [`Expiry`] back to
//! the owner, which applies it in the same run-to-completion loop as events.
//! Arming requires a running Tokio runtime.

use crate::shared::event::TrackerKey;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Report sent by a timer task when its grace period elapsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    pub key: TrackerKey,
    pub generation: u64,
}

#[derive(Debug)]
struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Owner of all pending removal timers
#[derive(Debug)]
pub struct ExpiryScheduler {
    grace_period: Duration,
    timers: HashMap<TrackerKey, ArmedTimer>,
    next_generation: u64,
    expired_tx: mpsc::UnboundedSender<Expiry>,
}

impl ExpiryScheduler {
    /// Create a scheduler and the receiver its timers report to
    pub fn new(grace_period: Duration) -> (Self, mpsc::UnboundedReceiver<Expiry>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            grace_period,
            timers: HashMap::new(),
            next_generation: 0,
            expired_tx,
        };
        (scheduler, expired_rx)
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Arm a fresh timer for `key`, canceling any previous one
    ///
    /// Returns the generation of the new timer.
    pub fn arm(&mut self, key: TrackerKey) -> u64 {
        self.cancel(&key);

        self.next_generation += 1;
        let generation = self.next_generation;
        let grace_period = self.grace_period;
        let expired_tx = self.expired_tx.clone();
        let expiry = Expiry {
            key: key.clone(),
            generation,
        };

        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            // Owner gone means nothing is left to clean up
            let _ = expired_tx.send(expiry);
        });

        tracing::debug!(
            "[Expiry] Armed removal of {} in {:?} (generation {})",
            key,
            grace_period,
            generation
        );
        self.timers.insert(key, ArmedTimer { generation, handle });
        generation
    }

    /// Cancel the pending timer for `key`, if any
    pub fn cancel(&mut self, key: &TrackerKey) -> bool {
        match self.timers.remove(key) {
            Some(timer) => {
                timer.handle.abort();
                tracing::debug!(
                    "[Expiry] Canceled removal of {} (generation {})",
                    key,
                    timer.generation
                );
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer
    pub fn cancel_all(&mut self) {
        if self.timers.is_empty() {
            return;
        }
        tracing::debug!("[Expiry] Canceling {} pending removals", self.timers.len());
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
    }

    /// Consume a timer report
    ///
    /// Returns `true` if the report belongs to the timer currently armed for
    /// its key, in which case the timer handle is dropped and the caller
    /// should evict the key. Stale reports return `false`.
    pub fn take_expired(&mut self, expiry: &Expiry) -> bool {
        match self.timers.get(&expiry.key) {
            Some(timer) if timer.generation == expiry.generation => {
                self.timers.remove(&expiry.key);
                true
            }
            _ => {
                tracing::debug!(
                    "[Expiry] Ignoring stale expiry for {} (generation {})",
                    expiry.key,
                    expiry.generation
                );
                false
            }
        }
    }

    pub fn is_armed(&self, key: &TrackerKey) -> bool {
        self.timers.contains_key(key)
    }

    /// Generation of the timer currently armed for `key`
    pub fn armed_generation(&self, key: &TrackerKey) -> Option<u64> {
        self.timers.get(key).map(|timer| timer.generation)
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
