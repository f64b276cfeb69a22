//! In-memory publisher
//!
//! Captures every published message with the instant it was published.
//! Clones share the same log, so a test can keep one handle while the
//! engine owns another. A failure point can be configured to exercise the
//! transport error path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::error::{PlayerError, Result};

use super::publisher::{PublishStats, Publisher};

/// One captured publish call
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub channel: String,
    pub payload: Vec<u8>,
    pub published_at: Instant,
}

#[derive(Debug, Default)]
struct Shared {
    messages: Mutex<Vec<PublishedMessage>>,
    closed: AtomicBool,
}

/// Publisher that records messages instead of sending them
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    shared: Arc<Shared>,
    fail_after: Option<usize>,
}

impl MemoryPublisher {
    /// Create an empty publisher
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every publish once `count` messages have been accepted
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PublishedMessage>> {
        self.shared
            .messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of all captured messages
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.lock().clone()
    }

    /// Channels of captured messages, in publish order
    pub fn channels(&self) -> Vec<String> {
        self.lock().iter().map(|m| m.channel.clone()).collect()
    }

    /// Number of captured messages
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing was published
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `close` has been called on any clone
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl Publisher for MemoryPublisher {
    fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(PlayerError::Transport("publisher is closed".into()));
        }

        let mut messages = self.lock();
        if self.fail_after.is_some_and(|limit| messages.len() >= limit) {
            return Err(PlayerError::Transport(format!(
                "simulated failure publishing to '{}'",
                channel
            )));
        }

        messages.push(PublishedMessage {
            channel: channel.to_string(),
            payload: payload.to_vec(),
            published_at: Instant::now(),
        });
        Ok(())
    }

    fn close(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn stats(&self) -> PublishStats {
        let messages = self.lock();
        PublishStats {
            messages_published: messages.len() as u64,
            bytes_published: messages.iter().map(|m| m.payload.len() as u64).sum(),
            failures: 0,
        }
    }
}
