//! Publisher trait for the pub/sub bus
//!
//! The replay engine only needs to hand a payload to a named channel. Real
//! transports (Redis streams), in-memory capture for tests and a logging
//! dry-run sink all implement the same trait.

use crate::error::Result;

/// Counters kept by every publisher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Messages accepted by the bus
    pub messages_published: u64,
    /// Payload bytes accepted by the bus
    pub bytes_published: u64,
    /// Publish attempts that failed
    pub failures: u64,
}

impl PublishStats {
    /// Record a successful publish
    pub fn record_success(&mut self, bytes: usize) {
        self.messages_published += 1;
        self.bytes_published += bytes as u64;
    }

    /// Record a failed publish
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }
}

/// Capability to publish one payload on one channel
///
/// Calls are synchronous: the engine does not move to the next event until
/// `publish` returns. Implementations must not retry internally. Implementations
/// must be `Send` so an engine can own one on its own thread.
///
/// # Example
///
/// ```ignore
/// fn emit(bus: &mut dyn Publisher, channel: &str, payload: &[u8]) -> Result<()> {
///     bus.publish(channel, payload)
/// }
/// ```
pub trait Publisher: Send {
    /// Deliver `payload` to `channel`
    fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<()>;

    /// Release the underlying connection; later publishes may fail
    fn close(&mut self) {}

    /// Short description for logs (e.g. the bus URL)
    fn describe(&self) -> String;

    /// Publish statistics so far
    fn stats(&self) -> PublishStats {
        PublishStats::default()
    }
}

/// Publisher that only logs what it would send
#[derive(Debug, Default)]
pub struct LogPublisher {
    stats: PublishStats,
}

impl LogPublisher {
    /// Create a dry-run publisher
    pub fn new() -> Self {
        Self::default()
    }
}

impl Publisher for LogPublisher {
    fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<()> {
        tracing::info!("Dry-run publish of {} bytes to '{}'", payload.len(), channel);
        self.stats.record_success(payload.len());
        Ok(())
    }

    fn describe(&self) -> String {
        "dry-run".to_string()
    }

    fn stats(&self) -> PublishStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_publisher_counts() {
        let mut publisher = LogPublisher::new();
        publisher.publish("out", &[1, 2, 3]).unwrap();
        publisher.publish("out", &[4]).unwrap();
        let stats = publisher.stats();
        assert_eq!(stats.messages_published, 2);
        assert_eq!(stats.bytes_published, 4);
        assert_eq!(stats.failures, 0);
        assert_eq!(publisher.describe(), "dry-run");
    }
}
