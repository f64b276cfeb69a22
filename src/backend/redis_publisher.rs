//! Redis stream publisher
//!
//! Each event becomes one stream entry:
//!
//! ```text
//! XADD <channel> MAXLEN ~ <stream_maxlen> * proto_data_b64 <base64 payload>
//! ```
//!
//! which is the entry layout the downstream pipeline stages consume.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use redis::streams::StreamMaxlen;
use redis::{Client, Commands, Connection};

use crate::config::RedisConfig;
use crate::error::{PlayerError, Result};

use super::publisher::{PublishStats, Publisher};

/// Stream entry field holding the encoded payload
pub const PAYLOAD_FIELD: &str = "proto_data_b64";

/// Publishes payloads as entries on Redis streams
pub struct RedisPublisher {
    client: Client,
    connection: Option<Connection>,
    url: String,
    stream_maxlen: usize,
    stats: PublishStats,
}

impl std::fmt::Debug for RedisPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPublisher")
            .field("url", &self.url)
            .field("connected", &self.connection.is_some())
            .field("stream_maxlen", &self.stream_maxlen)
            .finish()
    }
}

impl RedisPublisher {
    /// Create a publisher without connecting
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let url = config.url();
        let client = Client::open(url.as_str())
            .map_err(|e| PlayerError::Transport(format!("Invalid Redis URL {}: {}", url, e)))?;
        Ok(Self {
            client,
            connection: None,
            url,
            stream_maxlen: config.stream_maxlen,
            stats: PublishStats::default(),
        })
    }

    /// Create a publisher and open its connection
    pub fn connect(config: &RedisConfig) -> Result<Self> {
        let mut publisher = Self::new(config)?;
        publisher.open()?;
        Ok(publisher)
    }

    /// Open the connection if it is not open yet
    pub fn open(&mut self) -> Result<()> {
        if self.connection.is_none() {
            let connection = self.client.get_connection().map_err(|e| {
                PlayerError::Transport(format!("Failed to connect to {}: {}", self.url, e))
            })?;
            tracing::info!("Connected to Redis at {}", self.url);
            self.connection = Some(connection);
        }
        Ok(())
    }

    /// Whether a connection is currently held
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

impl Publisher for RedisPublisher {
    fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<()> {
        let Some(connection) = self.connection.as_mut() else {
            self.stats.record_failure();
            return Err(PlayerError::Transport(format!(
                "Not connected to {}",
                self.url
            )));
        };

        let encoded = BASE64.encode(payload);
        let result: redis::RedisResult<String> = connection.xadd_maxlen(
            channel,
            StreamMaxlen::Approx(self.stream_maxlen),
            "*",
            &[(PAYLOAD_FIELD, encoded.as_str())],
        );

        match result {
            Ok(_) => {
                self.stats.record_success(payload.len());
                Ok(())
            }
            Err(e) => {
                self.stats.record_failure();
                Err(e.into())
            }
        }
    }

    fn close(&mut self) {
        if self.connection.take().is_some() {
            tracing::info!("Closed Redis connection to {}", self.url);
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }

    fn stats(&self) -> PublishStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_does_not_connect() {
        let publisher = RedisPublisher::new(&RedisConfig::default()).unwrap();
        assert!(!publisher.is_connected());
        assert_eq!(publisher.describe(), "redis://localhost:6379/");
    }

    #[test]
    fn test_invalid_host_is_transport_error() {
        let config = RedisConfig {
            host: "bad host/with spaces".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            RedisPublisher::new(&config),
            Err(PlayerError::Transport(_))
        ));
    }

    #[test]
    fn test_publish_without_connection_fails() {
        let mut publisher = RedisPublisher::new(&RedisConfig::default()).unwrap();
        let err = publisher.publish("out", &[1]).unwrap_err();
        assert!(matches!(err, PlayerError::Transport(_)));
        assert_eq!(publisher.stats().failures, 1);
    }
}
