//! Backend module for publishing replayed events
//!
//! # Components
//!
//! - [`Publisher`] - Capability to deliver one payload to one named channel
//! - [`RedisPublisher`] - Redis stream transport (`XADD ... MAXLEN ~`)
//! - [`LogPublisher`] - Dry-run sink that only logs
//! - [`MemoryPublisher`] - In-memory capture used by tests and tooling
//! - [`PlaybackTask`] / [`PlaybackHandle`] - Runs a player on a worker thread
//!
//! # Example
//!
//! ```ignore
//! use saedump_player::backend::{PlaybackTask, Publisher, RedisPublisher};
//! use saedump_player::config::PlayerConfig;
//!
//! let config = PlayerConfig::default();
//! let redis = config.redis.clone();
//! let mut handle = PlaybackTask::spawn("cam1", "capture.saedump", config.player_options(), move || {
//!     Ok(Box::new(RedisPublisher::connect(&redis)?) as Box<dyn Publisher>)
//! })?;
//!
//! println!("{}", handle.status());
//! handle.stop();
//! println!("{}", handle.wait());
//! ```

pub mod memory_publisher;
pub mod publisher;
pub mod redis_publisher;
pub mod worker;

pub use memory_publisher::{MemoryPublisher, PublishedMessage};
pub use publisher::{LogPublisher, PublishStats, Publisher};
pub use redis_publisher::{RedisPublisher, PAYLOAD_FIELD};
pub use worker::{PlaybackHandle, PlaybackTask, TaskStatus};
