//! # saedump-player: SAE Dump Replay
//!
//! Replays recorded SAE dump files onto Redis streams in real time. A dump is
//! a metadata record followed by event records, each carrying a recorded
//! stream name, a capture time and a base64 protobuf `SaeMessage`. Playback
//! re-emits every event at its original offset from the start of the
//! recording, stamps the frame with the current time, and loops until told to
//! stop.
//!
//! ## Architecture
//!
//! - **Dump**: Lazy, restartable record splitting and strict record decoding
//! - **Payload**: Wire-level rewrite of the capture timestamp, unknown fields preserved
//! - **Session**: The pacing loop, stop signal and playback statistics
//! - **Backend**: Publisher implementations and the playback worker thread
//! - **Config**: TOML configuration with built-in defaults
//!
//! ## Configuration
//!
//! The default config file is read from the platform config directory under
//! `saedump-player/config.toml` when present:
//!
//! - **Linux**: `~/.config/saedump-player/config.toml`
//! - **macOS**: `~/Library/Application Support/saedump-player/config.toml`
//! - **Windows**: `%APPDATA%\saedump-player\config.toml`
//!
//! ## Example
//!
//! ```ignore
//! use saedump_player::{
//!     backend::RedisPublisher,
//!     config::PlayerConfig,
//!     session::{DumpPlayer, StopSignal},
//! };
//!
//! fn main() -> saedump_player::Result<()> {
//!     let config = PlayerConfig::load_or_default(None)?;
//!     let publisher = RedisPublisher::connect(&config.redis)?;
//!
//!     let stop = StopSignal::new();
//!     let mut player = DumpPlayer::open("capture.saedump", Box::new(publisher), config.player_options())?;
//!     let outcome = player.run(&stop)?;
//!     println!("{:?}", outcome.stats());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod dump;
pub mod error;
pub mod payload;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use backend::{
    LogPublisher, MemoryPublisher, PlaybackHandle, PlaybackTask, Publisher, RedisPublisher,
    TaskStatus,
};
pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use payload::{FieldPath, TimestampRewriter};
pub use session::{play, DumpPlayer, PlaybackOutcome, PlayerOptions, StopSignal};
pub use types::ChannelMapping;
