//! Playback session module
//!
//! This module holds the replay engine and the pieces it is built from:
//!
//! - [`DumpPlayer`] - Plays a dump pass after pass onto a [`Publisher`](crate::backend::Publisher)
//! - [`Pacer`] - Maps recorded offsets onto the monotonic clock of the current pass
//! - [`StopSignal`] - Cloneable stop request observed at every suspension point
//! - [`PlaybackStats`] / [`PlaybackOutcome`] - What happened during playback
//!
//! # Example
//!
//! ```ignore
//! use saedump_player::backend::LogPublisher;
//! use saedump_player::session::{play, PlayerOptions, StopSignal};
//!
//! let stop = StopSignal::new();
//! let outcome = play("capture.saedump", Box::new(LogPublisher::new()), PlayerOptions::single_pass(), &stop)?;
//! println!("published {} events", outcome.stats().events_published);
//! ```

pub mod pacing;
pub mod player;
pub mod stop;
pub mod types;

pub use pacing::{compute_delay, Pacer, Pacing, WaitOutcome};
pub use player::{play, DumpPlayer, PlayerOptions};
pub use stop::StopSignal;
pub use types::{PlaybackOutcome, PlaybackSession, PlaybackStats, PlayerEvent, SessionState};
