//! Session data types

use std::time::{Duration, Instant, SystemTime};

use crate::dump::DumpMetadata;

/// Lifecycle state of a playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Resources acquired, playback not started
    #[default]
    Idle,
    /// Playing a pass over the dump
    Running,
    /// Reached the end of the dump, restarting from the first record
    Looping,
    /// Stop observed or an error raised, releasing resources
    Stopping,
    /// Resources released, engine finished
    Stopped,
}

impl SessionState {
    /// Check if the engine has finished
    pub fn is_stopped(&self) -> bool {
        matches!(self, SessionState::Stopped)
    }
}

/// Counters kept across all passes of one engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackStats {
    /// Passes begun (including one interrupted by a stop)
    pub passes_started: u64,
    /// Passes that reached the end of the dump
    pub passes_completed: u64,
    /// Events handed to the publisher successfully
    pub events_published: u64,
    /// Events emitted later than their recorded offset
    pub events_behind_schedule: u64,
    /// Largest lag behind the recorded offset seen so far
    pub max_lag: Duration,
}

impl PlaybackStats {
    /// Record how late an event was emitted
    pub fn record_lag(&mut self, lag: Duration) {
        self.events_behind_schedule += 1;
        if lag > self.max_lag {
            self.max_lag = lag;
        }
    }
}

/// How a playback invocation ended without error
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackOutcome {
    /// A stop request was observed
    Stopped(PlaybackStats),
    /// Looping was disabled or bounded and the last pass finished
    Completed(PlaybackStats),
}

impl PlaybackOutcome {
    /// Statistics at the time playback ended
    pub fn stats(&self) -> &PlaybackStats {
        match self {
            PlaybackOutcome::Stopped(stats) | PlaybackOutcome::Completed(stats) => stats,
        }
    }

    /// Check if playback ended because of a stop request
    pub fn is_stopped(&self) -> bool {
        matches!(self, PlaybackOutcome::Stopped(_))
    }
}

/// Progress notifications sent by the engine
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A pass began and its metadata was decoded
    PassStarted {
        pass: u64,
        started_at: SystemTime,
        started: Instant,
        recorded_streams: Vec<String>,
    },
    /// A pass reached the end of the dump
    PassFinished { pass: u64, events: u64 },
}

/// State of one playback pass
///
/// Rebuilt at the start of every pass, so the pacing reference and the
/// metadata are never carried over from an earlier pass.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    /// One-based pass number
    pub pass: u64,
    /// Wall-clock time the pass began
    pub started_at: SystemTime,
    /// Monotonic time the pass began, used for pacing
    pub started: Instant,
    /// Metadata decoded for this pass
    pub metadata: DumpMetadata,
}
