//! Dump player: the replay engine
//!
//! A [`DumpPlayer`] owns one open dump and one publisher. [`DumpPlayer::run`]
//! plays the dump pass after pass. Each event is paced to its recorded offset,
//! its capture timestamp is rewritten to now, and it is published on its
//! (possibly remapped) channel. Playback ends on a stop request, on the
//! configured pass limit, or on the first error.
//!
//! The stop signal is checked at the top of every event, during the pacing
//! wait, and again right before the payload is rewritten and published. An
//! event is never published once a stop has been seen for it.

use crossbeam_channel::Sender;
use std::path::Path;
use std::time::{Instant, SystemTime};

use crate::backend::{PublishStats, Publisher};
use crate::dump::{DumpMetadata, DumpSource, EventEnvelope};
use crate::error::{PlayerError, Result, ResultExt};
use crate::payload::{Clock, FieldPath, TimestampRewriter};
use crate::types::ChannelMapping;

use super::pacing::{Pacer, WaitOutcome};
use super::stop::StopSignal;
use super::types::{PlaybackOutcome, PlaybackSession, PlaybackStats, PlayerEvent, SessionState};

/// Options fixed for the lifetime of one playback invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    /// Source stream to destination channel mapping
    pub mapping: ChannelMapping,
    /// Location of the capture timestamp inside payloads
    pub timestamp_field: FieldPath,
    /// Restart from the first event when the dump ends
    pub loop_playback: bool,
    /// Stop after this many complete passes (`None` = unbounded)
    pub max_passes: Option<u64>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            mapping: ChannelMapping::default(),
            timestamp_field: FieldPath::default(),
            loop_playback: true,
            max_passes: None,
        }
    }
}

impl PlayerOptions {
    /// Play the dump exactly once
    pub fn single_pass() -> Self {
        Self {
            loop_playback: false,
            ..Self::default()
        }
    }

    /// Set the channel mapping
    pub fn with_mapping(mut self, mapping: ChannelMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Bound the number of passes
    pub fn with_max_passes(mut self, passes: u64) -> Self {
        self.max_passes = Some(passes);
        self
    }
}

/// How a single pass ended
enum PassEnd {
    Finished { events: u64 },
    Stopped,
}

fn notify(events_tx: &Option<Sender<PlayerEvent>>, event: PlayerEvent) {
    if let Some(tx) = events_tx {
        let _ = tx.try_send(event);
    }
}

/// The replay engine for one dump
pub struct DumpPlayer {
    source: DumpSource,
    publisher: Box<dyn Publisher>,
    rewriter: TimestampRewriter,
    options: PlayerOptions,
    state: SessionState,
    stats: PlaybackStats,
    events_tx: Option<Sender<PlayerEvent>>,
}

impl std::fmt::Debug for DumpPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpPlayer")
            .field("dump", &self.source.path())
            .field("publisher", &self.publisher.describe())
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

impl DumpPlayer {
    /// Open a dump for playback through `publisher`
    ///
    /// Fails with an IO error if the dump cannot be opened. The player owns
    /// both resources from here on and releases them when playback ends.
    pub fn open(
        path: impl AsRef<Path>,
        publisher: Box<dyn Publisher>,
        options: PlayerOptions,
    ) -> Result<Self> {
        let source = DumpSource::open(path)?;
        let rewriter = TimestampRewriter::new(options.timestamp_field.clone());
        Ok(Self {
            source,
            publisher,
            rewriter,
            options,
            state: SessionState::Idle,
            stats: PlaybackStats::default(),
            events_tx: None,
        })
    }

    /// Use a custom clock for payload timestamps
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.rewriter = TimestampRewriter::with_clock(self.options.timestamp_field.clone(), clock);
        self
    }

    /// Send progress notifications to `tx`; full channels drop notifications
    pub fn with_events(mut self, tx: Sender<PlayerEvent>) -> Self {
        self.events_tx = Some(tx);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Statistics so far
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// Counters kept by the publisher
    pub fn publish_stats(&self) -> PublishStats {
        self.publisher.stats()
    }

    /// Play until stopped, finished or failed
    ///
    /// The publisher is closed before this returns, on every path.
    pub fn run(&mut self, stop: &StopSignal) -> Result<PlaybackOutcome> {
        if self.state.is_stopped() {
            return Err(PlayerError::Config(
                "Player has already finished; open the dump again to replay".into(),
            ));
        }

        tracing::info!(
            "Starting playback of {:?} via {}",
            self.source.path(),
            self.publisher.describe()
        );
        if !self.options.mapping.is_empty() {
            tracing::info!("Remapping {} recorded streams", self.options.mapping.len());
        }

        let result = self.run_passes(stop);

        self.state = SessionState::Stopping;
        self.publisher.close();
        self.state = SessionState::Stopped;

        match &result {
            Ok(PlaybackOutcome::Stopped(stats)) => tracing::info!(
                "Playback stopped after {} events in {} passes",
                stats.events_published,
                stats.passes_started
            ),
            Ok(PlaybackOutcome::Completed(stats)) => tracing::info!(
                "Playback completed after {} events in {} passes",
                stats.events_published,
                stats.passes_completed
            ),
            Err(e) => tracing::error!("Playback failed: {}", e),
        }

        result
    }

    fn run_passes(&mut self, stop: &StopSignal) -> Result<PlaybackOutcome> {
        self.state = SessionState::Running;

        loop {
            if stop.is_stopped() {
                return Ok(PlaybackOutcome::Stopped(self.stats.clone()));
            }

            match self.play_pass(stop)? {
                PassEnd::Stopped => return Ok(PlaybackOutcome::Stopped(self.stats.clone())),
                PassEnd::Finished { events } => {
                    self.stats.passes_completed += 1;
                    tracing::info!(
                        "Reached end of dump after pass {} ({} events, {} behind schedule, max lag {} ms)",
                        self.stats.passes_started,
                        events,
                        self.stats.events_behind_schedule,
                        self.stats.max_lag.as_millis()
                    );
                    notify(
                        &self.events_tx,
                        PlayerEvent::PassFinished {
                            pass: self.stats.passes_started,
                            events,
                        },
                    );

                    let limit_reached = self
                        .options
                        .max_passes
                        .is_some_and(|max| self.stats.passes_completed >= max);
                    if !self.options.loop_playback || limit_reached {
                        return Ok(PlaybackOutcome::Completed(self.stats.clone()));
                    }

                    // Looping over a dump without events would never wait
                    if events == 0 {
                        tracing::warn!(
                            "Dump {:?} contains no events, not looping",
                            self.source.path()
                        );
                        return Ok(PlaybackOutcome::Completed(self.stats.clone()));
                    }
                }
            }

            self.state = SessionState::Looping;
        }
    }

    fn play_pass(&mut self, stop: &StopSignal) -> Result<PassEnd> {
        let path = self.source.path().to_path_buf();
        let mut records = self.source.pass()?;

        let started = Instant::now();
        let started_at = SystemTime::now();
        self.stats.passes_started += 1;

        let first = records.next().ok_or(PlayerError::EmptyDump)??;
        let session = PlaybackSession {
            pass: self.stats.passes_started,
            started_at,
            started,
            metadata: DumpMetadata::decode(&first)?,
        };
        let pacer = Pacer::new(session.started, session.metadata.start_time);

        tracing::info!(
            "Pass {} of {:?} containing streams {:?} (recorded {})",
            session.pass,
            path,
            session.metadata.recorded_streams,
            session
                .metadata
                .started_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "at an unknown time".to_string()),
        );
        notify(
            &self.events_tx,
            PlayerEvent::PassStarted {
                pass: session.pass,
                started_at: session.started_at,
                started: session.started,
                recorded_streams: session.metadata.recorded_streams.clone(),
            },
        );
        self.state = SessionState::Running;

        let mut events = 0u64;
        loop {
            if stop.is_stopped() {
                return Ok(PassEnd::Stopped);
            }

            let Some(record) = records.next() else {
                break;
            };
            let event = EventEnvelope::decode(&record?, events)?;

            match pacer.wait_for(event.record_time, stop) {
                WaitOutcome::Stopped => return Ok(PassEnd::Stopped),
                WaitOutcome::Proceed { lag: Some(lag) } => {
                    self.stats.record_lag(lag);
                    tracing::debug!(
                        "Event {} behind schedule by {} ms",
                        event.index,
                        lag.as_millis()
                    );
                }
                WaitOutcome::Proceed { lag: None } => {}
            }

            if stop.is_stopped() {
                return Ok(PassEnd::Stopped);
            }

            let payload = self.rewriter.rewrite(event.index, &event.payload)?;
            let channel = self.options.mapping.resolve(&event.source_stream);
            self.publisher
                .publish(channel, &payload)
                .with_context(|| format!("Publishing event {} to '{}'", event.index, channel))?;

            tracing::trace!(
                "Published event {} to '{}' ({} bytes)",
                event.index,
                channel,
                payload.len()
            );
            self.stats.events_published += 1;
            events += 1;
        }

        Ok(PassEnd::Finished { events })
    }
}

impl Drop for DumpPlayer {
    fn drop(&mut self) {
        if !self.state.is_stopped() {
            self.publisher.close();
        }
    }
}

/// Open `path` and play it until stopped, finished or failed
pub fn play(
    path: impl AsRef<Path>,
    publisher: Box<dyn Publisher>,
    options: PlayerOptions,
    stop: &StopSignal,
) -> Result<PlaybackOutcome> {
    let mut player = DumpPlayer::open(path, publisher, options)?;
    player.run(stop)
}
