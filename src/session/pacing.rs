//! Event pacing
//!
//! An event is due when the time elapsed since the pass began reaches the
//! event's offset into the recording. Early events wait for the difference;
//! late events go out immediately. Lag is never compensated, so drift within
//! a pass accumulates instead of compressing later gaps.

use std::time::{Duration, Instant};

use super::stop::StopSignal;

/// Scheduling decision for one event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    /// The event is early; wait this long before emitting it
    Wait(Duration),
    /// The event is late by this much; emit it now
    Behind(Duration),
}

/// Result of waiting for an event's slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitOutcome {
    /// The slot was reached; `lag` is set when the event was already late
    Proceed { lag: Option<Duration> },
    /// A stop was observed before or during the wait
    Stopped,
}

/// Convert seconds, saturating when the value does not fit in a `Duration`
fn secs_to_duration(secs: f64, overflow: Duration) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(overflow)
}

/// Decide how long to wait for an event recorded at `record_target`
///
/// `elapsed` is the time since the pass began and `record_start` is the
/// recording's start time. Offsets that are negative or not finite never
/// block.
pub fn compute_delay(elapsed: Duration, record_start: f64, record_target: f64) -> Pacing {
    let target = record_target - record_start;
    if !target.is_finite() {
        return Pacing::Behind(Duration::ZERO);
    }

    let elapsed_secs = elapsed.as_secs_f64();
    if elapsed_secs <= target {
        Pacing::Wait(secs_to_duration(target - elapsed_secs, Duration::MAX))
    } else {
        Pacing::Behind(secs_to_duration(elapsed_secs - target, Duration::ZERO))
    }
}

/// Pacing reference for one pass
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    started: Instant,
    record_start: f64,
}

impl Pacer {
    /// Pace against a pass that began at `started`
    pub fn new(started: Instant, record_start: f64) -> Self {
        Self {
            started,
            record_start,
        }
    }

    /// Scheduling decision for an event, as of now
    pub fn schedule(&self, record_time: f64) -> Pacing {
        compute_delay(self.started.elapsed(), self.record_start, record_time)
    }

    /// Block until the event's slot, or until `stop` is raised
    pub fn wait_for(&self, record_time: f64, stop: &StopSignal) -> WaitOutcome {
        if stop.is_stopped() {
            return WaitOutcome::Stopped;
        }
        match self.schedule(record_time) {
            Pacing::Wait(delay) => {
                if !delay.is_zero() && stop.wait_timeout(delay) {
                    return WaitOutcome::Stopped;
                }
                WaitOutcome::Proceed { lag: None }
            }
            Pacing::Behind(lag) => WaitOutcome::Proceed { lag: Some(lag) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_event_waits_for_difference() {
        let pacing = compute_delay(Duration::from_millis(200), 1000.0, 1000.5);
        match pacing {
            Pacing::Wait(d) => assert!((d.as_secs_f64() - 0.3).abs() < 1e-9),
            other => panic!("expected wait, got {other:?}"),
        }
    }

    #[test]
    fn test_exactly_on_time_waits_zero() {
        assert_eq!(
            compute_delay(Duration::from_millis(500), 1000.0, 1000.5),
            Pacing::Wait(Duration::ZERO)
        );
    }

    #[test]
    fn test_late_event_reports_lag() {
        match compute_delay(Duration::from_secs(2), 1000.0, 1001.0) {
            Pacing::Behind(lag) => assert!((lag.as_secs_f64() - 1.0).abs() < 1e-9),
            other => panic!("expected behind, got {other:?}"),
        }
    }

    #[test]
    fn test_backward_jump_never_blocks() {
        assert!(matches!(
            compute_delay(Duration::ZERO, 1000.0, 999.0),
            Pacing::Behind(_)
        ));
        assert_eq!(
            compute_delay(Duration::ZERO, 1000.0, f64::NAN),
            Pacing::Behind(Duration::ZERO)
        );
    }

    #[test]
    fn test_unrepresentable_offset_waits_forever() {
        assert_eq!(
            compute_delay(Duration::ZERO, 0.0, 1e30),
            Pacing::Wait(Duration::MAX)
        );
        assert_eq!(
            compute_delay(Duration::from_secs(1), 1e30, 0.0),
            Pacing::Behind(Duration::ZERO)
        );
    }

    #[test]
    fn test_far_future_event_is_interrupted_by_stop() {
        let pacer = Pacer::new(Instant::now(), 0.0);
        let stop = StopSignal::new();
        let remote = stop.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.request_stop();
        });

        assert_eq!(pacer.wait_for(1e30, &stop), WaitOutcome::Stopped);
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_for_is_interrupted_by_stop() {
        let pacer = Pacer::new(Instant::now(), 0.0);
        let stop = StopSignal::new();
        let remote = stop.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.request_stop();
        });

        let start = Instant::now();
        assert_eq!(pacer.wait_for(60.0, &stop), WaitOutcome::Stopped);
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_for_late_event_returns_lag() {
        let pacer = Pacer::new(Instant::now() - Duration::from_secs(1), 0.0);
        let stop = StopSignal::new();
        match pacer.wait_for(0.25, &stop) {
            WaitOutcome::Proceed { lag: Some(lag) } => assert!(lag >= Duration::from_millis(700)),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_wait_never_exceeds_offset(
                elapsed_ms in 0u64..100_000,
                start in 0.0f64..2_000_000_000.0,
                offset in -1000.0f64..1000.0,
            ) {
                let pacing = compute_delay(Duration::from_millis(elapsed_ms), start, start + offset);
                match pacing {
                    Pacing::Wait(d) => {
                        prop_assert!(offset >= -1e-6);
                        prop_assert!(d.as_secs_f64() <= offset + 1e-6);
                    }
                    Pacing::Behind(_) => {
                        prop_assert!(elapsed_ms as f64 / 1000.0 + 1e-6 >= offset);
                    }
                }
            }
        }
    }
}
