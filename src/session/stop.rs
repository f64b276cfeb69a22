//! Level-triggered stop signal
//!
//! The flag records that a stop was requested and stays set. A bounded
//! crossbeam channel wakes a thread blocked in [`StopSignal::wait_timeout`]
//! so the pacing wait ends as soon as a stop arrives instead of running out
//! its full duration.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared, cloneable stop request
#[derive(Debug, Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    /// Create a signal that has not been raised
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            wake_tx,
            wake_rx,
        }
    }

    /// Request a stop; every clone observes it from now on
    pub fn request_stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("Stop requested");
        }
        // A full channel already holds a pending wake-up
        let _ = self.wake_tx.try_send(());
    }

    /// Check whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Block for up to `timeout`, returning early if a stop is requested
    ///
    /// Returns `true` if the signal is raised when the wait ends.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.wake_rx.recv_timeout(timeout) {
            Ok(()) => {
                // Leave the wake-up for any other waiter on a clone
                let _ = self.wake_tx.try_send(());
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        self.is_stopped()
    }
}
