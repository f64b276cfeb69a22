//! Playback worker thread
//!
//! Runs one [`DumpPlayer`] on its own named thread and reports its status
//! over crossbeam channels. The owner keeps a [`PlaybackHandle`] to poll the
//! status, read pass notifications, and request a stop.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::thread::JoinHandle;

use crate::error::Result;
use crate::session::{DumpPlayer, PlaybackOutcome, PlayerEvent, PlayerOptions, StopSignal};

use super::publisher::Publisher;

/// Pass notifications buffered before new ones are dropped
const EVENT_BUFFER: usize = 1024;

/// Lifecycle status of a playback task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Thread spawned, connecting and opening the dump
    Starting,
    /// Playing
    Running,
    /// All requested passes finished
    Completed,
    /// Ended by a stop request
    Stopped,
    /// Ended by an error
    Failed(String),
}

impl TaskStatus {
    /// Check if the task can no longer change status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Stopped | TaskStatus::Failed(_)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Starting => write!(f, "starting"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Stopped => write!(f, "cancelled"),
            TaskStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Spawns playback tasks
pub struct PlaybackTask;

impl PlaybackTask {
    /// Start playing `dump_path` on a new thread named `playback-<id>`
    ///
    /// `connect` runs on the new thread, so a slow or failing connection is
    /// reported through the task status rather than blocking the caller.
    pub fn spawn<F>(
        id: impl Into<String>,
        dump_path: impl Into<PathBuf>,
        options: PlayerOptions,
        connect: F,
    ) -> Result<PlaybackHandle>
    where
        F: FnOnce() -> Result<Box<dyn Publisher>> + Send + 'static,
    {
        let id = id.into();
        let dump_path = dump_path.into();
        let stop = StopSignal::new();
        let (status_tx, status_rx) = bounded(8);
        let (events_tx, events_rx) = bounded(EVENT_BUFFER);

        let thread_stop = stop.clone();
        let thread_id = id.clone();
        let join = std::thread::Builder::new()
            .name(format!("playback-{}", id))
            .spawn(move || {
                run_task(
                    &thread_id,
                    dump_path,
                    options,
                    connect,
                    &thread_stop,
                    status_tx,
                    events_tx,
                )
            })?;

        tracing::debug!("Spawned playback task {}", id);

        Ok(PlaybackHandle {
            id,
            stop,
            status_rx,
            events_rx,
            join: Some(join),
            last_status: TaskStatus::Starting,
        })
    }
}

fn run_task<F>(
    id: &str,
    dump_path: PathBuf,
    options: PlayerOptions,
    connect: F,
    stop: &StopSignal,
    status_tx: Sender<TaskStatus>,
    events_tx: Sender<PlayerEvent>,
) -> Result<PlaybackOutcome>
where
    F: FnOnce() -> Result<Box<dyn Publisher>>,
{
    let _ = status_tx.send(TaskStatus::Starting);

    let run = || -> Result<PlaybackOutcome> {
        let publisher = connect()?;
        let mut player = DumpPlayer::open(&dump_path, publisher, options)?.with_events(events_tx);
        let _ = status_tx.send(TaskStatus::Running);
        player.run(stop)
    };
    let result = run();

    let status = match &result {
        Ok(PlaybackOutcome::Completed(_)) => TaskStatus::Completed,
        Ok(PlaybackOutcome::Stopped(_)) => TaskStatus::Stopped,
        Err(e) => TaskStatus::Failed(e.to_string()),
    };
    tracing::info!("Playback task {} finished: {}", id, status);
    let _ = status_tx.send(status);

    result
}

/// Owner-side handle of a running playback task
///
/// Dropping the handle requests a stop and waits for the thread to exit.
pub struct PlaybackHandle {
    id: String,
    stop: StopSignal,
    status_rx: Receiver<TaskStatus>,
    events_rx: Receiver<PlayerEvent>,
    join: Option<JoinHandle<Result<PlaybackOutcome>>>,
    last_status: TaskStatus,
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("id", &self.id)
            .field("status", &self.last_status)
            .finish()
    }
}

impl PlaybackHandle {
    /// Task identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request the task to stop; returns immediately
    pub fn stop(&self) {
        self.stop.request_stop();
    }

    /// Latest status reported by the task
    pub fn status(&mut self) -> &TaskStatus {
        while let Ok(status) = self.status_rx.try_recv() {
            self.last_status = status;
        }
        &self.last_status
    }

    /// Receive all pending pass notifications
    pub fn drain_events(&self) -> Vec<PlayerEvent> {
        self.events_rx.try_iter().collect()
    }

    /// Wait for the task to end and return its final status
    pub fn wait(mut self) -> TaskStatus {
        self.join_thread();
        self.status().clone()
    }

    fn join_thread(&mut self) {
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::error!("Playback task {} panicked", self.id);
                self.last_status = TaskStatus::Failed("playback thread panicked".to_string());
                while self.status_rx.try_recv().is_ok() {}
            }
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.stop.request_stop();
            self.join_thread();
        }
    }
}
