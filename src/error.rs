//! Error handling for the dump player
//!
//! This module defines the error taxonomy of the replay engine and a Result
//! alias for use throughout the crate. Every variant is terminal for the
//! playback invocation that produced it; cancellation is not an error and is
//! reported through [`crate::session::PlaybackOutcome`] instead.

use thiserror::Error;

/// Main error type for dump player operations
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The dump source could not be opened or read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The dump contains no records at all
    #[error("Dump is empty: no metadata record found")]
    EmptyDump,

    /// The first record could not be decoded as dump metadata
    #[error("Malformed metadata record: {0}")]
    MalformedMetadata(String),

    /// An event record failed structural decoding
    #[error("Malformed event record {index}: {reason}")]
    MalformedRecord { index: u64, reason: String },

    /// An event payload could not be parsed to locate the timestamp field
    #[error("Payload decode error in event {index}: {reason}")]
    PayloadDecode { index: u64, reason: String },

    /// The publish capability failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors related to configuration loading/saving/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PlayerError>,
    },
}

impl PlayerError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PlayerError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &PlayerError {
        match self {
            PlayerError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<redis::RedisError> for PlayerError {
    fn from(err: redis::RedisError) -> Self {
        PlayerError::Transport(err.to_string())
    }
}

/// Result type alias for dump player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PlayerError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| PlayerError::Io(e).with_context(f()))
    }
}
