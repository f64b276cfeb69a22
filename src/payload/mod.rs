//! Capture timestamp rewriting for protobuf event payloads
//!
//! Every payload in a dump is a serialized `SaeMessage`. Before an event is
//! republished its frame capture timestamp (`frame.timestamp_utc_ms`, tags
//! `1.2`) is replaced with the current wall-clock time so consumers see the
//! replay as live data. The location of the field is configurable as a
//! [`FieldPath`].

pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{PlayerError, Result};

/// Largest field number protobuf allows
const MAX_TAG: u32 = (1 << 29) - 1;

/// Path of field tags from the top-level message down to a varint field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<u32>);

impl FieldPath {
    /// Create a path from tags; fails on an empty path or out-of-range tag
    pub fn new(tags: Vec<u32>) -> Result<Self> {
        if tags.is_empty() {
            return Err(PlayerError::Config("Field path must not be empty".into()));
        }
        if let Some(bad) = tags.iter().find(|&&t| t == 0 || t > MAX_TAG) {
            return Err(PlayerError::Config(format!(
                "Field tag {} is outside 1..={}",
                bad, MAX_TAG
            )));
        }
        Ok(Self(tags))
    }

    /// Tags along the path
    pub fn tags(&self) -> &[u32] {
        &self.0
    }
}

impl Default for FieldPath {
    /// `SaeMessage.frame.timestamp_utc_ms`
    fn default() -> Self {
        Self(vec![1, 2])
    }
}

impl FromStr for FieldPath {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self> {
        let tags = s
            .split('.')
            .map(|part| {
                part.trim().parse::<u32>().map_err(|_| {
                    PlayerError::Config(format!("Invalid field path '{}': '{}' is not a tag", s, part))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(tags)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PlayerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Source of the wall-clock time written into payloads
pub trait Clock: Send {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> u64;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Rewrites the capture timestamp of each payload to "now"
///
/// Values handed out never go backwards, even if the wall clock is stepped
/// back during a pass.
pub struct TimestampRewriter {
    path: FieldPath,
    clock: Box<dyn Clock>,
    last_ms: u64,
}

impl fmt::Debug for TimestampRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampRewriter")
            .field("path", &self.path)
            .field("last_ms", &self.last_ms)
            .finish()
    }
}

impl TimestampRewriter {
    /// Rewriter using the system clock
    pub fn new(path: FieldPath) -> Self {
        Self::with_clock(path, Box::new(SystemClock))
    }

    /// Rewriter using a custom clock
    pub fn with_clock(path: FieldPath, clock: Box<dyn Clock>) -> Self {
        Self {
            path,
            clock,
            last_ms: 0,
        }
    }

    /// Replace the timestamp in the payload of event `index` with the current time
    pub fn rewrite(&mut self, index: u64, payload: &[u8]) -> Result<Vec<u8>> {
        let now = self.clock.now_ms().max(self.last_ms);
        let rewritten = self.rewrite_at(index, payload, now)?;
        self.last_ms = now;
        Ok(rewritten)
    }

    /// Replace the timestamp with an explicit value
    pub fn rewrite_at(&self, index: u64, payload: &[u8], timestamp_ms: u64) -> Result<Vec<u8>> {
        wire::set_varint(payload, self.path.tags(), timestamp_ms)
            .map_err(|reason| PlayerError::PayloadDecode { index, reason })
    }

    /// Read the timestamp currently stored in a payload
    pub fn read(&self, index: u64, payload: &[u8]) -> Result<Option<u64>> {
        wire::get_varint(payload, self.path.tags())
            .map_err(|reason| PlayerError::PayloadDecode { index, reason })
    }
}
