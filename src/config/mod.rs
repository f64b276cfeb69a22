//! Configuration module for the dump player
//!
//! Playback is configured from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A TOML config file (explicit `--config`, otherwise the default location if present)
//! 3. Command line flags
//!
//! # Config Location
//!
//! The default config file lives in the platform config directory under
//! `saedump-player/config.toml`:
//!
//! - **Linux**: `~/.config/saedump-player/config.toml`
//! - **macOS**: `~/Library/Application Support/saedump-player/config.toml`
//! - **Windows**: `%APPDATA%\saedump-player\config.toml`
//!
//! # Example
//!
//! ```toml
//! [redis]
//! host = "redis.local"
//! port = 6379
//! stream_maxlen = 10
//!
//! [playback]
//! loop_playback = true
//! timestamp_field = "1.2"
//!
//! [playback.channel_mapping]
//! "videosource:cam1" = "replay:cam1"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, Result};
use crate::payload::FieldPath;
use crate::session::PlayerOptions;
use crate::types::ChannelMapping;

/// Application identifier for config directories
pub const APP_ID: &str = "saedump-player";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default Redis host
pub const DEFAULT_REDIS_HOST: &str = "localhost";

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default approximate maximum length of each published stream
pub const DEFAULT_STREAM_MAXLEN: usize = 10;

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== Redis ====================

/// Connection settings for the Redis stream bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis host name or address
    #[serde(default = "default_redis_host")]
    pub host: String,

    /// Redis port
    #[serde(default = "default_redis_port")]
    pub port: u16,

    /// Approximate cap on entries kept per stream (`XADD MAXLEN ~`)
    #[serde(default = "default_stream_maxlen")]
    pub stream_maxlen: usize,
}

fn default_redis_host() -> String {
    DEFAULT_REDIS_HOST.to_string()
}

fn default_redis_port() -> u16 {
    DEFAULT_REDIS_PORT
}

fn default_stream_maxlen() -> usize {
    DEFAULT_STREAM_MAXLEN
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            stream_maxlen: default_stream_maxlen(),
        }
    }
}

impl RedisConfig {
    /// Connection URL for the redis client
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

// ==================== Playback ====================

/// Settings that shape a playback invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Restart from the beginning when the dump ends
    #[serde(default = "default_true")]
    pub loop_playback: bool,

    /// Stop after this many complete passes
    #[serde(default)]
    pub max_passes: Option<u64>,

    /// Tag path of the capture timestamp inside each payload
    #[serde(default)]
    pub timestamp_field: FieldPath,

    /// Recorded stream name to destination channel
    #[serde(default)]
    pub channel_mapping: ChannelMapping,
}

fn default_true() -> bool {
    true
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            loop_playback: true,
            max_passes: None,
            timestamp_field: FieldPath::default(),
            channel_mapping: ChannelMapping::default(),
        }
    }
}

// ==================== Player Config ====================

/// Complete player configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Bus connection
    #[serde(default)]
    pub redis: RedisConfig,

    /// Playback behavior
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl PlayerConfig {
    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlayerError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            PlayerError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit path if given, else the default location if it exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match default_config_path() {
            Some(default) if default.exists() => {
                tracing::debug!("Loading config from {:?}", default);
                Self::load(default)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Save config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlayerError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PlayerError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            PlayerError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Reject values that cannot produce a working player
    pub fn validate(&self) -> Result<()> {
        if self.redis.host.trim().is_empty() {
            return Err(PlayerError::Config("Redis host must not be empty".into()));
        }
        if self.redis.port == 0 {
            return Err(PlayerError::Config("Redis port must not be 0".into()));
        }
        if self.playback.max_passes == Some(0) {
            return Err(PlayerError::Config("max_passes must be at least 1".into()));
        }
        Ok(())
    }

    /// Engine options derived from the playback section
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            mapping: self.playback.channel_mapping.clone(),
            timestamp_field: self.playback.timestamp_field.clone(),
            loop_playback: self.playback.loop_playback,
            max_passes: self.playback.max_passes,
        }
    }
}
