//! Core data types shared across the player

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PlayerError, Result};

/// Mapping from recorded source stream names to destination channel names
///
/// Streams without an entry are published under their original name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMapping {
    entries: HashMap<String, String>,
}

impl ChannelMapping {
    /// Create an empty (identity) mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a mapping entry
    pub fn insert(&mut self, source: impl Into<String>, destination: impl Into<String>) {
        self.entries.insert(source.into(), destination.into());
    }

    /// Builder-style variant of [`ChannelMapping::insert`]
    pub fn with(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.insert(source, destination);
        self
    }

    /// Resolve a source stream to its destination channel
    pub fn resolve<'a>(&'a self, source: &'a str) -> &'a str {
        self.entries
            .get(source)
            .map(String::as_str)
            .unwrap_or(source)
    }

    /// Parse a `SRC=DST` entry as given on the command line
    pub fn parse_entry(entry: &str) -> Result<(String, String)> {
        let (source, destination) = entry.split_once('=').ok_or_else(|| {
            PlayerError::Config(format!("Channel mapping '{}' must be SRC=DST", entry))
        })?;
        let (source, destination) = (source.trim(), destination.trim());
        if source.is_empty() || destination.is_empty() {
            return Err(PlayerError::Config(format!(
                "Channel mapping '{}' has an empty side",
                entry
            )));
        }
        Ok((source.to_string(), destination.to_string()))
    }

    /// Number of explicit entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is pure identity
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_identity_and_mapped() {
        let mapping = ChannelMapping::new().with("camA", "outA");
        assert_eq!(mapping.resolve("camA"), "outA");
        assert_eq!(mapping.resolve("camB"), "camB");
    }

    #[test]
    fn test_parse_entry() {
        assert_eq!(
            ChannelMapping::parse_entry("videosource:cam1 = replay:cam1").unwrap(),
            ("videosource:cam1".to_string(), "replay:cam1".to_string())
        );
        assert!(ChannelMapping::parse_entry("no-separator").is_err());
        assert!(ChannelMapping::parse_entry("=dst").is_err());
    }

    #[test]
    fn test_insert_overrides() {
        let mut base = ChannelMapping::new().with("a", "x").with("b", "y");
        base.insert("a", "z");
        assert_eq!(base.resolve("a"), "z");
        assert_eq!(base.resolve("b"), "y");
        assert_eq!(base.len(), 2);
    }
}
