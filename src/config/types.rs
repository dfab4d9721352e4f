//! Configuration type definitions

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::error::SettingsError;
use crate::scripts::ExtensionSet;

/// User settings, stored as camelCase JSON.
///
/// A resolution pass reads one snapshot of these; changing `recursive`
/// must be followed by invalidating the resolution caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Search script directories recursively (default: false)
    #[serde(default = "default_recursive")]
    pub recursive: bool,
    /// Seconds a resolved script list is reused (default: 30)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Minimum fuzzy score 0-100 for query matches (default: 30)
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    /// Truncate ranked results to this many entries (default: unlimited)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    /// Accepted script extensions, with or without a leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Depth limit for recursive scans (default: 16)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Helper program printing the active app's name, id and path.
    /// Falls back to osascript when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_command: Option<String>,
}

fn default_recursive() -> bool {
    DEFAULT_RECURSIVE
}
fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
fn default_min_score() -> u8 {
    DEFAULT_MIN_SCORE
}
fn default_extensions() -> Vec<String> {
    DEFAULT_SCRIPT_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            recursive: DEFAULT_RECURSIVE,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            min_score: DEFAULT_MIN_SCORE,
            max_results: None,
            extensions: default_extensions(),
            max_depth: DEFAULT_MAX_DEPTH,
            context_command: None,
        }
    }
}

impl Settings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn extension_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.extensions)
    }

    /// Current value of a boolean option
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "recursive" => Some(self.recursive),
            _ => None,
        }
    }

    /// Set a boolean option
    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<(), SettingsError> {
        match key {
            "recursive" => {
                self.recursive = value;
                Ok(())
            }
            _ => Err(SettingsError::UnknownKey(key.to_string())),
        }
    }

    /// Flip a boolean option and return its new value
    pub fn toggle(&mut self, key: &str) -> Result<bool, SettingsError> {
        let current = self
            .get_bool(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        self.set_bool(key, !current)?;
        Ok(!current)
    }
}
