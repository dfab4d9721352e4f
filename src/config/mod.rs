//! Configuration module - settings and file locations
//!
//! This module provides functionality for:
//! - Loading and saving user settings (recursive search, cache TTL, ...)
//! - Default values for all settings
//! - Installing the default script directories file
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - The `Settings` struct
//! - `loader` - File system loading and saving
//! - `paths` - Data, cache and log locations

mod defaults;
mod loader;
mod paths;
mod types;

pub use defaults::{
    APP_SCRIPTS_HOME_ENV, DEFAULT_CACHE_TTL_SECS, DEFAULT_MAX_DEPTH, DEFAULT_MIN_SCORE,
    DEFAULT_PATTERN_FILE, DEFAULT_SCRIPT_EXTENSIONS, LOG_FILE_NAME,
};
pub use loader::{install_default_patterns, load_settings, save_settings, try_load_settings};
pub use paths::AppPaths;
pub use types::Settings;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
