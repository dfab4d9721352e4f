//! Configuration loading from file system
//!
//! Settings live in a JSON file next to the script directories file.
//! Loading never fails hard: a missing or malformed file yields defaults.

use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::defaults::DEFAULT_PATTERN_FILE;
use super::types::Settings;
use crate::error::SettingsError;

/// Load settings from `path`, falling back to defaults.
///
/// A missing file is routine (first run). A file that can't be read or
/// parsed is logged and ignored so a typo never locks the user out.
#[instrument(name = "load_settings", skip_all, fields(path = %path.display()))]
pub fn load_settings(path: &Path) -> Settings {
    match try_load_settings(path) {
        Ok(Some(settings)) => {
            debug!(recursive = settings.recursive, "Loaded settings");
            settings
        }
        Ok(None) => {
            info!("Settings file not found, using defaults");
            Settings::default()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load settings, using defaults");
            Settings::default()
        }
    }
}

/// Load settings from `path`; `Ok(None)` if the file doesn't exist
pub fn try_load_settings(path: &Path) -> Result<Option<Settings>, SettingsError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Save settings as pretty JSON, creating parent directories
pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    let io_err = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(settings)?;

    // Atomic write: readers see the old file or the new one, never a mix
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content).map_err(io_err)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_err(e));
    }
    debug!(path = %path.display(), "Saved settings");
    Ok(())
}

/// Write the default script directories file if none exists.
///
/// Returns true if the file was created.
pub fn install_default_patterns(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_PATTERN_FILE)?;
    info!(path = %path.display(), "Installed default script directories");
    Ok(true)
}
