//! Locations of settings, caches and logs

use std::path::PathBuf;

use super::defaults::*;

/// Directories and files used by App Scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl AppPaths {
    /// Resolve paths for this process.
    ///
    /// Priority:
    /// 1. APP_SCRIPTS_HOME environment variable (data, with `cache/` inside)
    /// 2. Platform data and cache directories
    /// 3. Temp directory fallback (if neither is known)
    pub fn discover() -> Self {
        if let Ok(home) = std::env::var(APP_SCRIPTS_HOME_ENV) {
            return Self::at(shellexpand::tilde(&home).into_owned());
        }

        let data_dir = dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| std::env::temp_dir().join(APP_DIR_NAME));
        let cache_dir = dirs::cache_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| data_dir.join("cache"));

        Self {
            data_dir,
            cache_dir,
        }
    }

    /// Keep everything under one root
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let data_dir = root.into();
        Self {
            cache_dir: data_dir.join("cache"),
            data_dir,
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn pattern_file(&self) -> PathBuf {
        self.data_dir.join(PATTERN_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
