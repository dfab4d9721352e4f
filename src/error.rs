use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, warn};

/// Error severity for the result surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,    // informational
    Warning, // recoverable, resolution continued
    Error,   // resolution aborted
}

/// Top-level errors for App Scripts
#[derive(Error, Debug)]
pub enum AppScriptsError {
    #[error("Could not get frontmost application: {0}")]
    ContextUnavailable(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl AppScriptsError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ContextUnavailable(_) => ErrorSeverity::Error,
            Self::Template(_) => ErrorSeverity::Warning,
            Self::Scan(_) => ErrorSeverity::Warning,
            Self::Cache(_) => ErrorSeverity::Warning,
            Self::Settings(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::ContextUnavailable(_) => "Couldn't get frontmost application".to_string(),
            Self::Template(e) => format!("Invalid script directory: {}", e),
            Self::Scan(e) => format!("Could not read scripts: {}", e),
            Self::Cache(e) => format!("Cache issue: {}", e),
            Self::Settings(e) => format!("Configuration issue: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppScriptsError>;

/// A search-path pattern could not be turned into a directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{name}}}' in '{pattern}'")]
    UnknownPlaceholder { name: String, pattern: String },

    #[error("empty placeholder '{{}}' in '{pattern}'")]
    EmptyPlaceholder { pattern: String },

    #[error("unclosed '{{' at offset {offset} in '{pattern}'")]
    Unclosed { offset: usize, pattern: String },

    #[error("unmatched '}}' at offset {offset} in '{pattern}'")]
    StrayBrace { offset: usize, pattern: String },

    #[error("environment variable '{var}' is not set (in '{pattern}')")]
    UnsetVariable { var: String, pattern: String },

    #[error("home directory is unknown (in '{pattern}')")]
    NoHome { pattern: String },
}

/// A directory (or part of it) could not be read
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("symbolic link loop at '{}'", .path.display())]
    LinkLoop { path: PathBuf },
}

impl ScanError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::LinkLoop { path } => path,
        }
    }
}

/// Cache backing store failures
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O failed for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache record '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings file failures
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings I/O failed for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown setting '{0}'")]
    UnknownKey(String),
}

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use app_scripts::error::ResultExt;
///
/// // Keep going without the cache if the record can't be written
/// cache.put(&key, entries).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_unavailable_is_fatal_severity() {
        let err = AppScriptsError::ContextUnavailable("osascript exited 1".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.user_message(), "Couldn't get frontmost application");
    }

    #[test]
    fn template_error_message_shows_placeholder_braces() {
        let err = TemplateError::UnknownPlaceholder {
            name: "version".to_string(),
            pattern: "~/Scripts/{version}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown placeholder '{version}' in '~/Scripts/{version}'"
        );
        let wrapped = AppScriptsError::from(err);
        assert_eq!(wrapped.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn result_ext_returns_value_or_none() {
        let ok: std::result::Result<u8, String> = Ok(3);
        assert_eq!(ok.log_err(), Some(3));
        let err: std::result::Result<u8, String> = Err("boom".to_string());
        assert_eq!(err.warn_on_err(), None);
    }
}
