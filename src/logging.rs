//! Structured JSONL logging to a file and human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (`<data dir>/logs/app-scripts.jsonl`) - one event per line
//! - **Compact to stderr** - for running the commands by hand
//!
//! stdout is left alone: it carries the script filter feedback.
//!
//! # Usage
//!
//! ```rust,ignore
//! use app_scripts::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init(&paths.log_dir(), "info");
//!
//! // Use tracing macros directly
//! tracing::info!(count = 3, "Resolved scripts");
//! ```
//!
//! # JSONL Output Format
//!
//! Each line is a valid JSON object:
//! ```json
//! {"timestamp":"2024-12-25T10:30:45.123Z","level":"INFO","target":"app_scripts::scripts::resolver","fields":{"message":"Resolved scripts","app":"Safari","count":3,"skipped":0,"elapsed_ms":4}}
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LOG_FILE_NAME;

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// `default_filter` is used unless `RUST_LOG` is set. A log file that can't
/// be opened is replaced by a sink; logging never stops the program.
pub fn init(log_dir: &Path, default_filter: &str) -> LoggingGuard {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let path = log_path(log_dir);
    let (non_blocking_file, file_guard) = match open_log_file(&path) {
        Ok(file) => tracing_appender::non_blocking(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            tracing_appender::non_blocking(io::sink())
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .without_time()
        .compact();

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(stderr_layer)
        .try_init();

    tracing::debug!(
        event_type = "app_lifecycle",
        log_path = %path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Path of the JSONL log file inside `log_dir`
pub fn log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Default filter for the CLI verbosity flags
pub fn filter_for(verbose: bool, quiet: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_wins() {
        assert_eq!(filter_for(true, true, true), "debug");
        assert_eq!(filter_for(true, false, false), "info");
        assert_eq!(filter_for(false, true, false), "error");
        assert_eq!(filter_for(false, false, false), "warn");
    }

    #[test]
    fn log_file_is_created_in_log_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        {
            let _guard = init(&logs, "debug");
            tracing::info!("hello");
        }
        assert!(log_path(&logs).exists());
    }
}
