//! Script discovery on the file system
//!
//! Scanning is lazy: the returned iterator walks the directory as it is
//! consumed. A missing directory yields nothing, since most patterns
//! (one per application) point at directories that don't exist.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::{DEFAULT_MAX_DEPTH, DEFAULT_SCRIPT_EXTENSIONS};
use crate::error::ScanError;

/// Lazy sequence of script paths (or per-entry read failures)
pub type ScanIter = Box<dyn Iterator<Item = Result<PathBuf, ScanError>> + Send>;

/// Accepted file extensions, stored lower-case without the leading dot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: Vec<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self {
            extensions: normalized,
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let lower = e.to_lowercase();
                self.extensions.iter().any(|accepted| *accepted == lower)
            })
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_EXTENSIONS)
    }
}

/// Finds candidate script files in a directory
pub trait ScriptScanner: Send + Sync {
    /// List files under `dir` whose extension is in `extensions`.
    /// Only direct children unless `recursive`; never yields directories.
    fn scan(&self, dir: &Path, extensions: &ExtensionSet, recursive: bool) -> ScanIter;
}

/// File system scanner.
///
/// Symbolic links are followed. In recursive mode a link pointing back at
/// one of its own ancestors is reported as [`ScanError::LinkLoop`] and not
/// descended into, and the walk stops at `max_depth` levels.
#[derive(Clone, Debug)]
pub struct FsScanner {
    max_depth: usize,
}

impl FsScanner {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }
}

impl Default for FsScanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl ScriptScanner for FsScanner {
    fn scan(&self, dir: &Path, extensions: &ExtensionSet, recursive: bool) -> ScanIter {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Script directory does not exist");
            return Box::new(std::iter::empty());
        }

        let depth = if recursive { self.max_depth } else { 1 };
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(depth)
            .follow_links(true)
            .sort_by_file_name();

        let root = dir.to_path_buf();
        let extensions = extensions.clone();
        Box::new(walker.into_iter().filter_map(move |entry| match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.into_path();
                extensions.matches(&path).then_some(Ok(path))
            }
            Err(err) => Some(Err(scan_error(err, &root))),
        }))
    }
}

fn scan_error(err: walkdir::Error, root: &Path) -> ScanError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    if err.loop_ancestor().is_some() {
        ScanError::LinkLoop { path }
    } else {
        ScanError::Io {
            path,
            source: std::io::Error::from(err),
        }
    }
}
