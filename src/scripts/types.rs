//! Script candidate type definitions
//!
//! This module contains the core data types produced by a resolution pass:
//! individual candidates, the accumulating candidate set that applies the
//! scoped-wins precedence rule, and per-source diagnostics.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, TemplateError};

/// A script found in one of the search directories
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateEntry {
    /// Filename without extension (e.g., "Save Tabs" for "Save Tabs.scpt")
    pub name: String,
    /// Canonical absolute path, the entry's identity
    pub path: PathBuf,
    /// Found in a directory belonging to the active application
    pub is_scoped: bool,
}

impl CandidateEntry {
    pub fn new(path: impl Into<PathBuf>, is_scoped: bool) -> Self {
        let path = path.into();
        Self::with_name(display_name(&path), path, is_scoped)
    }

    /// Entry whose display name doesn't come from `path`, e.g. a symlink
    /// listed under its own name but identified by its target
    pub fn with_name(name: impl Into<String>, path: impl Into<PathBuf>, is_scoped: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_scoped,
        }
    }
}

/// Filename without its extension
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Ordered, duplicate-free candidates: scoped first, then by name, then path
pub type ResultSet = Vec<CandidateEntry>;

/// Accumulates candidates keyed by path.
///
/// Re-inserting a path can only upgrade it from general to scoped. When one
/// file is reached under several names (through symlinks) with the same
/// scoping, the smallest name is kept. Both rules are monotonic, so `insert`
/// order and `merge` order never change the final set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateSet {
    entries: HashMap<PathBuf, CandidateEntry>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate. Returns true if the set changed.
    pub fn insert(&mut self, entry: CandidateEntry) -> bool {
        match self.entries.entry(entry.path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                let upgrade = entry.is_scoped && !current.is_scoped;
                let rename = entry.is_scoped == current.is_scoped && entry.name < current.name;
                if upgrade || rename {
                    slot.insert(entry);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Fold another partial set into this one
    pub fn merge(&mut self, other: CandidateSet) {
        for entry in other.entries.into_values() {
            self.insert(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&CandidateEntry> {
        self.entries.get(path)
    }

    /// Sorted by `(not scoped, name, path)`, independent of insertion order
    pub fn into_result_set(self) -> ResultSet {
        let mut entries: ResultSet = self.entries.into_values().collect();
        entries.sort_by(|a, b| {
            (!a.is_scoped, &a.name, &a.path).cmp(&(!b.is_scoped, &b.name, &b.path))
        });
        entries
    }
}

impl FromIterator<CandidateEntry> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = CandidateEntry>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

/// A pattern source that was skipped, fully or in part
#[derive(Debug)]
pub enum SourceDiagnostic {
    /// The pattern couldn't be expanded; the whole source was skipped
    Template {
        pattern: String,
        error: TemplateError,
    },
    /// Part of the directory couldn't be read; the rest was scanned
    Scan {
        pattern: String,
        directory: PathBuf,
        error: ScanError,
    },
}

impl SourceDiagnostic {
    pub fn pattern(&self) -> &str {
        match self {
            Self::Template { pattern, .. } | Self::Scan { pattern, .. } => pattern,
        }
    }
}

impl fmt::Display for SourceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template { error, .. } => write!(f, "skipped: {}", error),
            Self::Scan {
                directory, error, ..
            } => write!(f, "partially scanned '{}': {}", directory.display(), error),
        }
    }
}
