//! Cache backing stores
//!
//! - `MemoryStore`: in-process map, lives as long as the service
//! - `FileStore`: one JSON file per key, shared between invocations

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CacheError;
use crate::scripts::ResultSet;

/// A stored resolution and when it was stored
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub key: String,
    pub entries: ResultSet,
    /// Milliseconds since the Unix epoch
    pub cached_at_ms: u64,
}

/// Key-value storage for cache records.
///
/// Stores don't know about expiry; [`super::ResolutionCache`] checks age.
pub trait CacheStore: Send {
    fn load(&self, key: &str) -> Result<Option<CacheRecord>, CacheError>;
    /// Insert or replace the record for `record.key`
    fn store(&mut self, record: CacheRecord) -> Result<(), CacheError>;
    /// Returns true if a record was removed
    fn remove(&mut self, key: &str) -> Result<bool, CacheError>;
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, CacheRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
        Ok(self.records.get(key).cloned())
    }

    fn store(&mut self, record: CacheRecord) -> Result<(), CacheError> {
        self.records.insert(record.key.clone(), record);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, CacheError> {
        Ok(self.records.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.records.keys().cloned().collect())
    }
}

/// Stores each record as `<dir>/<key>.json`.
///
/// Keys must be valid file names; [`super::cache_key`] guarantees that for
/// resolution keys.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl CacheStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };
        let record = serde_json::from_str(&content).map_err(|source| CacheError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(record))
    }

    fn store(&mut self, record: CacheRecord) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let path = self.path_for(&record.key);
        let json = serde_json::to_string(&record).map_err(|source| CacheError::Corrupt {
            key: record.key.clone(),
            source,
        })?;

        // Atomic write: write to temp file, then rename
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).map_err(io_error(&tmp_path))?;
        fs::rename(&tmp_path, &path).map_err(io_error(&path))?;

        debug!(path = %path.display(), count = record.entries.len(), "Saved cache record");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.dir)(e)),
        };

        let mut keys = Vec::new();
        for entry in read_dir {
            let path = entry.map_err(io_error(&self.dir))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
