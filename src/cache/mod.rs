//! Resolution cache
//!
//! Memoizes resolved script lists per application for a short time so that
//! every keystroke in a query doesn't rescan the script directories.
//!
//! Expiry is checked lazily in [`ResolutionCache::get`]; there is no
//! background eviction. All store access happens under one mutex, so a `get`
//! never observes a half-finished `invalidate`.

mod store;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::error::CacheError;
use crate::scripts::ResultSet;

pub use store::{CacheRecord, CacheStore, FileStore, MemoryStore};

/// Prefix shared by every resolution cache key
pub const CACHE_KEY_PREFIX: &str = "appscripts-";

/// Cache key for a context's resolution: `appscripts-<id>`, with bytes
/// outside `[A-Za-z0-9.-]` written as `_XX` hex. Distinct ids never share a
/// key and every key is a safe file name.
pub fn cache_key(context: &Context) -> String {
    let mut key = String::with_capacity(CACHE_KEY_PREFIX.len() + context.id.len());
    key.push_str(CACHE_KEY_PREFIX);
    for byte in context.id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
            key.push(byte as char);
        } else {
            key.push_str(&format!("_{:02X}", byte));
        }
    }
    key
}

pub fn is_resolution_key(key: &str) -> bool {
    key.starts_with(CACHE_KEY_PREFIX)
}

/// Source of "now" for TTL checks
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// TTL cache of resolved result sets
pub struct ResolutionCache {
    store: Mutex<Box<dyn CacheStore>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResolutionCache {
    pub fn new(store: impl CacheStore + 'static, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: impl CacheStore + 'static,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
            ttl,
            clock,
        }
    }

    /// In-memory cache, mostly for tests and one-shot callers
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(MemoryStore::new(), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached entries for `key` if present and younger than the TTL.
    ///
    /// Expired and unreadable records are removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<ResultSet> {
        let mut store = self.store.lock();
        let record = match store.load(key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding unreadable cache record");
                if let Err(e) = store.remove(key) {
                    warn!(key, error = %e, "Failed to remove cache record");
                }
                return None;
            }
        };

        let now = self.clock.now_ms();
        // A record from the future means the clock moved; don't trust it
        let fresh = record.cached_at_ms <= now
            && u128::from(now - record.cached_at_ms) < self.ttl.as_millis();
        if !fresh {
            debug!(key, cached_at_ms = record.cached_at_ms, now_ms = now, "Cache record expired");
            if let Err(e) = store.remove(key) {
                warn!(key, error = %e, "Failed to remove cache record");
            }
            return None;
        }

        debug!(key, count = record.entries.len(), "Cache hit");
        Some(record.entries)
    }

    /// Store `entries` under `key`, replacing any existing record
    pub fn put(&self, key: &str, entries: &ResultSet) -> Result<(), CacheError> {
        let record = CacheRecord {
            key: key.to_string(),
            entries: entries.clone(),
            cached_at_ms: self.clock.now_ms(),
        };
        self.store.lock().store(record)
    }

    /// Remove every record whose key matches `predicate`.
    /// Returns the number of records removed.
    pub fn invalidate<F>(&self, predicate: F) -> Result<usize, CacheError>
    where
        F: Fn(&str) -> bool,
    {
        let mut store = self.store.lock();
        let mut removed = 0;
        for key in store.keys()? {
            if predicate(&key) && store.remove(&key)? {
                removed += 1;
            }
        }
        info!(removed, "Invalidated cached resolutions");
        Ok(removed)
    }

    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = self.store.lock().keys()?;
        keys.sort();
        Ok(keys)
    }

    /// True if no records are stored, expired or not
    pub fn is_empty(&self) -> bool {
        self.keys().map(|k| k.is_empty()).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
