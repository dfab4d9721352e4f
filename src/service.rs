//! Resolution service
//!
//! The public entry point: cache lookup, then resolution on a miss, then
//! fuzzy filtering. Settings, pattern sources, scanner and cache are all
//! handed in at construction; nothing here reads global state.

use std::path::Path;

use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use crate::cache::{cache_key, is_resolution_key, ResolutionCache};
use crate::config::{save_settings, Settings};
use crate::context::{Context, ContextProvider};
use crate::error::{ResultExt, SettingsError};
use crate::scripts::{
    FsScanner, FuzzyFilter, PatternSource, ResultSet, ScriptResolver, ScriptScanner,
    SourceDiagnostic,
};

/// Why a resolution produced what it did.
///
/// A failure to find the active application is an error rather than a
/// status; see [`ResolutionService::resolve_active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    Found,
    /// No scripts exist for the context at all
    NothingRegistered,
    /// Scripts exist but none matched the query
    NoMatches,
}

/// Outcome of one resolution pass
#[derive(Debug)]
pub struct Resolution {
    pub context: Context,
    pub entries: ResultSet,
    /// Sources skipped in this pass. Empty when served from cache.
    pub diagnostics: Vec<SourceDiagnostic>,
    pub from_cache: bool,
    pub status: ResolutionStatus,
}

/// Which cached resolutions to drop
#[derive(Debug, Clone, Copy)]
pub enum InvalidationScope<'a> {
    All,
    Context(&'a Context),
}

pub struct ResolutionService {
    settings: RwLock<Settings>,
    sources: Vec<PatternSource>,
    scanner: Box<dyn ScriptScanner>,
    cache: ResolutionCache,
}

impl ResolutionService {
    pub fn new(settings: Settings, sources: Vec<PatternSource>, cache: ResolutionCache) -> Self {
        let scanner = FsScanner::new(settings.max_depth);
        Self {
            settings: RwLock::new(settings),
            sources,
            scanner: Box::new(scanner),
            cache,
        }
    }

    pub fn with_scanner(mut self, scanner: impl ScriptScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn sources(&self) -> &[PatternSource] {
        &self.sources
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve the scripts for `context` and filter them by `query`
    #[instrument(skip_all, fields(id = %context.id, query = query.unwrap_or("")))]
    pub fn resolve(&self, context: &Context, query: Option<&str>) -> Resolution {
        // Held for the whole pass so a settings change can't slip in between
        // resolving and caching
        let settings = self.settings.read();
        let key = cache_key(context);

        let (entries, diagnostics, from_cache) = match self.cache.get(&key) {
            Some(entries) => (entries, Vec::new(), true),
            None => {
                let extensions = settings.extension_set();
                let output = ScriptResolver::new(self.scanner.as_ref(), &extensions).resolve(
                    context,
                    &self.sources,
                    settings.recursive,
                );
                self.cache.put(&key, &output.entries).warn_on_err();
                (output.entries, output.diagnostics, false)
            }
        };

        let filter = FuzzyFilter::new(settings.min_score).with_max_results(settings.max_results);
        let filtered = filter.filter(&entries, query);

        let status = if entries.is_empty() {
            ResolutionStatus::NothingRegistered
        } else if filtered.is_empty() {
            ResolutionStatus::NoMatches
        } else {
            ResolutionStatus::Found
        };

        info!(
            total = entries.len(),
            shown = filtered.len(),
            from_cache,
            status = ?status,
            "Resolution complete"
        );

        Resolution {
            context: context.clone(),
            entries: filtered,
            diagnostics,
            from_cache,
            status,
        }
    }

    /// Acquire the active context from `provider`, then [`Self::resolve`].
    /// A provider failure is returned as is, without retrying.
    pub fn resolve_active(
        &self,
        provider: &dyn ContextProvider,
        query: Option<&str>,
    ) -> crate::Result<Resolution> {
        let context = provider.acquire()?;
        Ok(self.resolve(&context, query))
    }

    /// Drop cached resolutions. Returns how many were removed.
    pub fn invalidate(&self, scope: InvalidationScope<'_>) -> usize {
        let removed = match scope {
            InvalidationScope::All => self.cache.invalidate(is_resolution_key),
            InvalidationScope::Context(context) => {
                let key = cache_key(context);
                self.cache.invalidate(|k| k == key)
            }
        };
        removed.log_err().unwrap_or(0)
    }

    pub fn set_recursive(&self, recursive: bool) {
        let mut settings = self.settings.write();
        if settings.recursive != recursive {
            settings.recursive = recursive;
            self.invalidate(InvalidationScope::All);
        }
    }

    /// Flip a boolean setting and clear every cached resolution.
    /// Returns the new value.
    pub fn toggle(&self, key: &str) -> Result<bool, SettingsError> {
        self.toggle_with(key, |_| Ok(()))
    }

    /// Like [`toggle`](Self::toggle), but the settings file at `path` holds
    /// the new value before any cached resolution is dropped. If the save
    /// fails, neither the setting nor the cache changes.
    pub fn toggle_and_persist(&self, key: &str, path: &Path) -> Result<bool, SettingsError> {
        self.toggle_with(key, |settings| save_settings(settings, path))
    }

    fn toggle_with<F>(&self, key: &str, persist: F) -> Result<bool, SettingsError>
    where
        F: FnOnce(&Settings) -> Result<(), SettingsError>,
    {
        let mut settings = self.settings.write();
        let mut updated = settings.clone();
        let value = updated.toggle(key).inspect_err(|e| {
            warn!(key, error = %e, "Cannot toggle setting");
        })?;
        persist(&updated).inspect_err(|e| {
            warn!(key, error = %e, "Failed to save settings");
        })?;
        *settings = updated;
        self.invalidate(InvalidationScope::All);
        info!(key, value, "Setting toggled");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;

    use parking_lot::Mutex;

    use crate::cache::{CacheRecord, CacheStore, ManualClock, MemoryStore};
    use crate::config::load_settings;
    use crate::error::CacheError;
    use crate::context::StaticContextProvider;
    use crate::error::AppScriptsError;
    use crate::scripts::{ExtensionSet, ScanIter};

    /// Counts scan calls, delegating to the file system scanner
    #[derive(Clone, Default)]
    struct CountingScanner {
        calls: Arc<AtomicUsize>,
        inner: FsScanner,
    }

    impl ScriptScanner for CountingScanner {
        fn scan(&self, dir: &Path, extensions: &ExtensionSet, recursive: bool) -> ScanIter {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.scan(dir, extensions, recursive)
        }
    }

    struct FailingProvider;

    impl ContextProvider for FailingProvider {
        fn acquire(&self) -> crate::Result<Context> {
            Err(AppScriptsError::ContextUnavailable("no frontmost app".into()))
        }
    }

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        service: ResolutionService,
        calls: Arc<AtomicUsize>,
        clock: Arc<ManualClock>,
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        touch(&root, "apps/com.apple.Safari/Save Tabs.scpt");
        touch(&root, "apps/com.apple.Safari/nested/Reader Mode.scpt");
        touch(&root, "general/Uptime.applescript");
        touch(&root, "general/Format Text.js");

        let sources = vec![
            PatternSource::new(format!("{}/apps/{{id}}", root.display())),
            PatternSource::new(format!("{}/general", root.display())),
        ];
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = ResolutionCache::with_clock(
            MemoryStore::new(),
            Duration::from_secs(30),
            clock.clone(),
        );
        let scanner = CountingScanner::default();
        let calls = Arc::clone(&scanner.calls);
        let service =
            ResolutionService::new(Settings::default(), sources, cache).with_scanner(scanner);

        Fixture {
            _dir: dir,
            root,
            service,
            calls,
            clock,
        }
    }

    fn safari() -> Context {
        Context::new("Safari", "com.apple.Safari")
    }

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn resolves_scoped_scripts_first() {
        let f = fixture();
        let resolution = f.service.resolve(&safari(), None);
        assert_eq!(names(&resolution), vec!["Save Tabs", "Format Text", "Uptime"]);
        assert_eq!(resolution.status, ResolutionStatus::Found);
        assert!(!resolution.from_cache);
        assert!(resolution.entries[0].is_scoped);
        assert!(f.root.exists());
    }

    #[test]
    fn second_resolution_within_ttl_does_not_rescan() {
        let f = fixture();
        let first = f.service.resolve(&safari(), None);
        let scans = f.calls.load(Ordering::SeqCst);
        assert_eq!(scans, 2);

        f.clock.advance(Duration::from_secs(29));
        let second = f.service.resolve(&safari(), None);
        assert_eq!(first.entries, second.entries);
        assert!(second.from_cache);
        assert_eq!(f.calls.load(Ordering::SeqCst), scans);
    }

    #[test]
    fn expired_resolution_rescans() {
        let f = fixture();
        f.service.resolve(&safari(), None);
        f.clock.advance(Duration::from_secs(30));
        let again = f.service.resolve(&safari(), None);
        assert!(!again.from_cache);
        assert_eq!(f.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn query_filters_cached_entries() {
        let f = fixture();
        f.service.resolve(&safari(), None);
        let resolution = f.service.resolve(&safari(), Some("fo"));
        assert!(resolution.from_cache);
        assert_eq!(names(&resolution), vec!["Format Text"]);
    }

    #[test]
    fn empty_results_are_distinguishable() {
        let f = fixture();
        let no_match = f.service.resolve(&safari(), Some("zzzz"));
        assert_eq!(no_match.status, ResolutionStatus::NoMatches);
        assert!(no_match.entries.is_empty());

        let empty = ResolutionService::new(
            Settings::default(),
            Vec::new(),
            ResolutionCache::in_memory(Duration::from_secs(30)),
        );
        let nothing = empty.resolve(&safari(), Some("fo"));
        assert_eq!(nothing.status, ResolutionStatus::NothingRegistered);

        let err = empty.resolve_active(&FailingProvider, None).unwrap_err();
        assert!(matches!(err, AppScriptsError::ContextUnavailable(_)));
    }

    #[test]
    fn resolve_active_uses_provider_context() {
        let f = fixture();
        let provider = StaticContextProvider(safari());
        let resolution = f.service.resolve_active(&provider, Some("save")).unwrap();
        assert_eq!(resolution.context, safari());
        assert_eq!(names(&resolution), vec!["Save Tabs"]);
    }

    #[test]
    fn toggling_recursive_clears_cache() {
        let f = fixture();
        let flat = f.service.resolve(&safari(), None);
        assert!(!f.service.cache().is_empty());

        assert!(f.service.toggle("recursive").unwrap());
        assert!(f.service.cache().is_empty());
        assert!(f.service.settings().recursive);

        let deep = f.service.resolve(&safari(), None);
        assert!(!deep.from_cache);
        assert_eq!(deep.entries.len(), flat.entries.len() + 1);
        assert!(deep.entries.iter().any(|e| e.name == "Reader Mode"));
    }

    #[test]
    fn toggle_unknown_key_keeps_cache() {
        let f = fixture();
        f.service.resolve(&safari(), None);
        assert!(matches!(
            f.service.toggle("nope"),
            Err(SettingsError::UnknownKey(_))
        ));
        assert!(!f.service.cache().is_empty());
    }

    /// Records the saved `recursive` value each time a record is dropped
    struct SettingsWitnessStore {
        inner: MemoryStore,
        settings_file: PathBuf,
        seen: Arc<Mutex<Vec<bool>>>,
    }

    impl CacheStore for SettingsWitnessStore {
        fn load(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
            self.inner.load(key)
        }

        fn store(&mut self, record: CacheRecord) -> Result<(), CacheError> {
            self.inner.store(record)
        }

        fn remove(&mut self, key: &str) -> Result<bool, CacheError> {
            let saved = load_settings(&self.settings_file).recursive;
            self.seen.lock().push(saved);
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>, CacheError> {
            self.inner.keys()
        }
    }

    #[test]
    fn toggle_and_persist_saves_before_clearing_cache() {
        let f = fixture();
        let settings_file = f.root.join("config/settings.json");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = SettingsWitnessStore {
            inner: MemoryStore::new(),
            settings_file: settings_file.clone(),
            seen: Arc::clone(&seen),
        };
        let cache = ResolutionCache::with_clock(store, Duration::from_secs(30), f.clock.clone());
        let sources = f.service.sources().to_vec();
        let service = ResolutionService::new(Settings::default(), sources, cache);

        service.resolve(&safari(), None);
        assert!(service.toggle_and_persist("recursive", &settings_file).unwrap());

        assert_eq!(*seen.lock(), vec![true]);
        assert!(load_settings(&settings_file).recursive);
        assert!(service.settings().recursive);
        assert!(service.cache().is_empty());
    }

    #[test]
    fn failed_save_changes_nothing() {
        let f = fixture();
        f.service.resolve(&safari(), None);

        // A directory where the settings file should be
        let blocked = f.root.join("blocked");
        std::fs::create_dir_all(&blocked).unwrap();

        assert!(matches!(
            f.service.toggle_and_persist("recursive", &blocked),
            Err(SettingsError::Io { .. })
        ));
        assert!(!f.service.settings().recursive);
        assert!(!f.service.cache().is_empty());
    }

    #[test]
    fn set_recursive_invalidates_only_on_change() {
        let f = fixture();
        f.service.resolve(&safari(), None);
        f.service.set_recursive(false);
        assert!(!f.service.cache().is_empty());
        f.service.set_recursive(true);
        assert!(f.service.cache().is_empty());
    }

    #[test]
    fn invalidate_single_context() {
        let f = fixture();
        let finder = Context::new("Finder", "com.apple.finder");
        f.service.resolve(&safari(), None);
        f.service.resolve(&finder, None);

        assert_eq!(f.service.invalidate(InvalidationScope::Context(&finder)), 1);
        assert_eq!(
            f.service.cache().keys().unwrap(),
            vec!["appscripts-com.apple.Safari"]
        );
        assert_eq!(f.service.invalidate(InvalidationScope::All), 1);
    }

    #[test]
    fn service_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResolutionService>();
    }
}
