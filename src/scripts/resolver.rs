//! Resolve the scripts belonging to a context
//!
//! Each pattern source is expanded and scanned in order. A source that
//! fails to expand, or a directory that can't be fully read, is recorded as
//! a diagnostic and resolution carries on with the remaining sources.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::scanner::{ExtensionSet, ScriptScanner};
use super::sources::PatternSource;
use super::template::Template;
use super::types::{display_name, CandidateEntry, CandidateSet, ResultSet, SourceDiagnostic};
use crate::context::Context;

/// Result of one resolver pass
#[derive(Debug, Default)]
pub struct ResolverOutput {
    pub entries: ResultSet,
    pub diagnostics: Vec<SourceDiagnostic>,
}

/// Expands pattern sources and merges what the scanner finds in them
pub struct ScriptResolver<'a> {
    scanner: &'a dyn ScriptScanner,
    extensions: &'a ExtensionSet,
}

impl<'a> ScriptResolver<'a> {
    pub fn new(scanner: &'a dyn ScriptScanner, extensions: &'a ExtensionSet) -> Self {
        Self {
            scanner,
            extensions,
        }
    }

    #[instrument(level = "debug", skip_all, fields(id = %context.id, recursive = recursive))]
    pub fn resolve(
        &self,
        context: &Context,
        sources: &[PatternSource],
        recursive: bool,
    ) -> ResolverOutput {
        let started = Instant::now();
        let mut candidates = CandidateSet::new();
        let mut diagnostics = Vec::new();

        for source in sources {
            let partial = self.resolve_source(context, source, recursive, &mut diagnostics);
            candidates.merge(partial);
        }

        let entries = candidates.into_result_set();
        info!(
            app = %context.name,
            count = entries.len(),
            skipped = diagnostics.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Resolved scripts"
        );

        ResolverOutput {
            entries,
            diagnostics,
        }
    }

    /// Scan one source into its own partial set
    fn resolve_source(
        &self,
        context: &Context,
        source: &PatternSource,
        recursive: bool,
        diagnostics: &mut Vec<SourceDiagnostic>,
    ) -> CandidateSet {
        let mut partial = CandidateSet::new();

        let template = match Template::parse(&source.pattern) {
            Ok(template) => template,
            Err(error) => {
                warn!(pattern = %source.pattern, error = %error, "Skipping script directory");
                diagnostics.push(SourceDiagnostic::Template {
                    pattern: source.pattern.clone(),
                    error,
                });
                return partial;
            }
        };
        let scoped = source.scoped.unwrap_or_else(|| template.has_placeholders());

        let dir = match template.expand(context) {
            Ok(dir) => dir,
            Err(error) => {
                warn!(pattern = %source.pattern, error = %error, "Skipping script directory");
                diagnostics.push(SourceDiagnostic::Template {
                    pattern: source.pattern.clone(),
                    error,
                });
                return partial;
            }
        };

        for found in self.scanner.scan(&dir, self.extensions, recursive) {
            match found {
                Ok(path) => {
                    // Listed under the name it was found as, identified by its target
                    let name = display_name(&path);
                    partial.insert(CandidateEntry::with_name(name, canonical(path), scoped));
                }
                Err(error) => {
                    warn!(dir = %dir.display(), error = %error, "Failed to read part of script directory");
                    diagnostics.push(SourceDiagnostic::Scan {
                        pattern: source.pattern.clone(),
                        directory: dir.clone(),
                        error,
                    });
                }
            }
        }

        debug!(dir = %dir.display(), scoped, count = partial.len(), "Loaded scripts from directory");
        partial
    }
}

/// Identity of a discovered file; falls back to the path as found
fn canonical(path: PathBuf) -> PathBuf {
    std::fs::canonicalize(&path).unwrap_or(path)
}
