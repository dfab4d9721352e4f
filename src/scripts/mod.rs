//! Scripts module - Script discovery and ranking
//!
//! This module provides functionality for:
//! - Expanding search-path patterns against the active application
//! - Scanning script directories (flat or recursive)
//! - Merging candidates with application-specific scripts taking precedence
//! - Fuzzy filtering of the resolved scripts
//!
//! # Module Structure
//!
//! - `types` - Core data types (CandidateEntry, CandidateSet, diagnostics)
//! - `template` - Search-path template parsing and expansion
//! - `sources` - Script directory pattern file parsing
//! - `scanner` - Directory scanning
//! - `resolver` - Per-context resolution across all pattern sources
//! - `search` - Fuzzy filtering

mod resolver;
mod scanner;
mod search;
mod sources;
mod template;
mod types;

pub use types::{display_name, CandidateEntry, CandidateSet, ResultSet, SourceDiagnostic};

pub use template::{expand_pattern, Segment, Template};

pub use sources::{load_pattern_sources, parse_pattern_sources, PatternSource};

pub use scanner::{ExtensionSet, FsScanner, ScanIter, ScriptScanner};

pub use resolver::{ResolverOutput, ScriptResolver};

pub use search::{FuzzyFilter, FuzzyMatch, FuzzyScorer, Ranked};

#[cfg(test)]
#[path = "../scripts_tests.rs"]
mod tests;
