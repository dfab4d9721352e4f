//! Script directory patterns
//!
//! Patterns come from a plain text file, one per line. Blank lines and
//! lines starting with `#` are ignored.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::template::Template;

/// One search-path pattern and whether its directory belongs to the context
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternSource {
    pub pattern: String,
    /// Explicit scoping; None infers it from placeholder presence
    pub scoped: Option<bool>,
}

impl PatternSource {
    /// Scoped if the pattern contains a placeholder
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            scoped: None,
        }
    }

    pub fn scoped(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            scoped: Some(true),
        }
    }

    pub fn general(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            scoped: Some(false),
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped.unwrap_or_else(|| {
            Template::parse(&self.pattern)
                .map(|t| t.has_placeholders())
                .unwrap_or(false)
        })
    }
}

/// Parse the contents of a script directories file
pub fn parse_pattern_sources(content: &str) -> Vec<PatternSource> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PatternSource::new)
        .collect()
}

/// Read and parse a script directories file
pub fn load_pattern_sources(path: &Path) -> std::io::Result<Vec<PatternSource>> {
    let content = fs::read_to_string(path)?;
    let sources = parse_pattern_sources(&content);
    debug!(path = %path.display(), count = sources.len(), "Loaded script directories");
    Ok(sources)
}
