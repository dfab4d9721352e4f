//! Search-path templates
//!
//! A pattern such as `~/Library/Scripts/Applications/{name}` is parsed into
//! literal and placeholder segments, then expanded in three steps:
//!
//! 1. every placeholder is resolved against the [`Context`] (unknown names
//!    are an error, nothing is left unexpanded)
//! 2. `~` and `$VARIABLE` references in the literal text are expanded
//! 3. the result is made absolute and `.`/`..` are folded
//!
//! Context values are inserted verbatim: an app called `$HOME` stays `$HOME`.
//! `{{` and `}}` produce literal braces; `${VAR}` is an environment variable,
//! not a placeholder.

use std::path::{Component, Path, PathBuf};

use crate::context::Context;
use crate::error::TemplateError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Parsed search-path pattern
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(pattern: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '{' if literal.ends_with('$') => {
                    // ${VAR}: keep for environment expansion
                    literal.push('{');
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        literal.push(c);
                        if c == '}' {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed {
                            offset,
                            pattern: pattern.to_string(),
                        });
                    }
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed {
                            offset,
                            pattern: pattern.to_string(),
                        });
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder {
                            pattern: pattern.to_string(),
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(TemplateError::StrayBrace {
                        offset,
                        pattern: pattern.to_string(),
                    });
                }
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True if any part of the path depends on the context
    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }

    /// Expand into an absolute directory path for `context`
    pub fn expand(&self, context: &Context) -> Result<PathBuf, TemplateError> {
        // Step 1: resolve every placeholder before touching the environment
        let mut resolved: Vec<(&str, bool)> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => resolved.push((text.as_str(), true)),
                Segment::Placeholder(name) => {
                    let value = context.attribute(name).ok_or_else(|| {
                        TemplateError::UnknownPlaceholder {
                            name: name.clone(),
                            pattern: self.source.clone(),
                        }
                    })?;
                    resolved.push((value, false));
                }
            }
        }

        // Step 2: expand ~ and $VARS in pattern text only
        let mut rendered = String::new();
        for (index, (text, is_literal)) in resolved.into_iter().enumerate() {
            if is_literal {
                rendered.push_str(&self.expand_shell(text, index == 0)?);
            } else {
                rendered.push_str(text);
            }
        }

        // Step 3: absolute, lexically normalized
        Ok(absolutize(Path::new(&rendered)))
    }

    fn expand_shell(&self, text: &str, at_start: bool) -> Result<String, TemplateError> {
        let unset = |e: shellexpand::LookupError<std::env::VarError>| {
            TemplateError::UnsetVariable {
                var: e.var_name,
                pattern: self.source.clone(),
            }
        };

        if !at_start {
            return shellexpand::env(text).map(|s| s.into_owned()).map_err(unset);
        }

        let expanded = shellexpand::full(text).map_err(unset)?.into_owned();
        if expanded == "~" || expanded.starts_with("~/") {
            return Err(TemplateError::NoHome {
                pattern: self.source.clone(),
            });
        }
        Ok(expanded)
    }
}

/// Parse and expand `pattern` in one step
pub fn expand_pattern(pattern: &str, context: &Context) -> Result<PathBuf, TemplateError> {
    Template::parse(pattern)?.expand(context)
}

/// Make `path` absolute against the working directory and fold `.`/`..`
/// without touching the filesystem.
fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
