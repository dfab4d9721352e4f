//! Active application context
//!
//! A [`Context`] is captured once at the start of a resolution pass and never
//! mutated afterwards. Providers acquire it eagerly; nothing is filled in on
//! first access.

use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::error::{AppScriptsError, Result};

/// AppleScript returning `name\rbundle id\rpath` of the frontmost app
const AS_ACTIVE_APP: &str = r#"tell application "System Events"
    set appPath to (path to frontmost application)
    set posixPath to POSIX path of appPath
    set appName to name of the first process whose frontmost is true
    set bundleId to bundle identifier of (info for appPath)
    appName & return & bundleId & return & posixPath
end tell"#;

/// Identity of the application scripts are resolved for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    /// Display name (e.g., "Safari")
    pub name: String,
    /// Stable identifier (e.g., "com.apple.Safari")
    pub id: String,
    /// Application bundle path, used for result icons only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Context {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Value for a template placeholder, or None if the name is unknown.
    /// `app_name` and `bundle_id` are accepted for older pattern files.
    pub fn attribute(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "name" | "app_name" => Some(&self.name),
            "id" | "bundle_id" => Some(&self.id),
            _ => None,
        }
    }
}

/// Source of the active context
pub trait ContextProvider {
    fn acquire(&self) -> Result<Context>;
}

/// Always returns the same context
#[derive(Debug, Clone)]
pub struct StaticContextProvider(pub Context);

impl ContextProvider for StaticContextProvider {
    fn acquire(&self) -> Result<Context> {
        Ok(self.0.clone())
    }
}

/// Runs a helper program that prints the name, identifier and (optionally)
/// path of the active application, one per line.
#[derive(Debug, Clone)]
pub struct CommandContextProvider {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandContextProvider {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Query System Events through `osascript` (macOS)
    pub fn osascript() -> Self {
        Self::new("/usr/bin/osascript").arg("-e").arg(AS_ACTIVE_APP)
    }
}

impl ContextProvider for CommandContextProvider {
    #[instrument(name = "acquire_context", skip_all, fields(program = %self.program.display()))]
    fn acquire(&self) -> Result<Context> {
        let started = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| {
                error!(error = %e, "Failed to run context helper");
                AppScriptsError::ContextUnavailable(e.to_string())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = %output.status, stderr = %stderr, "Context helper failed");
            return Err(AppScriptsError::ContextUnavailable(stderr));
        }

        let context = parse_context_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            name = %context.name,
            id = %context.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Frontmost app"
        );
        Ok(context)
    }
}

/// Parse `name`, `id` and optional `path` separated by CR or LF
pub fn parse_context_output(output: &str) -> Result<Context> {
    let mut fields = output
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let name = fields.next();
    let id = fields.next();
    let (Some(name), Some(id)) = (name, id) else {
        return Err(AppScriptsError::ContextUnavailable(format!(
            "expected name and bundle id, got {:?}",
            output.trim()
        )));
    };

    let mut context = Context::new(name, id);
    if let Some(path) = fields.next() {
        context = context.with_path(path);
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_carriage_return_separated_output() {
        let ctx = parse_context_output("Safari\rcom.apple.Safari\r/Applications/Safari.app\n")
            .unwrap();
        assert_eq!(ctx.name, "Safari");
        assert_eq!(ctx.id, "com.apple.Safari");
        assert_eq!(ctx.path, Some(PathBuf::from("/Applications/Safari.app")));
    }

    #[test]
    fn path_is_optional() {
        let ctx = parse_context_output("Finder\ncom.apple.finder").unwrap();
        assert_eq!(ctx, Context::new("Finder", "com.apple.finder"));
    }

    #[test]
    fn missing_identifier_is_context_unavailable() {
        let err = parse_context_output("Finder\n").unwrap_err();
        assert!(matches!(err, AppScriptsError::ContextUnavailable(_)));
    }

    #[test]
    fn attribute_lookup_accepts_legacy_names() {
        let ctx = Context::new("Mail", "com.apple.mail");
        assert_eq!(ctx.attribute("name"), Some("Mail"));
        assert_eq!(ctx.attribute("app_name"), Some("Mail"));
        assert_eq!(ctx.attribute("bundle_id"), Some("com.apple.mail"));
        assert_eq!(ctx.attribute("version"), None);
    }

    #[test]
    fn missing_helper_program_is_context_unavailable() {
        let provider = CommandContextProvider::new("/nonexistent/app-scripts-helper");
        let err = provider.acquire().unwrap_err();
        assert!(matches!(err, AppScriptsError::ContextUnavailable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn command_provider_reads_helper_output() {
        let provider = CommandContextProvider::new("/bin/sh")
            .arg("-c")
            .arg("printf 'Notes\\rcom.apple.Notes\\r/Applications/Notes.app'");
        let ctx = provider.acquire().unwrap();
        assert_eq!(ctx.name, "Notes");
        assert_eq!(ctx.id, "com.apple.Notes");
    }

    #[cfg(unix)]
    #[test]
    fn failing_helper_is_context_unavailable() {
        let provider = CommandContextProvider::new("/bin/sh")
            .arg("-c")
            .arg("echo 'no frontmost app' >&2; exit 1");
        match provider.acquire() {
            Err(AppScriptsError::ContextUnavailable(msg)) => {
                assert_eq!(msg, "no frontmost app")
            }
            other => panic!("expected ContextUnavailable, got {:?}", other),
        }
    }
}
