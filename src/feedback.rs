//! Script-filter feedback
//!
//! Turns resolutions, errors and configuration options into the JSON item
//! list Alfred-style launchers read from a script filter's stdout.

use std::path::Path;

use serde::Serialize;

use crate::error::{AppScriptsError, ErrorSeverity};
use crate::scripts::FuzzyFilter;
use crate::service::{Resolution, ResolutionStatus};

const CORE_TYPES: &str = "/System/Library/CoreServices/CoreTypes.bundle/Contents/Resources";

pub const ICON_ERROR: &str = "AlertStopIcon.icns";
pub const ICON_WARNING: &str = "AlertCautionIcon.icns";
pub const ICON_INFO: &str = "ToolbarInfo.icns";

pub const ICON_ON: &str = "icons/toggle_on.icns";
pub const ICON_OFF: &str = "icons/toggle_off.icns";
pub const ICON_EDIT: &str = "icons/edit.icns";
pub const ICON_RESET: &str = "icons/trash.icns";

/// Top-level script filter output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    /// `fileicon` shows the icon of the file at `path`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub path: String,
}

impl Icon {
    pub fn image(path: impl Into<String>) -> Self {
        Self {
            kind: None,
            path: path.into(),
        }
    }

    pub fn file_icon(path: &Path) -> Self {
        Self {
            kind: Some("fileicon".to_string()),
            path: path.display().to_string(),
        }
    }

    fn system(name: &str) -> Self {
        Self::image(format!("{}/{}", CORE_TYPES, name))
    }
}

impl Item {
    /// A non-actionable message row
    pub fn message(title: impl Into<String>, subtitle: impl Into<String>, icon: &str) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            icon: Some(Icon::system(icon)),
            ..Self::default()
        }
    }
}

impl Feedback {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One item per script, or a single message explaining why there are none
pub fn resolution_feedback(resolution: &Resolution) -> Feedback {
    let items = match resolution.status {
        ResolutionStatus::NothingRegistered => vec![Item::message(
            format!("No scripts for {}", resolution.context.name),
            "",
            ICON_WARNING,
        )],
        ResolutionStatus::NoMatches => vec![Item::message("No matching scripts", "", ICON_WARNING)],
        ResolutionStatus::Found => resolution
            .entries
            .iter()
            .map(|entry| {
                // Application scripts show the app's icon
                let icon = match (&resolution.context.path, entry.is_scoped) {
                    (Some(app), true) => Icon::file_icon(app),
                    _ => Icon::file_icon(&entry.path),
                };
                let path = entry.path.display().to_string();
                Item {
                    uid: Some(path.clone()),
                    title: entry.name.clone(),
                    subtitle: "↩ to run".to_string(),
                    arg: Some(path),
                    valid: true,
                    autocomplete: None,
                    icon: Some(icon),
                }
            })
            .collect(),
    };
    Feedback { items }
}

/// Single message row for a failed command
pub fn error_feedback(error: &AppScriptsError) -> Feedback {
    let icon = match error.severity() {
        ErrorSeverity::Info => ICON_INFO,
        ErrorSeverity::Warning => ICON_WARNING,
        ErrorSeverity::Error => ICON_ERROR,
    };
    Feedback {
        items: vec![Item::message(error.user_message(), error.to_string(), icon)],
    }
}

/// Configuration options, filtered by `query` on their titles
pub fn config_feedback(recursive: bool, query: Option<&str>, filter: &FuzzyFilter) -> Feedback {
    let options = vec![
        Item {
            title: "Search Directories Recursively".to_string(),
            subtitle: "↩ to toggle recursive search".to_string(),
            arg: Some("toggle recursive".to_string()),
            valid: true,
            icon: Some(Icon::image(if recursive { ICON_ON } else { ICON_OFF })),
            ..Item::default()
        },
        Item {
            title: "Edit Script Directories".to_string(),
            subtitle: "↩ to edit script directories".to_string(),
            arg: Some("userpaths".to_string()),
            valid: true,
            icon: Some(Icon::image(ICON_EDIT)),
            ..Item::default()
        },
        Item {
            title: "Clear Cache".to_string(),
            subtitle: "↩ to forget cached script lists".to_string(),
            arg: Some("clear-cache".to_string()),
            valid: true,
            icon: Some(Icon::image(ICON_RESET)),
            ..Item::default()
        },
    ];

    let items = match query.map(str::trim) {
        None | Some("") => options,
        Some(query) => filter
            .rank_by(&options, query, |item| item.title.as_str())
            .into_iter()
            .map(|ranked| ranked.item.clone())
            .collect(),
    };
    Feedback { items }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context::Context;
    use crate::scripts::CandidateEntry;

    fn resolution(entries: Vec<CandidateEntry>, status: ResolutionStatus) -> Resolution {
        Resolution {
            context: Context::new("Safari", "com.apple.Safari")
                .with_path("/Applications/Safari.app"),
            entries,
            diagnostics: Vec::new(),
            from_cache: false,
            status,
        }
    }

    #[test]
    fn scoped_scripts_use_application_icon() {
        let feedback = resolution_feedback(&resolution(
            vec![
                CandidateEntry::new("/s/Safari/Save Tabs.scpt", true),
                CandidateEntry::new("/s/General/Uptime.scpt", false),
            ],
            ResolutionStatus::Found,
        ));
        assert_eq!(feedback.items.len(), 2);

        let scoped = &feedback.items[0];
        assert_eq!(scoped.title, "Save Tabs");
        assert_eq!(scoped.arg.as_deref(), Some("/s/Safari/Save Tabs.scpt"));
        assert_eq!(scoped.uid, scoped.arg);
        assert!(scoped.valid);
        assert_eq!(
            scoped.icon,
            Some(Icon::file_icon(Path::new("/Applications/Safari.app")))
        );

        let general = &feedback.items[1];
        assert_eq!(
            general.icon,
            Some(Icon::file_icon(Path::new("/s/General/Uptime.scpt")))
        );
    }

    #[test]
    fn empty_states_have_distinct_messages() {
        let nothing =
            resolution_feedback(&resolution(Vec::new(), ResolutionStatus::NothingRegistered));
        assert_eq!(nothing.items[0].title, "No scripts for Safari");
        assert!(!nothing.items[0].valid);

        let narrow = resolution_feedback(&resolution(Vec::new(), ResolutionStatus::NoMatches));
        assert_eq!(narrow.items[0].title, "No matching scripts");

        let failed = error_feedback(&AppScriptsError::ContextUnavailable("boom".into()));
        assert_eq!(failed.items[0].title, "Couldn't get frontmost application");
        assert!(failed.items[0]
            .icon
            .as_ref()
            .is_some_and(|i| i.path.ends_with(ICON_ERROR)));
    }

    #[test]
    fn json_uses_script_filter_field_names() {
        let feedback = resolution_feedback(&resolution(
            vec![CandidateEntry::new("/s/General/Uptime.scpt", false)],
            ResolutionStatus::Found,
        ));
        let value: serde_json::Value = serde_json::from_str(&feedback.to_json().unwrap()).unwrap();
        let item = &value["items"][0];
        assert_eq!(item["title"], "Uptime");
        assert_eq!(item["icon"]["type"], "fileicon");
        assert!(item.get("autocomplete").is_none());
    }

    #[test]
    fn config_options_reflect_and_filter() {
        let filter = FuzzyFilter::default();
        let all = config_feedback(true, None, &filter);
        assert_eq!(all.items.len(), 3);
        assert_eq!(all.items[0].icon, Some(Icon::image(ICON_ON)));
        assert_eq!(all.items[0].arg.as_deref(), Some("toggle recursive"));

        let edit = config_feedback(false, Some("edit"), &filter);
        assert_eq!(edit.items[0].arg.as_deref(), Some("userpaths"));

        let none = config_feedback(false, Some("zzz"), &filter);
        assert!(none.items.is_empty());
    }
}
