//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Whether script directories are searched recursively by default
pub const DEFAULT_RECURSIVE: bool = false;

/// How long a resolved script list stays valid (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Minimum fuzzy score (0-100) for a script to survive a query
pub const DEFAULT_MIN_SCORE: u8 = 30;

/// Deepest directory level visited in recursive mode
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Accepted script extensions (compared case-insensitively)
pub const DEFAULT_SCRIPT_EXTENSIONS: &[&str] = &["scpt", "applescript", "js"];

/// Environment variable overriding the data directory
pub const APP_SCRIPTS_HOME_ENV: &str = "APP_SCRIPTS_HOME";

/// Directory name under the platform data/cache dirs
pub const APP_DIR_NAME: &str = "app-scripts";

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const PATTERN_FILE_NAME: &str = "Script Directories.txt";
pub const LOG_FILE_NAME: &str = "app-scripts.jsonl";

/// Content installed when the script directories file is missing
pub const DEFAULT_PATTERN_FILE: &str = "\
# Directories searched for application scripts, one per line.
#
# {name} is replaced with the application's name (e.g. Safari) and
# {id} with its bundle identifier (e.g. com.apple.Safari). Directories
# containing a placeholder belong to that application and its scripts
# are listed first. ~ and $VARIABLES are expanded.

~/Library/Scripts/Applications/{name}
~/Library/Scripts/Applications/{id}
~/Library/Application Support/{name}/Scripts

# Scripts shown for every application
~/Library/Scripts/Applications/General
";
