//! Command-line arguments for the `app-scripts` binary.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use app_scripts::Context;

#[derive(Parser, Debug)]
#[command(
    name = "app-scripts",
    version,
    about = "Find and run scripts for the active application",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: Verbosity,

    #[command(flatten)]
    pub app: AppArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List scripts for the active application, filtered by QUERY
    Search { query: Option<String> },
    /// List configuration options, filtered by QUERY
    Config { query: Option<String> },
    /// Flip a boolean setting and clear cached script lists
    Toggle { key: String },
    /// Open the script directories file
    Userpaths,
    /// Forget every cached script list
    ClearCache,
}

#[derive(Args, Debug, Default)]
pub struct Verbosity {
    /// Log more
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log everything
    #[arg(short, long, global = true)]
    pub debug: bool,
}

/// Use a fixed application instead of asking the system
#[derive(Args, Debug, Default)]
pub struct AppArgs {
    /// Application name
    #[arg(long, global = true, requires = "app_id", value_name = "NAME")]
    pub app_name: Option<String>,

    /// Application bundle identifier
    #[arg(long, global = true, requires = "app_name", value_name = "ID")]
    pub app_id: Option<String>,

    /// Application bundle path (used for icons)
    #[arg(long, global = true, requires = "app_id", value_name = "PATH")]
    pub app_path: Option<PathBuf>,
}

impl AppArgs {
    /// The fixed context, if one was given
    pub fn context(&self) -> Option<Context> {
        let (Some(name), Some(id)) = (&self.app_name, &self.app_id) else {
            return None;
        };
        let context = Context::new(name.as_str(), id.as_str());
        Some(match &self.app_path {
            Some(path) => context.with_path(path),
            None => context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_with_static_app() {
        let cli = Cli::try_parse_from([
            "app-scripts",
            "search",
            "save tabs",
            "--app-name",
            "Safari",
            "--app-id",
            "com.apple.Safari",
            "-d",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Search {
                query: Some("save tabs".to_string())
            }
        );
        assert!(cli.verbosity.debug);
        assert_eq!(
            cli.app.context(),
            Some(Context::new("Safari", "com.apple.Safari"))
        );
    }

    #[test]
    fn app_id_requires_name() {
        assert!(Cli::try_parse_from(["app-scripts", "search", "--app-id", "x"]).is_err());
    }

    #[test]
    fn parses_toggle_and_clear_cache() {
        let cli = Cli::try_parse_from(["app-scripts", "toggle", "recursive"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Toggle {
                key: "recursive".to_string()
            }
        );
        assert_eq!(cli.app.context(), None);

        let cli = Cli::try_parse_from(["app-scripts", "clear-cache"]).unwrap();
        assert_eq!(cli.command, Command::ClearCache);
    }
}
