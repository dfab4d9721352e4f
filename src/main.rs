//! `app-scripts` - list the scripts for the frontmost application as
//! script filter feedback, and manage the settings behind it.

mod cli;

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{debug, warn};

use app_scripts::cache::{FileStore, ResolutionCache};
use app_scripts::config::{install_default_patterns, load_settings, AppPaths, Settings};
use app_scripts::context::{CommandContextProvider, ContextProvider, StaticContextProvider};
use app_scripts::error::ResultExt;
use app_scripts::feedback::{config_feedback, error_feedback, resolution_feedback, Feedback};
use app_scripts::logging;
use app_scripts::scripts::{load_pattern_sources, FuzzyFilter};
use app_scripts::service::{InvalidationScope, ResolutionService};

use cli::{AppArgs, Cli, Command};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let paths = AppPaths::discover();

    let verbosity = &cli.verbosity;
    let filter = logging::filter_for(verbosity.verbose, verbosity.quiet, verbosity.debug);
    let _guard = logging::init(&paths.log_dir(), filter);
    debug!(data_dir = %paths.data_dir.display(), command = ?cli.command, "Starting");

    let settings = load_settings(&paths.settings_file());

    let pattern_file = paths.pattern_file();
    install_default_patterns(&pattern_file).warn_on_err();
    let sources = load_pattern_sources(&pattern_file).log_err().unwrap_or_default();

    let cache = ResolutionCache::new(FileStore::new(&paths.cache_dir), settings.cache_ttl());
    let provider = context_provider(&cli.app, &settings);
    let service = ResolutionService::new(settings, sources, cache);

    match cli.command {
        Command::Search { query } => {
            match service.resolve_active(provider.as_ref(), query.as_deref()) {
                Ok(resolution) => {
                    for diagnostic in &resolution.diagnostics {
                        warn!(pattern = diagnostic.pattern(), "{}", diagnostic);
                    }
                    emit(&resolution_feedback(&resolution))?;
                }
                Err(e) => {
                    emit(&error_feedback(&e))?;
                    return Ok(ExitCode::from(1));
                }
            }
        }
        Command::Config { query } => {
            let settings = service.settings();
            let filter = FuzzyFilter::new(settings.min_score);
            emit(&config_feedback(settings.recursive, query.as_deref(), &filter))?;
        }
        Command::Toggle { key } => {
            let value = service.toggle_and_persist(&key, &paths.settings_file())?;
            println!("Option '{}' turned {}", key, if value { "on" } else { "off" });
        }
        Command::Userpaths => {
            open::that(&pattern_file)
                .with_context(|| format!("Failed to open {}", pattern_file.display()))?;
        }
        Command::ClearCache => {
            let removed = service.invalidate(InvalidationScope::All);
            println!("Cleared {} cached script lists", removed);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Fixed app from the command line, else the configured helper, else osascript
fn context_provider(app: &AppArgs, settings: &Settings) -> Box<dyn ContextProvider> {
    if let Some(context) = app.context() {
        return Box::new(StaticContextProvider(context));
    }
    match &settings.context_command {
        Some(command) => Box::new(CommandContextProvider::new(
            shellexpand::tilde(command).into_owned(),
        )),
        None => Box::new(CommandContextProvider::osascript()),
    }
}

fn emit(feedback: &Feedback) -> Result<()> {
    println!("{}", feedback.to_json()?);
    Ok(())
}
