//! App Scripts - find and rank scripts for the active application
//!
//! This library resolves the scripts that belong to an application context
//! (its name and bundle identifier), caches the resolution, and ranks the
//! result against a free-text query.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod feedback;
pub mod logging;
pub mod scripts;
pub mod service;

pub use context::{Context, ContextProvider};
pub use error::{AppScriptsError, Result};
pub use service::{Resolution, ResolutionService, ResolutionStatus};
