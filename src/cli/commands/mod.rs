//! CLI command dispatch and handlers.
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod analyze;
pub mod run;
pub mod sweep;
pub mod version;

use std::path::Path;

use crate::cli::args::{Cli, Commands};
use crate::config::EngineConfig;
use crate::error::RedprobeError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), RedprobeError> {
    match cli.command {
        Commands::Run(args) => run::run(&args).await,
        Commands::Sweep(args) => sweep::run(&args).await,
        Commands::Analyze(args) => analyze::run(&args).await,
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads engine configuration from an optional path.
///
/// With no path, defaults apply and only environment overrides are
/// consulted.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig, RedprobeError> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => {
            let mut config = EngineConfig::default();
            config.apply_env();
            Ok(config)
        }
    }
}
