//! `run` command: one attack run end to end.

use crate::cli::args::{OutputFormat, RunArgs};
use crate::cli::commands::load_config;
use crate::config::parse_parameters;
use crate::error::{ConfigError, RedprobeError};
use crate::probe::AttackRequest;
use crate::run::Runner;

/// Executes one attack run (probe, assess, decide) and prints the
/// terminal run record.
///
/// # Errors
///
/// Returns an error when configuration loading or request validation
/// fails.
pub async fn run(args: &RunArgs) -> Result<(), RedprobeError> {
    let config = load_config(args.config.as_deref())?;
    let parameters = parse_parameters(&args.params).map_err(ConfigError::Invalid)?;

    let request = AttackRequest {
        kind: args.kind,
        target: args.target.clone(),
        intensity: args.intensity,
        duration_secs: args.duration,
        parameters,
        ports: None,
    };

    let runner = Runner::with_defaults(&config);
    let record = runner.run_to_completion(request).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Human => {
            println!("run {} {:?}", record.run_id, record.status);
            if let Some(decision) = &record.decision {
                let verdict = if decision.should_block {
                    "BLOCKED"
                } else {
                    "ALLOWED"
                };
                println!("{verdict} (confidence {:.2})", decision.confidence);
                println!("{}", decision.reason);
            }
            if let Some(message) = &record.message {
                println!("failure: {message}");
            }
        }
    }

    Ok(())
}
