//! `sweep` command: port sweep without assessment.

use std::collections::HashMap;

use crate::cli::args::SweepArgs;
use crate::cli::commands::load_config;
use crate::error::RedprobeError;
use crate::probe::{AttackKind, AttackRequest, ProbeEngine};

/// Runs a TCP port sweep and prints the raw probe result.
///
/// # Errors
///
/// Returns an error when configuration loading or request validation
/// fails.
pub async fn run(args: &SweepArgs) -> Result<(), RedprobeError> {
    let config = load_config(args.config.as_deref())?;

    let request = AttackRequest {
        kind: AttackKind::PortSweep,
        target: Some(args.target.clone()),
        intensity: 1,
        duration_secs: args.duration,
        parameters: HashMap::new(),
        ports: if args.ports.is_empty() {
            None
        } else {
            Some(args.ports.clone())
        },
    };

    let engine = ProbeEngine::new(config.probe);
    let result = engine.run(&request).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
