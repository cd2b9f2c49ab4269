//! `analyze` command: assessment and decision without probing.

use serde_json::json;

use crate::adjudicate::decide;
use crate::analyzer::{AttackSignal, ThreatAnalyzer};
use crate::cli::args::AnalyzeArgs;
use crate::cli::commands::load_config;
use crate::config::parse_parameters;
use crate::error::{ConfigError, RedprobeError};
use crate::run::{DefenseRegistry, MemoryDefenseRegistry};

/// Assesses a declared attack and prints the assessment plus the
/// decision it would produce against the default defense set.
///
/// # Errors
///
/// Returns an error when configuration loading or parameter parsing
/// fails.
pub async fn run(args: &AnalyzeArgs) -> Result<(), RedprobeError> {
    let config = load_config(args.config.as_deref())?;
    let parameters = parse_parameters(&args.params).map_err(ConfigError::Invalid)?;

    let signal = AttackSignal {
        attack_type: args.kind,
        intensity: args.intensity,
        duration: args.duration,
        target_url: args.target.clone(),
        parameters,
    };

    let analyzer = ThreatAnalyzer::new(&config);
    let assessment = analyzer.analyze(&signal).await;

    let defenses = MemoryDefenseRegistry::with_defaults();
    let decision = decide(&assessment, &defenses.active_defenses(), &config.policy);

    let output = json!({
        "assessment": assessment,
        "decision": decision,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
