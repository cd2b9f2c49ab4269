//! CLI argument definitions.
//!
//! All Clap derive structs for `redprobe` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::probe::AttackKind;

// ============================================================================
// Root CLI
// ============================================================================

/// Attack simulation and adjudication engine for defense research.
#[derive(Parser, Debug)]
#[command(name = "redprobe", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "REDPROBE_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one attack run end to end: probe, assess, decide.
    Run(RunArgs),

    /// Sweep a host's TCP ports without assessment.
    Sweep(SweepArgs),

    /// Assess and adjudicate a declared attack without probing.
    Analyze(AnalyzeArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Run Command
// ============================================================================

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Attack kind to simulate.
    #[arg(short, long, default_value = "flood")]
    pub kind: AttackKind,

    /// Target URL or host (required for every kind except `other`).
    #[arg(short, long)]
    pub target: Option<String>,

    /// Intensity on the 1-10 scale.
    #[arg(short, long, default_value_t = 5)]
    pub intensity: u8,

    /// Run duration in seconds.
    #[arg(short, long, default_value_t = 30)]
    pub duration: u64,

    /// Opaque attack parameters as key=value pairs (repeatable).
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Path to YAML configuration file.
    #[arg(short, long, env = "REDPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for the run record.
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

// ============================================================================
// Sweep Command
// ============================================================================

/// Arguments for `sweep`.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Target host or URL to sweep.
    #[arg(short, long)]
    pub target: String,

    /// Ports to scan (defaults to the well-known port table).
    #[arg(short, long, value_delimiter = ',')]
    pub ports: Vec<u16>,

    /// Time budget for the sweep in seconds.
    #[arg(short, long, default_value_t = 30)]
    pub duration: u64,

    /// Path to YAML configuration file.
    #[arg(short, long, env = "REDPROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Analyze Command
// ============================================================================

/// Arguments for `analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Attack kind to assess.
    #[arg(short, long, default_value = "flood")]
    pub kind: AttackKind,

    /// Declared target, carried into the assessment.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Intensity on the 1-10 scale.
    #[arg(short, long, default_value_t = 5)]
    pub intensity: u8,

    /// Declared duration in seconds.
    #[arg(short, long, default_value_t = 30)]
    pub duration: u64,

    /// Opaque attack parameters as key=value pairs (repeatable).
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Path to YAML configuration file.
    #[arg(short, long, env = "REDPROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Version Command
// ============================================================================

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_target() {
        let cli = Cli::try_parse_from([
            "redprobe",
            "run",
            "--kind",
            "injection",
            "--target",
            "http://victim.test",
        ]);
        assert!(cli.is_ok(), "Failed to parse: {cli:?}");
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["redprobe", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("Expected RunArgs");
        };
        assert_eq!(args.kind, AttackKind::Flood);
        assert_eq!(args.intensity, 5);
        assert_eq!(args.duration, 30);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_all_kinds_parse() {
        for kind in [
            "flood",
            "injection",
            "reflection",
            "credential-guess",
            "port-sweep",
            "other",
        ] {
            let cli = Cli::try_parse_from(["redprobe", "run", "--kind", kind]);
            assert!(cli.is_ok(), "Failed to parse kind={kind}");
        }
    }

    #[test]
    fn test_sweep_requires_target() {
        let result = Cli::try_parse_from(["redprobe", "sweep"]);
        assert!(result.is_err(), "Expected error for missing target");
    }

    #[test]
    fn test_sweep_port_list() {
        let cli =
            Cli::try_parse_from(["redprobe", "sweep", "--target", "host", "--ports", "80,443"])
                .unwrap();
        let Commands::Sweep(args) = cli.command else {
            panic!("Expected SweepArgs");
        };
        assert_eq!(args.ports, vec![80, 443]);
    }

    #[test]
    fn test_repeated_params() {
        let cli = Cli::try_parse_from([
            "redprobe",
            "analyze",
            "--param",
            "mode=stealth",
            "--param",
            "depth=3",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("Expected AnalyzeArgs");
        };
        assert_eq!(args.params.len(), 2);
    }

    #[test]
    fn test_help_output() {
        let result = Cli::try_parse_from(["redprobe", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let result = Cli::try_parse_from(["redprobe", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_color_choices_parse() {
        for variant in ["auto", "always", "never"] {
            let cli = Cli::try_parse_from(["redprobe", "--color", variant, "version"]);
            assert!(cli.is_ok(), "Failed to parse color={variant}");
        }
    }

    #[test]
    fn test_verbose_count() {
        let cli = Cli::try_parse_from(["redprobe", "-vvv", "version"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::try_parse_from(["redprobe", "--quiet", "version"]).unwrap();
        assert!(cli.quiet);
    }
}
