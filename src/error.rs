//! Error types for `redprobe`.
//!
//! A `thiserror` hierarchy with one enum per subsystem, aggregated into
//! [`RedprobeError`] for exit-code mapping at the CLI boundary.
//!
//! Per-attempt network failures during a probe run are deliberately *not*
//! represented here: they are absorbed into the probe's counters
//! (failed / closed / filtered) and never abort a run.

use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `redprobe` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Invalid attack request (missing target, out-of-range intensity)
    pub const REQUEST_ERROR: i32 = 5;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `redprobe` operations.
///
/// Aggregates all domain-specific errors and provides a unified
/// interface for error handling and exit code mapping.
#[derive(Debug, Error)]
pub enum RedprobeError {
    /// Attack request validation error
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// External classifier error
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RedprobeError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Probe(_) => ExitCode::REQUEST_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Analyzer(_) | Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Probe Errors
// ============================================================================

/// Attack request precondition violations.
///
/// These are the only errors a probe surfaces to the caller; they are
/// raised synchronously, before any network operation is attempted.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The attack kind requires a target but none was supplied.
    #[error("target is required for {kind} probes")]
    MissingTarget {
        /// The requested attack kind
        kind: String,
    },

    /// Intensity outside the accepted 1–10 range.
    #[error("intensity {value} out of range (expected 1-10)")]
    IntensityOutOfRange {
        /// The rejected value
        value: u8,
    },

    /// Duration must be strictly positive.
    #[error("duration must be greater than zero")]
    ZeroDuration,

    /// The target could not be interpreted as a URL or host.
    #[error("invalid target '{target}': {message}")]
    InvalidTarget {
        /// The rejected target string
        target: String,
        /// Parser diagnostic
        message: String,
    },
}

// ============================================================================
// Analyzer Errors
// ============================================================================

/// External classifier tier failures.
///
/// Inside a run these never propagate: the analyzer degrades to its
/// rule-based tier. They are public so the classifier client can be
/// exercised directly.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Transport-level failure reaching the classifier.
    #[error("classifier request failed: {0}")]
    Network(String),

    /// Classifier returned a non-2xx status.
    #[error("classifier returned status {status}")]
    HttpStatus {
        /// The HTTP status code received
        status: u16,
    },

    /// Response body could not be decoded into an assessment.
    #[error("unusable classifier response: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: String,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: String,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `redprobe` operations.
pub type Result<T> = std::result::Result<T, RedprobeError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::REQUEST_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
    }

    #[test]
    fn test_probe_error_exit_code() {
        let err: RedprobeError = ProbeError::MissingTarget {
            kind: "flood".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::REQUEST_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: RedprobeError = ConfigError::MissingFile {
            path: "/missing.yaml".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_analyzer_error_exit_code() {
        let err: RedprobeError = AnalyzerError::HttpStatus { status: 503 }.into();
        assert_eq!(err.exit_code(), ExitCode::ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: RedprobeError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_missing_target_display() {
        let err = ProbeError::MissingTarget {
            kind: "port-sweep".to_string(),
        };
        assert!(err.to_string().contains("port-sweep"));
        assert!(err.to_string().contains("target is required"));
    }

    #[test]
    fn test_intensity_display() {
        let err = ProbeError::IntensityOutOfRange { value: 11 };
        assert!(err.to_string().contains("11"));
        assert!(err.to_string().contains("1-10"));
    }
}
