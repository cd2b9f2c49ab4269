//! Engine configuration: schema, defaults, YAML loading, validation.
//!
//! Every tunable the engine exposes lives here so the probe, analyzer,
//! and adjudication layers never reach for environment state themselves.
//! The decision confidences and the fallback confidence are deliberately
//! configuration rather than constants: their original calibration is
//! unjustified and may need revisiting per deployment.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ============================================================================
// Top-level configuration
// ============================================================================

/// Root configuration for the probe and adjudication engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// External classifier endpoint. When absent, the analyzer runs
    /// rule-based only.
    #[serde(default)]
    pub classifier: Option<ClassifierConfig>,

    /// Blocking decision thresholds.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Probe pacing and timeout knobs.
    #[serde(default)]
    pub probe: ProbeConfig,
}

// ============================================================================
// Classifier
// ============================================================================

/// Connection settings for the external classifier tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub endpoint: String,

    /// Bearer token. May also be supplied via `REDPROBE_CLASSIFIER_TOKEN`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier passed through in the request body.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

const fn default_classifier_timeout() -> u64 {
    30
}

// ============================================================================
// Policy
// ============================================================================

/// Confidence assigned to each blocking decision, by threat level, plus
/// the confidence reported by the rule-based analyzer tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PolicyConfig {
    /// Confidence when blocking a Critical threat (always blocked).
    pub critical_confidence: f64,
    /// Confidence for the High row (blocks with >= 1 matching defense).
    pub high_confidence: f64,
    /// Confidence for the Medium row (blocks with >= 2 matching defenses).
    pub medium_confidence: f64,
    /// Confidence for the Low row (blocks with >= 3 matching defenses).
    pub low_confidence: f64,
    /// Confidence attached to rule-based assessments.
    pub fallback_confidence: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            critical_confidence: 0.95,
            high_confidence: 0.85,
            medium_confidence: 0.70,
            low_confidence: 0.60,
            fallback_confidence: 0.7,
        }
    }
}

// ============================================================================
// Probe pacing
// ============================================================================

/// Timeouts and pacing delays applied by the probe strategies.
///
/// Each per-operation timeout bounds a single network attempt so a hung
/// connection can never stall an entire batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProbeConfig {
    /// Per-request timeout for flood probes, in milliseconds.
    pub flood_timeout_ms: u64,
    /// Per-request timeout for injection and reflection probes.
    pub request_timeout_ms: u64,
    /// Per-request timeout for credential-guess probes.
    pub credential_timeout_ms: u64,
    /// TCP connect timeout for port sweeps.
    pub connect_timeout_ms: u64,
    /// Pause between flood batches (one tick).
    pub flood_tick_ms: u64,
    /// Pause between injection / reflection payload attempts.
    pub attempt_delay_ms: u64,
    /// Pause between credential attempts.
    pub credential_delay_ms: u64,
    /// Pause between port connect attempts.
    pub port_delay_ms: u64,
    /// Hard cap on ports scanned in a single sweep.
    pub max_ports: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            flood_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            credential_timeout_ms: 5_000,
            connect_timeout_ms: 1_000,
            flood_tick_ms: 1_000,
            attempt_delay_ms: 500,
            credential_delay_ms: 200,
            port_delay_ms: 50,
            max_ports: 100,
        }
    }
}

// ============================================================================
// Loading and validation
// ============================================================================

impl EngineConfig {
    /// Loads configuration from a YAML file, then applies environment
    /// overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if the path does not exist,
    /// [`ConfigError::ParseError`] on malformed YAML, and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.display().to_string(),
        })?;

        let mut config: Self =
            serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Fills in the classifier token from `REDPROBE_CLASSIFIER_TOKEN`
    /// when the file left it unset.
    pub fn apply_env(&mut self) {
        if let Some(classifier) = &mut self.classifier {
            if classifier.api_key.is_none() {
                classifier.api_key = std::env::var("REDPROBE_CLASSIFIER_TOKEN").ok();
            }
        }
    }

    /// Checks invariants that serde alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, value) in [
            ("policy.critical_confidence", self.policy.critical_confidence),
            ("policy.high_confidence", self.policy.high_confidence),
            ("policy.medium_confidence", self.policy.medium_confidence),
            ("policy.low_confidence", self.policy.low_confidence),
            ("policy.fallback_confidence", self.policy.fallback_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0.0-1.0, got {value}"
                )));
            }
        }

        if self.probe.max_ports == 0 {
            return Err(ConfigError::Invalid(
                "probe.max_ports must be at least 1".to_string(),
            ));
        }

        if let Some(classifier) = &self.classifier {
            if classifier.endpoint.is_empty() {
                return Err(ConfigError::Invalid(
                    "classifier.endpoint must not be empty".to_string(),
                ));
            }
            if classifier.timeout_secs == 0 {
                return Err(ConfigError::Invalid(
                    "classifier.timeout_secs must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Parses `key=value` pairs from the CLI into an opaque parameter map.
///
/// # Errors
///
/// Returns a message naming the malformed pair.
pub fn parse_parameters(
    pairs: &[String],
) -> std::result::Result<HashMap<String, serde_json::Value>, String> {
    let mut map = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!("expected key=value, got '{pair}'"));
        };
        map.insert(
            key.to_string(),
            serde_json::Value::String(value.to_string()),
        );
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_original_constants() {
        let policy = PolicyConfig::default();
        assert!((policy.critical_confidence - 0.95).abs() < f64::EPSILON);
        assert!((policy.high_confidence - 0.85).abs() < f64::EPSILON);
        assert!((policy.medium_confidence - 0.70).abs() < f64::EPSILON);
        assert!((policy.low_confidence - 0.60).abs() < f64::EPSILON);
        assert!((policy.fallback_confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn default_probe_timeouts() {
        let probe = ProbeConfig::default();
        assert_eq!(probe.flood_timeout_ms, 5_000);
        assert_eq!(probe.request_timeout_ms, 10_000);
        assert_eq!(probe.connect_timeout_ms, 1_000);
        assert_eq!(probe.max_ports, 100);
    }

    #[test]
    fn load_minimal_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "policy:\n  high_confidence: 0.9").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert!((config.policy.high_confidence - 0.9).abs() < f64::EPSILON);
        // Unspecified fields keep their defaults
        assert!((config.policy.critical_confidence - 0.95).abs() < f64::EPSILON);
        assert!(config.classifier.is_none());
    }

    #[test]
    fn load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/redprobe.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn reject_out_of_range_confidence() {
        let config = EngineConfig {
            policy: PolicyConfig {
                high_confidence: 1.5,
                ..PolicyConfig::default()
            },
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("high_confidence"));
    }

    #[test]
    fn reject_empty_classifier_endpoint() {
        let config = EngineConfig {
            classifier: Some(ClassifierConfig {
                endpoint: String::new(),
                api_key: None,
                model: default_model(),
                timeout_secs: 30,
            }),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_parameter_pairs() {
        let map = parse_parameters(&["mode=stealth".to_string(), "depth=3".to_string()]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["mode"], serde_json::json!("stealth"));
    }

    #[test]
    fn parse_parameter_rejects_bare_key() {
        assert!(parse_parameters(&["oops".to_string()]).is_err());
    }
}
