//! Threat analysis: two-tier classification of attack runs.
//!
//! The analyzer prefers an external classifier when one is configured and
//! reachable, and otherwise falls back to a deterministic rule table.
//! This is an availability contract: [`ThreatAnalyzer::analyze`] is
//! infallible and always produces a usable assessment, with no network
//! access required.

pub mod client;
pub mod rules;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use client::ClassifierClient;

use crate::config::EngineConfig;
use crate::observability::metrics;
use crate::probe::{AttackKind, AttackRequest};

// ============================================================================
// Assessment types
// ============================================================================

/// Ordinal threat classification driving the adjudication thresholds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ThreatLevel {
    /// Background noise; blocked only under heavy defense coverage.
    Low,
    /// Default for unrecognized patterns.
    #[default]
    Medium,
    /// Serious; blocked when any recommended defense is active.
    High,
    /// Always blocked.
    Critical,
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Estimated attacker sophistication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sophistication {
    /// Low effort, commodity tooling.
    Low,
    /// Some customization.
    Medium,
    /// Targeted and resourced.
    High,
}

/// Descriptive attack characteristics attached to an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    /// Short description of the observed pattern.
    pub pattern: String,
    /// Estimated sophistication.
    pub sophistication: Sophistication,
    /// Free-form potential-damage estimate.
    pub potential_damage: String,
}

/// A threat assessment for one attack run.
///
/// Produced fresh per run and never mutated afterward. The serialized
/// shape is also the wire contract for the external classifier tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    /// Classification label.
    #[serde(rename = "attack_classification")]
    pub classification: String,
    /// Ordinal threat level.
    pub threat_level: ThreatLevel,
    /// Defense identifiers recommended against this threat.
    pub recommended_defenses: Vec<String>,
    /// Pattern description, sophistication, and damage estimate.
    pub characteristics: Characteristics,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
}

// ============================================================================
// Attack signal
// ============================================================================

/// The facts about an attack run handed to the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackSignal {
    /// Attack category.
    pub attack_type: AttackKind,
    /// Intensity on the 1–10 scale.
    pub intensity: u8,
    /// Requested run duration in seconds.
    pub duration: u64,
    /// Declared target, if any.
    pub target_url: Option<String>,
    /// Opaque caller-supplied parameters.
    pub parameters: HashMap<String, serde_json::Value>,
}

impl From<&AttackRequest> for AttackSignal {
    fn from(request: &AttackRequest) -> Self {
        Self {
            attack_type: request.kind,
            intensity: request.intensity,
            duration: request.duration_secs,
            target_url: request.target.clone(),
            parameters: request.parameters.clone(),
        }
    }
}

// ============================================================================
// Analyzer
// ============================================================================

/// Two-tier threat analyzer.
#[derive(Debug)]
pub struct ThreatAnalyzer {
    client: Option<ClassifierClient>,
    fallback_confidence: f64,
}

impl ThreatAnalyzer {
    /// Builds an analyzer from engine configuration. The external tier
    /// is active only when a classifier endpoint is configured.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: config.classifier.as_ref().map(ClassifierClient::new),
            fallback_confidence: config.policy.fallback_confidence,
        }
    }

    /// Builds a rule-based-only analyzer.
    #[must_use]
    pub const fn rule_based(fallback_confidence: f64) -> Self {
        Self {
            client: None,
            fallback_confidence,
        }
    }

    /// Whether the external classifier tier is configured.
    #[must_use]
    pub const fn has_external_tier(&self) -> bool {
        self.client.is_some()
    }

    /// Produces a threat assessment for the signal.
    ///
    /// Tries the external classifier first when configured; any failure
    /// there (transport, non-2xx, unusable body) silently degrades to
    /// the rule table. Never fails.
    pub async fn analyze(&self, signal: &AttackSignal) -> ThreatAssessment {
        if let Some(client) = &self.client {
            match client.classify(signal).await {
                Ok(assessment) => return assessment,
                Err(e) => {
                    debug!(error = %e, "external classifier unusable, using rule tier");
                    metrics::record_classifier_fallback();
                }
            }
        }

        rules::assess(signal.attack_type, signal.intensity, self.fallback_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn analyze_without_external_tier_uses_rules() {
        let analyzer = ThreatAnalyzer::rule_based(0.7);
        assert!(!analyzer.has_external_tier());

        let signal = AttackSignal {
            attack_type: AttackKind::Injection,
            intensity: 3,
            duration: 10,
            target_url: Some("http://example.com".to_string()),
            parameters: HashMap::new(),
        };

        let assessment = analyzer.analyze(&signal).await;
        assert_eq!(assessment.threat_level, ThreatLevel::Critical);
        assert!((assessment.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn threat_level_ordering() {
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert!(ThreatLevel::High < ThreatLevel::Critical);
    }

    #[test]
    fn assessment_wire_shape() {
        let assessment = rules::assess(AttackKind::Flood, 8, 0.7);
        let value = serde_json::to_value(&assessment).unwrap();

        assert_eq!(value["attack_classification"], "flood");
        assert_eq!(value["threat_level"], "High");
        assert!(value["recommended_defenses"].is_array());
        assert_eq!(value["characteristics"]["sophistication"], "High");
        assert!(value["confidence"].is_number());
    }

    #[test]
    fn assessment_decodes_from_wire_shape() {
        let raw = r#"{
            "attack_classification": "injection",
            "threat_level": "Critical",
            "recommended_defenses": ["ids", "firewall"],
            "characteristics": {
                "pattern": "union-based injection",
                "sophistication": "Medium",
                "potential_damage": "High"
            },
            "confidence": 0.92
        }"#;

        let assessment: ThreatAssessment = serde_json::from_str(raw).unwrap();
        assert_eq!(assessment.threat_level, ThreatLevel::Critical);
        assert_eq!(assessment.recommended_defenses.len(), 2);
    }

    #[test]
    fn signal_from_request() {
        let request = AttackRequest {
            kind: AttackKind::PortSweep,
            target: Some("example.com".to_string()),
            intensity: 4,
            duration_secs: 30,
            parameters: HashMap::new(),
            ports: Some(vec![80, 443]),
        };
        let signal = AttackSignal::from(&request);
        assert_eq!(signal.attack_type, AttackKind::PortSweep);
        assert_eq!(signal.duration, 30);
        assert_eq!(signal.target_url.as_deref(), Some("example.com"));
    }
}
