//! Adjudication policy: the block/allow decision.
//!
//! Converts a threat assessment plus the currently-active defense set
//! into a decision with a confidence score. Deterministic and
//! re-derivable: the decision is a pure function of its inputs and the
//! policy thresholds, so it is never persisted as authoritative state.

use serde::{Deserialize, Serialize};

use crate::analyzer::{ThreatAssessment, ThreatLevel};
use crate::config::PolicyConfig;

/// The block/allow decision for one attack run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicationDecision {
    /// Whether the attack should be blocked.
    pub should_block: bool,
    /// Decision confidence in `[0, 1]`.
    pub confidence: f64,
    /// Human-readable explanation reporting threat level and the
    /// active/recommended defense ratio.
    pub reason: String,
    /// Number of recommended defenses matched by an active defense.
    pub active_defense_overlap: usize,
}

/// Derives the block/allow decision for an assessment.
///
/// `active_recommended` counts recommended defenses matching any active
/// defense name case-insensitively by substring (so a recommendation of
/// `rate_limiting` matches an active `"AI Rate Limiting"` once the
/// separators are normalized by the caller's naming conventions — the
/// match is on the recommendation appearing inside the active name).
///
/// The decision table is ordered by threat level: Critical always
/// blocks; High blocks with at least one matching defense; Medium with
/// at least two; Low (or anything else) with at least three. The policy
/// is monotonic — for a fixed threat level, additional matching active
/// defenses never flip a block to an allow.
#[must_use]
pub fn decide(
    assessment: &ThreatAssessment,
    active_defenses: &[String],
    policy: &PolicyConfig,
) -> AdjudicationDecision {
    let active_lowered: Vec<String> = active_defenses
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    let active_recommended = assessment
        .recommended_defenses
        .iter()
        .filter(|recommended| {
            let needle = recommended.to_lowercase();
            active_lowered.iter().any(|active| active.contains(&needle))
        })
        .count();

    let (should_block, confidence) = match assessment.threat_level {
        ThreatLevel::Critical => (true, policy.critical_confidence),
        ThreatLevel::High => (active_recommended > 0, policy.high_confidence),
        ThreatLevel::Medium => (active_recommended >= 2, policy.medium_confidence),
        ThreatLevel::Low => (active_recommended >= 3, policy.low_confidence),
    };

    AdjudicationDecision {
        should_block,
        confidence,
        reason: format!(
            "Threat level: {}, Active defenses: {}/{}",
            assessment.threat_level,
            active_recommended,
            assessment.recommended_defenses.len()
        ),
        active_defense_overlap: active_recommended,
    }
}
