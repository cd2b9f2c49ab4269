//! Deterministic rule-based classification tier.
//!
//! A fixed lookup from attack kind (and intensity, for flood) to threat
//! level, recommended defenses, and characteristics. Pure: identical
//! `(kind, intensity)` always yields an identical assessment.

use crate::probe::AttackKind;

use super::{Characteristics, Sophistication, ThreatAssessment, ThreatLevel};

/// Classifies an attack by table lookup.
///
/// `fallback_confidence` is attached verbatim; the caller decides what a
/// rule-tier assessment is worth.
#[must_use]
pub fn assess(kind: AttackKind, intensity: u8, fallback_confidence: f64) -> ThreatAssessment {
    let threat_level = match kind {
        AttackKind::Flood => scale_by_intensity(intensity),
        AttackKind::Injection => ThreatLevel::Critical,
        AttackKind::Reflection => ThreatLevel::High,
        AttackKind::CredentialGuess | AttackKind::Other => ThreatLevel::Medium,
        AttackKind::PortSweep => ThreatLevel::Low,
    };

    let recommended_defenses = recommended_defenses(kind)
        .iter()
        .map(ToString::to_string)
        .collect();

    let sophistication = if intensity > 7 {
        Sophistication::High
    } else if intensity > 4 {
        Sophistication::Medium
    } else {
        Sophistication::Low
    };

    let potential_damage = match kind {
        AttackKind::Injection | AttackKind::Flood => "High",
        _ => "Medium",
    };

    ThreatAssessment {
        classification: kind.to_string(),
        threat_level,
        recommended_defenses,
        characteristics: Characteristics {
            pattern: format!("{kind} attack with intensity {intensity}"),
            sophistication,
            potential_damage: potential_damage.to_string(),
        },
        confidence: fallback_confidence,
    }
}

/// Flood threat level scales with intensity.
const fn scale_by_intensity(intensity: u8) -> ThreatLevel {
    if intensity > 7 {
        ThreatLevel::High
    } else if intensity > 4 {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// Fixed recommended-defense set per attack kind.
const fn recommended_defenses(kind: AttackKind) -> &'static [&'static str] {
    match kind {
        AttackKind::Flood => &["rate_limiting", "firewall", "ai_detection"],
        AttackKind::Injection => &["ids", "ai_detection", "firewall"],
        AttackKind::Reflection => &["ids", "ai_detection"],
        AttackKind::CredentialGuess => &["rate_limiting", "firewall"],
        AttackKind::PortSweep => &["firewall", "ids"],
        AttackKind::Other => &["ai_detection"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injection_is_always_critical() {
        for intensity in 1..=10 {
            let a = assess(AttackKind::Injection, intensity, 0.7);
            assert_eq!(a.threat_level, ThreatLevel::Critical);
        }
    }

    #[test]
    fn flood_scales_with_intensity() {
        assert_eq!(assess(AttackKind::Flood, 4, 0.7).threat_level, ThreatLevel::Low);
        assert_eq!(assess(AttackKind::Flood, 5, 0.7).threat_level, ThreatLevel::Medium);
        assert_eq!(assess(AttackKind::Flood, 7, 0.7).threat_level, ThreatLevel::Medium);
        assert_eq!(assess(AttackKind::Flood, 8, 0.7).threat_level, ThreatLevel::High);
    }

    #[test]
    fn table_rows() {
        assert_eq!(assess(AttackKind::Reflection, 5, 0.7).threat_level, ThreatLevel::High);
        assert_eq!(
            assess(AttackKind::CredentialGuess, 5, 0.7).threat_level,
            ThreatLevel::Medium
        );
        assert_eq!(assess(AttackKind::PortSweep, 5, 0.7).threat_level, ThreatLevel::Low);
        assert_eq!(assess(AttackKind::Other, 5, 0.7).threat_level, ThreatLevel::Medium);
    }

    #[test]
    fn sophistication_uses_flood_thresholds() {
        assert_eq!(
            assess(AttackKind::Injection, 2, 0.7).characteristics.sophistication,
            Sophistication::Low
        );
        assert_eq!(
            assess(AttackKind::Injection, 6, 0.7).characteristics.sophistication,
            Sophistication::Medium
        );
        assert_eq!(
            assess(AttackKind::Injection, 9, 0.7).characteristics.sophistication,
            Sophistication::High
        );
    }

    #[test]
    fn recommended_defenses_fixed_per_kind() {
        let a = assess(AttackKind::Flood, 5, 0.7);
        assert_eq!(a.recommended_defenses, ["rate_limiting", "firewall", "ai_detection"]);

        let a = assess(AttackKind::PortSweep, 5, 0.7);
        assert_eq!(a.recommended_defenses, ["firewall", "ids"]);
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let a = assess(AttackKind::CredentialGuess, 6, 0.7);
        let b = assess(AttackKind::CredentialGuess, 6, 0.7);
        assert_eq!(a, b);
    }

    #[test]
    fn confidence_passed_through() {
        let a = assess(AttackKind::Flood, 5, 0.42);
        assert!((a.confidence - 0.42).abs() < f64::EPSILON);
    }
}
