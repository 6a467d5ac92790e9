//! Deterministic confidence scoring.
//!
//! Confidence reflects extraction completeness and trigger state only; it
//! is a pure function of its inputs and never consults the model. The
//! score feeds the T-003 threshold comparison in the orchestrator.

use crate::pipeline::types::{FiredTrigger, SectionSet, TriggerId, TriggerSeverity};

/// Named band constants for the score formula.
pub mod band {
    /// Score with zero sections found and no clean bonus.
    pub const FLOOR: f32 = 0.45;
    /// Weight spread across the seven sections.
    pub const SECTION_SPAN: f32 = 0.36;
    /// Added when no Critical or High trigger fired.
    pub const CLEAN_BONUS: f32 = 0.15;
    /// Subtracted when unsupported summary content was found.
    pub const HALLUCINATION_PENALTY: f32 = 0.20;
    /// Hard ceiling; the pipeline never claims certainty.
    pub const CEILING: f32 = 0.96;
}

/// Score one run from its extracted sections and already-fired triggers.
///
/// Monotonic in `found_count` for a fixed trigger set.
pub fn score(sections: &SectionSet, triggers: &[FiredTrigger]) -> f32 {
    let found = sections.found_count() as f32;
    let total = crate::pipeline::types::SectionKind::ALL.len() as f32;

    let mut score = band::FLOOR + (found / total) * band::SECTION_SPAN;

    let clean = !triggers.iter().any(|t| {
        matches!(
            t.severity,
            TriggerSeverity::Critical | TriggerSeverity::High
        )
    });
    if clean {
        score += band::CLEAN_BONUS;
    }
    if triggers.iter().any(|t| t.id == TriggerId::HallucinationRisk) {
        score -= band::HALLUCINATION_PENALTY;
    }

    score.clamp(0.0, band::CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::escalation;
    use crate::pipeline::types::SectionKind;

    fn sections_with(n: usize) -> SectionSet {
        let mut set = SectionSet::default();
        for kind in SectionKind::ALL.into_iter().take(n) {
            set.set(kind, format!("{} content", kind.label()));
        }
        set
    }

    #[test]
    fn clean_full_extraction_hits_the_ceiling() {
        let s = score(&sections_with(7), &[]);
        assert!((s - band::CEILING).abs() < 1e-6);
    }

    #[test]
    fn empty_extraction_without_bonus_sits_at_the_floor() {
        let triggers = vec![escalation::high_uncertainty(0.2, 0.5)];
        assert_eq!(score(&sections_with(0), &triggers), band::FLOOR);
    }

    #[test]
    fn monotonic_in_sections_found() {
        let triggers = vec![escalation::critical_red_flags(&[])];
        let mut previous = -1.0f32;
        for n in 0..=7 {
            let s = score(&sections_with(n), &triggers);
            assert!(s >= previous, "score dropped at {n} sections");
            previous = s;
        }
    }

    #[test]
    fn critical_or_high_trigger_withholds_the_clean_bonus() {
        let clean = score(&sections_with(4), &[]);
        let flagged = score(&sections_with(4), &[escalation::critical_red_flags(&[])]);
        assert!((clean - flagged - band::CLEAN_BONUS).abs() < 1e-6);
    }

    #[test]
    fn medium_trigger_keeps_the_clean_bonus() {
        let clean = score(&sections_with(4), &[]);
        let fallback = score(&sections_with(4), &[escalation::api_failure("down")]);
        assert_eq!(clean, fallback);
    }

    #[test]
    fn hallucination_applies_a_penalty_on_top() {
        let base = score(&sections_with(5), &[escalation::high_uncertainty(0.2, 0.5)]);
        let with_claims = score(
            &sections_with(5),
            &[
                escalation::high_uncertainty(0.2, 0.5),
                escalation::hallucination_risk(&["pneumonia".into()]),
            ],
        );
        assert!((base - with_claims - band::HALLUCINATION_PENALTY).abs() < 1e-6);
    }

    #[test]
    fn score_is_deterministic() {
        let sections = sections_with(3);
        let triggers = vec![escalation::api_failure("timeout")];
        assert_eq!(score(&sections, &triggers), score(&sections, &triggers));
    }
}
