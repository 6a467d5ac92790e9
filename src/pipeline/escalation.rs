//! Escalation triggers.
//!
//! Five fixed triggers, evaluated by the orchestrator at set points in the
//! run. This module owns the diagnostic-question detector and a
//! constructor per trigger, each logging a structured warning when it
//! fires. Messages are the user-facing banner text; they never quote note
//! content beyond category labels and flagged tokens.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::redflags;
use crate::pipeline::types::{
    FiredTrigger, RedFlagMatch, TriggerAction, TriggerId, TriggerSeverity,
};

/// First-person requests for diagnosis, treatment, or prognosis. The
/// pipeline documents, it never advises; any of these blocks the request.
static DIAGNOSTIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bwhat\s+(?:is|are)\s+(?:the\s+|my\s+)?diagnos(?:is|es)\b",
        r"(?i)\bmy\s+diagnos(?:is|es)\b",
        r"(?i)\bdiagnose\s+me\b",
        r"(?i)\bwhat\s+(?:disease|condition|illness|disorder|syndrome)s?\s+do\s+i\s+have\b",
        r"(?i)\bmy\s+(?:disease|condition|illness|disorder|syndrome)s?\b",
        r"(?i)\bwhat\s+is\s+(?:the\s+|my\s+)?(?:disease|condition|illness|disorder|syndrome)\b",
        r"(?i)\bwhat\s+do\s+i\s+have\b",
        r"(?i)\bdo\s+i\s+have\b",
        r"(?i)\bwhat\s+is\s+wrong\s+with\s+me\b",
        r"(?i)\bam\s+i\s+sick\b",
        r"(?i)\bis\s+(?:this|it)\s+(?:serious|dangerous|cancer|covid|fatal)\b",
        r"(?i)\bwill\s+i\s+be\s+(?:okay|ok|fine|alright)\b",
        r"(?i)\bshould\s+i\s+(?:take|stop|start)\b",
        r"(?i)\bwhat\s+(?:medication|medicine|drug|treatment|cure)\s+(?:should|do)\s+i\b",
        r"(?i)\bhow\s+to\s+(?:treat|cure|fix)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid diagnostic-question pattern"))
    .collect()
});

/// Whether the raw input asks for diagnosis or treatment advice.
pub fn is_diagnostic_question(text: &str) -> bool {
    DIAGNOSTIC_PATTERNS.iter().any(|re| re.is_match(text))
}

/// T-001: the input asks for medical advice. Blocks the run.
pub fn diagnostic_block() -> FiredTrigger {
    let trigger = FiredTrigger {
        id: TriggerId::DiagnosticQuestion,
        severity: TriggerSeverity::Critical,
        action: TriggerAction::Block,
        message: "This tool documents clinical notes; it cannot answer diagnostic \
                  or treatment questions. Please consult a qualified healthcare \
                  professional."
            .to_string(),
    };
    log_fired(&trigger);
    trigger
}

/// T-002: red-flag symptoms were detected. Continues with a critical alert.
pub fn critical_red_flags(flags: &[RedFlagMatch]) -> FiredTrigger {
    let labels: Vec<&str> = redflags::categories(flags)
        .iter()
        .map(|c| c.label())
        .collect();
    let trigger = FiredTrigger {
        id: TriggerId::CriticalRedFlags,
        severity: TriggerSeverity::Critical,
        action: TriggerAction::ContinueWithAlert,
        message: format!(
            "Red-flag symptoms detected ({}). Seek immediate medical attention.",
            labels.join(", ")
        ),
    };
    log_fired(&trigger);
    trigger
}

/// T-003: confidence fell below the reliability threshold.
pub fn high_uncertainty(confidence: f32, threshold: f32) -> FiredTrigger {
    let trigger = FiredTrigger {
        id: TriggerId::HighUncertainty,
        severity: TriggerSeverity::High,
        action: TriggerAction::ContinueWithWarning,
        message: format!(
            "Low extraction confidence ({confidence:.2} < {threshold:.2}). \
             Verify this summary against the original note before relying on it."
        ),
    };
    log_fired(&trigger);
    trigger
}

/// T-004: the summary contains content absent from the source note.
pub fn hallucination_risk(claims: &[String]) -> FiredTrigger {
    let trigger = FiredTrigger {
        id: TriggerId::HallucinationRisk,
        severity: TriggerSeverity::High,
        action: TriggerAction::ContinueWithWarning,
        message: format!(
            "The summary contains content not found in the source note: {}. \
             Treat unverified details with caution.",
            claims.join(", ")
        ),
    };
    log_fired(&trigger);
    trigger
}

/// T-005: the model was unreachable or returned nothing usable.
pub fn api_failure(reason: &str) -> FiredTrigger {
    let trigger = FiredTrigger {
        id: TriggerId::ApiFailure,
        severity: TriggerSeverity::Medium,
        action: TriggerAction::Fallback,
        message: format!(
            "Summarization service unavailable ({reason}); a template summary \
             was assembled from the extracted sections instead."
        ),
    };
    log_fired(&trigger);
    trigger
}

/// Order fired triggers by fixed priority for reporting.
pub fn sort_by_priority(triggers: &mut [FiredTrigger]) {
    triggers.sort_by_key(|t| t.id.priority());
}

fn log_fired(trigger: &FiredTrigger) {
    tracing::warn!(
        trigger = trigger.id.code(),
        severity = ?trigger.severity,
        action = ?trigger.action,
        "Escalation trigger fired"
    );
}
