//! Pipeline orchestration.
//!
//! Fixed stage order per request: validate, diagnostic-question gate,
//! normalize, pre-scan, extract, model call, post-scan, grounding check,
//! confidence, verdict. The model is consulted exactly once; any failure
//! or empty reply switches to a template summary assembled from the
//! extracted sections. Every path out of `summarize` (other than input
//! validation) yields a complete [`SummaryResult`].

use chrono::Utc;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::model::{ModelClient, ModelRequest};
use crate::pipeline::types::{
    SectionSet, SummaryResult, TriggerId, TriggerSeverity, Verdict,
};
use crate::pipeline::{confidence, escalation, extract, hallucination, normalize, redflags};

/// Appended to every produced summary, generative or fallback.
pub const DISCLAIMER: &str =
    "This summary is an automated documentation aid, not medical advice.";

/// Input rejected before the pipeline runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Note is empty")]
    Empty,

    #[error("Note is too short: minimum {min} characters")]
    TooShort { min: usize },

    #[error("Note is too long: maximum {max} characters")]
    TooLong { max: usize },
}

pub struct Summarizer<M: ModelClient> {
    model: M,
    config: PipelineConfig,
}

impl<M: ModelClient> Summarizer<M> {
    pub fn new(model: M) -> Self {
        Self::with_config(model, PipelineConfig::default())
    }

    pub fn with_config(model: M, config: PipelineConfig) -> Self {
        Self { model, config }
    }

    /// Run the full pipeline on one raw note.
    ///
    /// `Err` only for invalid input; every safety outcome, including a
    /// blocked request, is an `Ok` result carrying its triggers.
    pub fn summarize(&self, raw: &str) -> Result<SummaryResult, ValidationError> {
        self.validate(raw)?;

        if escalation::is_diagnostic_question(raw) {
            return Ok(Self::blocked_result());
        }

        let note = normalize::normalize(raw);
        let pre_flags = redflags::scan(note.text(), self.config.negation_window);
        let sections = extract::extract(&note);

        let request = ModelRequest::new(note.text().to_string(), sections.clone());
        let (summary_body, fallback_used, api_trigger) = match self.model.generate(&request) {
            Ok(text) if !text.trim().is_empty() => (text, false, None),
            Ok(_) => (
                fallback_summary(&sections),
                true,
                Some(escalation::api_failure("empty response")),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Model call failed, using template fallback");
                (
                    fallback_summary(&sections),
                    true,
                    Some(escalation::api_failure(&e.to_string())),
                )
            }
        };

        // The produced text is scanned with the same rules as the input;
        // a red flag only the model surfaced still raises the alert.
        let post_flags = redflags::scan(&summary_body, self.config.negation_window);
        let red_flags = redflags::merge(pre_flags, post_flags);

        let mut triggers = Vec::new();
        if !red_flags.is_empty() {
            triggers.push(escalation::critical_red_flags(&red_flags));
        }
        if !fallback_used {
            let claims =
                hallucination::find_unsupported_claims(&summary_body, note.text(), &sections);
            if !claims.is_empty() {
                triggers.push(escalation::hallucination_risk(&claims));
            }
        }
        if let Some(t) = api_trigger {
            triggers.push(t);
        }

        let score = confidence::score(&sections, &triggers);
        if score < self.config.low_confidence_threshold {
            triggers.push(escalation::high_uncertainty(
                score,
                self.config.low_confidence_threshold,
            ));
        }
        escalation::sort_by_priority(&mut triggers);

        let verdict = if triggers.iter().any(|t| {
            t.severity == TriggerSeverity::Critical || t.id == TriggerId::HallucinationRisk
        }) {
            Verdict::Unsafe
        } else {
            Verdict::Safe
        };

        let sections_found = sections.found_count();
        tracing::info!(
            sections_found,
            confidence = score,
            fallback_used,
            triggers = triggers.len(),
            verdict = ?verdict,
            "Pipeline run complete"
        );

        Ok(SummaryResult {
            sections,
            summary: Some(format!("{summary_body}\n\n{DISCLAIMER}")),
            fallback_used,
            triggers,
            red_flags,
            confidence: score,
            sections_found,
            verdict,
            timestamp: Utc::now(),
        })
    }

    fn validate(&self, raw: &str) -> Result<(), ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        let chars = raw.chars().count();
        if chars < self.config.min_note_chars {
            return Err(ValidationError::TooShort {
                min: self.config.min_note_chars,
            });
        }
        if chars > self.config.max_note_chars {
            return Err(ValidationError::TooLong {
                max: self.config.max_note_chars,
            });
        }
        Ok(())
    }

    fn blocked_result() -> SummaryResult {
        SummaryResult {
            sections: SectionSet::default(),
            summary: None,
            fallback_used: false,
            triggers: vec![escalation::diagnostic_block()],
            red_flags: Vec::new(),
            confidence: 0.0,
            sections_found: 0,
            verdict: Verdict::Unsafe,
            timestamp: Utc::now(),
        }
    }
}

/// Deterministic template summary, fixed section order, absent fields
/// marked explicitly.
fn fallback_summary(sections: &SectionSet) -> String {
    sections
        .iter()
        .map(|(kind, value)| format!("{}: {}", kind.label(), value.unwrap_or("not documented")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelClient, ModelError, ModelRequest};
    use crate::pipeline::types::{SectionKind, TriggerAction};
    use std::cell::Cell;

    /// Returns a fixed canned summary.
    struct CannedModel(&'static str);

    impl ModelClient for CannedModel {
        fn generate(&self, _request: &ModelRequest) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    /// Echoes the normalized note back as the summary.
    struct EchoModel;

    impl ModelClient for EchoModel {
        fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
            Ok(request.note.clone())
        }
    }

    /// Always unreachable.
    struct DownModel;

    impl ModelClient for DownModel {
        fn generate(&self, _request: &ModelRequest) -> Result<String, ModelError> {
            Err(ModelError::Connection("connection refused".into()))
        }
    }

    /// Counts invocations, then fails.
    struct CountingModel {
        calls: Cell<usize>,
    }

    impl ModelClient for CountingModel {
        fn generate(&self, _request: &ModelRequest) -> Result<String, ModelError> {
            self.calls.set(self.calls.get() + 1);
            Err(ModelError::EmptyResponse)
        }
    }

    const ACUTE_NOTE: &str = "Pt Profile: 52yo male. HPI: severe chest pain for 30 minutes, \
                              radiating to left arm. PMH: HTN. Allergies: Penicillin. \
                              Vitals: BP 138/88, HR 78, SpO2 98%.";

    const BENIGN_NOTE: &str = "Pt Profile: 45 yo female. HPI: mild seasonal congestion. \
                               PMH: none significant. Medications: none. Allergies: NKDA. \
                               Vitals: BP 118/76, HR 70, SpO2 99%. Notes: well appearing.";

    #[test]
    fn empty_input_is_rejected() {
        let s = Summarizer::new(CannedModel("unused"));
        assert_eq!(s.summarize("   "), Err(ValidationError::Empty));
    }

    #[test]
    fn too_short_input_is_rejected() {
        let s = Summarizer::new(CannedModel("unused"));
        assert_eq!(s.summarize("brief"), Err(ValidationError::TooShort { min: 10 }));
    }

    #[test]
    fn too_long_input_is_rejected() {
        let s = Summarizer::new(CannedModel("unused"));
        let long = "x".repeat(5001);
        assert_eq!(s.summarize(&long), Err(ValidationError::TooLong { max: 5000 }));
    }

    #[test]
    fn diagnostic_question_blocks_before_model_invocation() {
        let model = CountingModel { calls: Cell::new(0) };
        let s = Summarizer::new(model);
        let result = s
            .summarize("Do I have cancer? I found a lump and I am worried.")
            .unwrap();
        assert!(result.is_blocked());
        assert!(result.summary.is_none());
        assert_eq!(result.verdict, Verdict::Unsafe);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.triggers.len(), 1);
        assert_eq!(result.triggers[0].id.code(), "T-001");
        assert_eq!(s.model.calls.get(), 0);
    }

    #[test]
    fn acute_note_raises_red_flag_alert() {
        let s = Summarizer::new(EchoModel);
        let result = s.summarize(ACUTE_NOTE).unwrap();

        assert!(!result.is_blocked());
        assert!(!result.fallback_used);
        assert_eq!(result.verdict, Verdict::Unsafe);
        assert!(result.sections_found >= 5);
        assert!(result.confidence >= 0.5);

        let codes: Vec<&str> = result.triggers.iter().map(|t| t.id.code()).collect();
        assert_eq!(codes, vec!["T-002"]);
        assert_eq!(result.triggers[0].action, TriggerAction::ContinueWithAlert);
        assert!(result.triggers[0].message.contains("cardiovascular"));

        assert_eq!(
            result.sections.get(SectionKind::Demographics),
            Some("52-year-old male")
        );
        assert!(result.summary.unwrap().ends_with(DISCLAIMER));
    }

    #[test]
    fn model_failure_falls_back_to_template() {
        let s = Summarizer::new(DownModel);
        let result = s.summarize(BENIGN_NOTE).unwrap();

        assert!(result.fallback_used);
        assert_eq!(result.verdict, Verdict::Safe);
        assert_eq!(result.sections_found, 7);
        assert!(result.confidence > 0.9);

        let codes: Vec<&str> = result.triggers.iter().map(|t| t.id.code()).collect();
        assert_eq!(codes, vec!["T-005"]);

        let summary = result.summary.unwrap();
        assert!(summary.contains("Demographics: 45-year-old female"));
        assert!(summary.contains("Allergies: No known allergies"));
        assert!(summary.ends_with(DISCLAIMER));
    }

    #[test]
    fn fallback_summary_marks_missing_sections() {
        let s = Summarizer::new(DownModel);
        let result = s.summarize("HPI: mild intermittent ear discomfort.").unwrap();
        let summary = result.summary.unwrap();
        assert!(summary.contains("Medications: not documented"));
        assert!(summary.contains("Vitals: not documented"));
    }

    #[test]
    fn fallback_skips_the_grounding_check() {
        // A template summary is assembled locally; it is never treated as
        // hallucinated even when sparse.
        let s = Summarizer::new(DownModel);
        let result = s.summarize(BENIGN_NOTE).unwrap();
        assert!(result
            .triggers
            .iter()
            .all(|t| t.id != TriggerId::HallucinationRisk));
    }

    #[test]
    fn ungrounded_summary_raises_hallucination_warning() {
        let s = Summarizer::new(CannedModel(
            "Findings consistent with pneumonia; started amoxicillin 500mg.",
        ));
        let result = s.summarize(BENIGN_NOTE).unwrap();

        assert!(result
            .triggers
            .iter()
            .any(|t| t.id == TriggerId::HallucinationRisk));
        assert_eq!(result.verdict, Verdict::Unsafe);
    }

    #[test]
    fn triggers_are_reported_in_priority_order() {
        let s = Summarizer::new(DownModel);
        let result = s
            .summarize("HPI: severe chest pain at rest. Vitals: BP 130/80.")
            .unwrap();
        let codes: Vec<&str> = result.triggers.iter().map(|t| t.id.code()).collect();
        assert_eq!(codes, vec!["T-002", "T-005"]);
        assert_eq!(result.verdict, Verdict::Unsafe);
        assert!(result.fallback_used);
    }

    #[test]
    fn pii_never_reaches_the_result() {
        let s = Summarizer::new(EchoModel);
        let result = s
            .summarize("Patient Name: John Smith, 555-123-4567. Pt c/o CP and SOB.")
            .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("John"));
        assert!(!json.contains("Smith"));
        assert!(!json.contains("555-123-4567"));
        assert!(json.contains("[REDACTED-NAME]"));
    }

    #[test]
    fn sparse_note_triggers_low_confidence_warning() {
        // One section found plus a critical flag keeps the score under
        // the reliability threshold.
        let s = Summarizer::new(EchoModel);
        let result = s.summarize("noted severe chest pain this morning").unwrap();
        assert!(result.confidence < 0.5);
        assert!(result
            .triggers
            .iter()
            .any(|t| t.id == TriggerId::HighUncertainty));
    }
}
