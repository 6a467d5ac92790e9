use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Sections ────────────────────────────────────────────────

/// The seven clinical fields a note is structured into.
///
/// The set is closed: presentation order is always the declaration order
/// here, regardless of the order fields were found in the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Demographics,
    ChiefComplaint,
    History,
    Medications,
    Allergies,
    Vitals,
    Observations,
}

impl SectionKind {
    /// All sections, in fixed presentation order.
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Demographics,
        SectionKind::ChiefComplaint,
        SectionKind::History,
        SectionKind::Medications,
        SectionKind::Allergies,
        SectionKind::Vitals,
        SectionKind::Observations,
    ];

    /// Human-readable label for summaries and banners.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Demographics => "Demographics",
            Self::ChiefComplaint => "Chief Complaint",
            Self::History => "History",
            Self::Medications => "Medications",
            Self::Allergies => "Allergies",
            Self::Vitals => "Vitals",
            Self::Observations => "Observations",
        }
    }
}

/// Extracted section values, one slot per [`SectionKind`].
///
/// Absence of a section is a normal partial-result condition, not an
/// error; `found_count` ranges 0–7.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSet {
    demographics: Option<String>,
    chief_complaint: Option<String>,
    history: Option<String>,
    medications: Option<String>,
    allergies: Option<String>,
    vitals: Option<String>,
    observations: Option<String>,
}

impl SectionSet {
    pub fn get(&self, kind: SectionKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    /// Set a section value. Empty values are treated as absent.
    pub fn set(&mut self, kind: SectionKind, value: String) {
        let slot = self.slot_mut(kind);
        if value.trim().is_empty() {
            *slot = None;
        } else {
            *slot = Some(value);
        }
    }

    /// Number of non-empty sections.
    pub fn found_count(&self) -> usize {
        SectionKind::ALL
            .iter()
            .filter(|k| self.get(**k).is_some())
            .count()
    }

    /// Iterate (kind, value) pairs in fixed presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionKind, Option<&str>)> {
        SectionKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    fn slot(&self, kind: SectionKind) -> &Option<String> {
        match kind {
            SectionKind::Demographics => &self.demographics,
            SectionKind::ChiefComplaint => &self.chief_complaint,
            SectionKind::History => &self.history,
            SectionKind::Medications => &self.medications,
            SectionKind::Allergies => &self.allergies,
            SectionKind::Vitals => &self.vitals,
            SectionKind::Observations => &self.observations,
        }
    }

    fn slot_mut(&mut self, kind: SectionKind) -> &mut Option<String> {
        match kind {
            SectionKind::Demographics => &mut self.demographics,
            SectionKind::ChiefComplaint => &mut self.chief_complaint,
            SectionKind::History => &mut self.history,
            SectionKind::Medications => &mut self.medications,
            SectionKind::Allergies => &mut self.allergies,
            SectionKind::Vitals => &mut self.vitals,
            SectionKind::Observations => &mut self.observations,
        }
    }
}

// ── Normalized note ─────────────────────────────────────────

/// The de-identified, abbreviation-expanded note text.
///
/// One-way transform: the struct owns only the derived text and keeps no
/// reference back to the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedNote {
    text: String,
}

impl NormalizedNote {
    pub(crate) fn new(text: String) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// ── Red flags ───────────────────────────────────────────────

/// Emergency symptom categories. Severity is category-level; individual
/// matches carry no ranking of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagCategory {
    Cardiovascular,
    Respiratory,
    Neurological,
    Trauma,
    Allergic,
}

impl RedFlagCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cardiovascular => "cardiovascular",
            Self::Respiratory => "respiratory",
            Self::Neurological => "neurological",
            Self::Trauma => "trauma",
            Self::Allergic => "allergic",
        }
    }
}

/// A single red-flag phrase hit in a scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlagMatch {
    pub category: RedFlagCategory,
    /// The phrase table entry that matched.
    pub phrase: String,
    /// Byte offset of the match in the scanned text.
    pub offset: usize,
    /// Length of the matched span in bytes.
    pub length: usize,
}

// ── Escalation triggers ─────────────────────────────────────

/// The five fixed escalation triggers, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerId {
    #[serde(rename = "T-001")]
    DiagnosticQuestion,
    #[serde(rename = "T-002")]
    CriticalRedFlags,
    #[serde(rename = "T-003")]
    HighUncertainty,
    #[serde(rename = "T-004")]
    HallucinationRisk,
    #[serde(rename = "T-005")]
    ApiFailure,
}

impl TriggerId {
    /// Wire/audit identifier.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DiagnosticQuestion => "T-001",
            Self::CriticalRedFlags => "T-002",
            Self::HighUncertainty => "T-003",
            Self::HallucinationRisk => "T-004",
            Self::ApiFailure => "T-005",
        }
    }

    /// Fixed evaluation/reporting priority. Lower is higher priority.
    pub fn priority(&self) -> u8 {
        match self {
            Self::DiagnosticQuestion => 1,
            Self::CriticalRedFlags => 2,
            Self::HighUncertainty => 3,
            Self::HallucinationRisk => 4,
            Self::ApiFailure => 5,
        }
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSeverity {
    Critical,
    High,
    Medium,
}

/// What a fired trigger forces the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerAction {
    /// Halt before model invocation; return a refusal result.
    Block,
    /// Continue; attach a critical alert banner.
    ContinueWithAlert,
    /// Continue; attach a warning.
    ContinueWithWarning,
    /// Continue with a template summary built from sections only.
    Fallback,
}

/// A trigger that fired for this request, with its user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredTrigger {
    pub id: TriggerId,
    pub severity: TriggerSeverity,
    pub action: TriggerAction,
    /// User-facing banner/warning text.
    pub message: String,
}

// ── Summary result ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Safe,
    Unsafe,
}

/// The terminal, externally visible artifact of one pipeline run.
///
/// Never mutated after construction; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub sections: SectionSet,
    /// Summary text; `None` only when the request was blocked.
    pub summary: Option<String>,
    /// True when the summary was template-assembled from sections
    /// (model unavailable — T-005).
    pub fallback_used: bool,
    /// All fired triggers, in fixed priority order.
    pub triggers: Vec<FiredTrigger>,
    pub red_flags: Vec<RedFlagMatch>,
    pub confidence: f32,
    pub sections_found: usize,
    pub verdict: Verdict,
    pub timestamp: DateTime<Utc>,
}

impl SummaryResult {
    /// Whether the request was refused before model invocation.
    pub fn is_blocked(&self) -> bool {
        self.triggers
            .iter()
            .any(|t| t.action == TriggerAction::Block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_order_is_fixed() {
        let mut set = SectionSet::default();
        // Insert out of order; iteration must follow declaration order.
        set.set(SectionKind::Vitals, "BP 120/80 mmHg".into());
        set.set(SectionKind::Demographics, "52-year-old male".into());
        let kinds: Vec<SectionKind> = set
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k)
            .collect();
        assert_eq!(kinds, vec![SectionKind::Demographics, SectionKind::Vitals]);
    }

    #[test]
    fn empty_value_counts_as_absent() {
        let mut set = SectionSet::default();
        set.set(SectionKind::Medications, "   ".into());
        assert_eq!(set.found_count(), 0);
        assert!(set.get(SectionKind::Medications).is_none());
    }

    #[test]
    fn found_count_ranges_over_all_sections() {
        let mut set = SectionSet::default();
        for kind in SectionKind::ALL {
            set.set(kind, format!("{} value", kind.label()));
        }
        assert_eq!(set.found_count(), 7);
    }

    #[test]
    fn trigger_ids_serialize_as_codes() {
        let json = serde_json::to_string(&TriggerId::DiagnosticQuestion).unwrap();
        assert_eq!(json, "\"T-001\"");
        let json = serde_json::to_string(&TriggerId::ApiFailure).unwrap();
        assert_eq!(json, "\"T-005\"");
    }

    #[test]
    fn trigger_priority_matches_code_order() {
        let mut ids = vec![
            TriggerId::ApiFailure,
            TriggerId::DiagnosticQuestion,
            TriggerId::HallucinationRisk,
            TriggerId::CriticalRedFlags,
            TriggerId::HighUncertainty,
        ];
        ids.sort_by_key(|id| id.priority());
        let codes: Vec<&str> = ids.iter().map(|id| id.code()).collect();
        assert_eq!(codes, vec!["T-001", "T-002", "T-003", "T-004", "T-005"]);
    }

    #[test]
    fn blocked_detection_via_action() {
        let result = SummaryResult {
            sections: SectionSet::default(),
            summary: None,
            fallback_used: false,
            triggers: vec![FiredTrigger {
                id: TriggerId::DiagnosticQuestion,
                severity: TriggerSeverity::Critical,
                action: TriggerAction::Block,
                message: "refused".into(),
            }],
            red_flags: vec![],
            confidence: 0.0,
            sections_found: 0,
            verdict: Verdict::Unsafe,
            timestamp: Utc::now(),
        };
        assert!(result.is_blocked());
        // Results compare by value; a clone is indistinguishable.
        assert_eq!(result, result.clone());
    }
}
