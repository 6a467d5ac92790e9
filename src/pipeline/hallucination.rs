//! Grounding check for model-produced summaries.
//!
//! A summary claim is unsupported when it introduces material absent from
//! the source: any numeric token (doses, vitals, durations) not present in
//! the note, or a diagnosis/drug lexicon term the note never mentions.
//! The check is lexical by design; it trades recall for zero tolerance of
//! invented measurements and named conditions.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::SectionSet;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\.\d+)?(?:/\d+(?:\.\d+)?)?").expect("Invalid numeric token pattern")
});

/// Conditions a summary must not name unless the note does.
static DIAGNOSIS_TERMS: &[&str] = &[
    "hypertension",
    "diabetes",
    "pneumonia",
    "asthma",
    "cancer",
    "sepsis",
    "stroke",
    "myocardial infarction",
    "heart failure",
    "appendicitis",
    "migraine",
    "anemia",
    "bronchitis",
    "meningitis",
    "embolism",
    "angina",
    "arrhythmia",
    "pancreatitis",
    "cirrhosis",
    "nephritis",
];

/// Medications a summary must not name unless the note does.
static DRUG_TERMS: &[&str] = &[
    "aspirin",
    "metformin",
    "insulin",
    "penicillin",
    "amoxicillin",
    "lisinopril",
    "atorvastatin",
    "ibuprofen",
    "acetaminophen",
    "warfarin",
    "heparin",
    "morphine",
    "prednisone",
    "albuterol",
    "nitroglycerin",
    "furosemide",
    "omeprazole",
    "gabapentin",
];

static LEXICON_RE: LazyLock<Regex> = LazyLock::new(|| {
    let terms: Vec<String> = DIAGNOSIS_TERMS
        .iter()
        .chain(DRUG_TERMS.iter())
        .map(|t| regex::escape(t).replace(' ', r"\s+"))
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", terms.join("|")))
        .expect("Invalid lexicon alternation")
});

/// Tokens in `summary` with no support in the note or its sections.
///
/// Returned claims are lowercase, deduplicated, in order of appearance.
pub fn find_unsupported_claims(
    summary: &str,
    note_text: &str,
    sections: &SectionSet,
) -> Vec<String> {
    let mut source = note_text.to_lowercase();
    for (_, value) in sections.iter() {
        if let Some(value) = value {
            source.push(' ');
            source.push_str(&value.to_lowercase());
        }
    }
    let summary_lower = summary.to_lowercase();

    let mut claims: Vec<String> = Vec::new();

    for m in NUMBER_RE.find_iter(&summary_lower) {
        let token = m.as_str();
        // Single digits are skipped: list numbering, not measurements.
        if token.len() == 1 {
            continue;
        }
        if !source.contains(token) && !claims.iter().any(|c| c == token) {
            claims.push(token.to_string());
        }
    }

    for m in LEXICON_RE.find_iter(&summary_lower) {
        let term = m.as_str();
        if !source.contains(term) && !claims.iter().any(|c| c == term) {
            claims.push(term.to_string());
        }
    }

    if !claims.is_empty() {
        tracing::warn!(count = claims.len(), "Unsupported summary claims found");
    }

    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_summary_has_no_claims() {
        let note = "blood pressure 138/88, heart rate 78, hypertension history, on aspirin";
        let summary = "Hypertension noted; BP 138/88, HR 78. Continues aspirin.";
        assert!(find_unsupported_claims(summary, note, &SectionSet::default()).is_empty());
    }

    #[test]
    fn novel_number_is_flagged() {
        let note = "heart rate 78, afebrile";
        let summary = "Heart rate 78, temperature 39.2";
        let claims = find_unsupported_claims(summary, note, &SectionSet::default());
        assert_eq!(claims, vec!["39.2"]);
    }

    #[test]
    fn novel_diagnosis_term_is_flagged() {
        let note = "productive cough for three days, no fever";
        let summary = "Findings consistent with pneumonia.";
        let claims = find_unsupported_claims(summary, note, &SectionSet::default());
        assert_eq!(claims, vec!["pneumonia"]);
    }

    #[test]
    fn novel_drug_term_is_flagged() {
        let note = "headache, no current medications";
        let summary = "Patient takes ibuprofen for headache.";
        let claims = find_unsupported_claims(summary, note, &SectionSet::default());
        assert_eq!(claims, vec!["ibuprofen"]);
    }

    #[test]
    fn section_values_count_as_support() {
        let mut sections = SectionSet::default();
        sections.set(
            crate::pipeline::types::SectionKind::Vitals,
            "BP 120/80 mmHg".into(),
        );
        let claims = find_unsupported_claims("BP 120/80 recorded", "vitals documented", &sections);
        assert!(claims.is_empty());
    }

    #[test]
    fn single_digit_list_numbering_is_ignored() {
        let note = "cough and congestion";
        let summary = "1. Cough. 2. Congestion.";
        assert!(find_unsupported_claims(summary, note, &SectionSet::default()).is_empty());
    }

    #[test]
    fn claims_are_deduplicated() {
        let note = "stable overnight";
        let summary = "dose 40mg given, then 40mg repeated";
        let claims = find_unsupported_claims(summary, note, &SectionSet::default());
        assert_eq!(claims, vec!["40"]);
    }

    #[test]
    fn lexicon_match_is_case_insensitive() {
        let note = "chest discomfort";
        let claims =
            find_unsupported_claims("Possible ANGINA", note, &SectionSet::default());
        assert_eq!(claims, vec!["angina"]);
    }
}
