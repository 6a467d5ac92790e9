//! PII de-identification.
//!
//! Replaces emails, phone numbers, SSN-shaped numbers, record identifiers,
//! and patient-keyword-adjacent name sequences with category-tagged
//! redaction markers. Idempotent: markers contain no character sequence
//! any pattern here can match, so re-running on redacted text is a no-op.
//!
//! Clinical vocabulary that happens to be capitalized (drug names,
//! section headers, anatomy) is protected by an allow-list consulted
//! before any name redaction.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

pub const EMAIL_MARKER: &str = "[REDACTED-EMAIL]";
pub const PHONE_MARKER: &str = "[REDACTED-PHONE]";
pub const SSN_MARKER: &str = "[REDACTED-SSN]";
pub const ID_MARKER: &str = "[REDACTED-ID]";
pub const NAME_MARKER: &str = "[REDACTED-NAME]";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("Invalid email pattern")
});

static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("Invalid SSN pattern"));

/// Separators are required between groups so vitals ("138/88") and plain
/// durations ("30 minutes") can never look like a phone number. The word
/// boundary lives inside the bare-digit alternative only; a boundary
/// before `(` can never hold.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,2}[-.\s]?)?(?:\(\d{3}\)[-.\s]?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b")
        .expect("Invalid phone pattern")
});

/// Record identifiers: the label and the value are both redacted.
static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:MRN|Medical\s+Record\s+Number|(?:Patient|Pt)\s*ID|PID)\s*[:#-]?\s*[A-Za-z0-9][A-Za-z0-9-]*\b")
        .expect("Invalid record-id pattern")
});

/// Capitalized word sequence (1–3 words) directly after a
/// patient-referring keyword. Only the name candidate is replaced; the
/// keyword and separator are kept. The patient keywords accept a
/// lowercase initial so shorthand ("pt Smith") and expansion output
/// ("patient ...") are both covered; honorifics stay capitalized.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?P<kw>[Pp]atient\s+[Nn]ame|[Pp]t\s+[Nn]ame|[Pp]atient|[Pp]t|Mrs|Mr|Ms|Dr)(?P<dot>\.)?(?P<sep>\s*[:\-]\s*|\s+)(?P<name>[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})",
    )
    .expect("Invalid name pattern")
});

/// Clinical vocabulary never redacted as a name, even when capitalized.
static CLINICAL_ALLOWLIST: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // Section-header and charting words
        "profile", "name", "notes", "note", "history", "allergies", "allergy",
        "medications", "medication", "vitals", "vital", "demographics",
        "observations", "findings", "presents", "presented", "complains",
        "complained", "reports", "reported", "states", "stated", "denies",
        "denied", "admits", "admitted", "male", "female", "unknown",
        // Common drugs
        "penicillin", "aspirin", "metformin", "insulin", "ibuprofen",
        "tylenol", "acetaminophen", "amoxicillin", "lisinopril",
        "atorvastatin", "warfarin", "prednisone", "albuterol", "morphine",
        "heparin",
        // Anatomy and common clinical terms
        "chest", "abdomen", "head", "heart", "lung", "lungs", "arm", "leg",
        "left", "right", "back", "neck", "throat", "skin", "pain", "fever",
        "cough", "nausea",
    ]
    .into_iter()
    .collect()
});

/// Redact PII, returning the de-identified text.
pub fn deidentify(text: &str) -> String {
    // Record IDs first: "Patient ID: 12345" must be consumed whole before
    // the name pass sees the "Patient" keyword.
    let out = ID_RE.replace_all(text, ID_MARKER);
    let out = EMAIL_RE.replace_all(&out, EMAIL_MARKER);
    let out = SSN_RE.replace_all(&out, SSN_MARKER);
    let out = PHONE_RE.replace_all(&out, PHONE_MARKER);
    let out = NAME_RE.replace_all(&out, |caps: &regex::Captures| {
        let kw = &caps["kw"];
        let dot = caps.name("dot").map(|m| m.as_str()).unwrap_or("");
        let sep = &caps["sep"];
        let candidate = &caps["name"];
        match redact_name_candidate(candidate) {
            Some(redacted) => format!("{kw}{dot}{sep}{redacted}"),
            None => caps[0].to_string(),
        }
    });

    if out != text {
        tracing::debug!(
            original_len = text.len(),
            redacted_len = out.len(),
            "De-identification applied"
        );
    }

    out.into_owned()
}

/// Apply the allow-list to a name candidate.
///
/// The leading run of non-allowlisted words is redacted; an allowlisted
/// tail (e.g. a section header swallowed by the capture) is kept.
/// Returns `None` when the candidate is entirely clinical vocabulary.
fn redact_name_candidate(candidate: &str) -> Option<String> {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    let redact_len = words
        .iter()
        .take_while(|w| !CLINICAL_ALLOWLIST.contains(w.to_lowercase().as_str()))
        .count();
    if redact_len == 0 {
        return None;
    }
    let mut out = NAME_MARKER.to_string();
    for word in &words[redact_len..] {
        out.push(' ');
        out.push_str(word);
    }
    Some(out)
}
