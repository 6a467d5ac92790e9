//! Section extraction over the normalized note.
//!
//! Label markers are located across the whole text, sorted by position,
//! and each section's content runs from its marker to the next marker.
//! Per-field fallback heuristics (age+gender for demographics, NKDA for
//! allergies, labeled vitals sub-patterns) run only when no label filled
//! the field. Fields are independent: one field failing to extract never
//! affects another, and absence is a normal outcome.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::{NormalizedNote, SectionKind, SectionSet};

/// Section content is capped so one runaway span cannot swallow the note.
const MAX_SECTION_CHARS: usize = 150;

struct LabelPattern {
    regex: Regex,
    kind: SectionKind,
}

fn label(pattern: &str, kind: SectionKind) -> LabelPattern {
    LabelPattern {
        regex: Regex::new(pattern).expect("Invalid section label pattern"),
        kind,
    }
}

/// Ordered label tables. Abbreviated forms are listed too in case a note
/// reaches extraction without normalization (extraction is independently
/// callable).
static LABELS: LazyLock<Vec<LabelPattern>> = LazyLock::new(|| {
    use SectionKind::*;
    vec![
        label(r"(?i)\b(?:pt|patient)\s+profile\b", Demographics),
        label(r"(?i)\bdemographics\b", Demographics),
        label(r"(?i)\bhistory\s+of\s+present\s+illness\b", ChiefComplaint),
        label(r"(?i)\bchief\s+complaint\b", ChiefComplaint),
        label(r"(?i)\bpresenting\s+complaint\b", ChiefComplaint),
        label(r"(?i)\bhpi\b", ChiefComplaint),
        label(r"(?i)\bcc\b", ChiefComplaint),
        label(r"(?i)\bpast\s+medical\s+history\b", History),
        label(r"(?i)\bpast\s+surgical\s+history\b", History),
        label(r"(?i)\bfamily\s+history\b", History),
        label(r"(?i)\bpmh\b", History),
        label(r"(?i)\bpsh\b", History),
        label(r"(?i)\bfhx\b", History),
        // Plain "history" ("Hx:" after expansion); overlap resolution
        // keeps the longer "history of present illness" marker when both
        // start at the same word.
        label(r"(?i)\bhistory\b", History),
        label(r"(?i)\bmedications?\b", Medications),
        label(r"(?i)\bmeds\b", Medications),
        label(r"(?i)\bprescriptions?\b", Medications),
        label(r"(?i)\bno\s+known\s+(?:drug\s+)?allergies\b", Allergies),
        label(r"(?i)\ballerg(?:y|ies)\b", Allergies),
        label(r"(?i)\bnkda\b", Allergies),
        label(r"(?i)\bvital\s+signs\b", Vitals),
        label(r"(?i)\bvitals\b", Vitals),
        label(r"(?i)\bvs\b", Vitals),
        label(r"(?i)\bphysical\s+exam(?:ination)?\b", Observations),
        label(r"(?i)\bobservations?\b", Observations),
        label(r"(?i)\bfindings\b", Observations),
        label(r"(?i)\bnotes\b", Observations),
        label(r"(?i)\bpe\b", Observations),
    ]
});

static LEADING_SEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s:;,.\-]+").expect("Invalid leading separator pattern"));
static TRAILING_SEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s:;,.\-]+$").expect("Invalid trailing separator pattern"));

static AGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:years?[\s-]+old|y\.?o\.?|yo)\b").expect("Invalid age pattern")
});
static GENDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:female|male|woman|man)\b").expect("Invalid gender pattern")
});

static NKDA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bno\s+known\s+(?:drug\s+)?allergies\b|\bnkda\b").expect("Invalid NKDA pattern")
});

static BP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:blood\s+pressure|bp)\D{0,6}?(\d{2,3})\s*/\s*(\d{2,3})\b")
        .expect("Invalid BP pattern")
});
static BARE_BP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{2,3})\s*/\s*(\d{2,3})\b").expect("Invalid bare BP pattern")
});
static HR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:heart\s+rate|hr|pulse)\D{0,6}?(\d{2,3})\b").expect("Invalid HR pattern")
});
static SPO2_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:spo2|o2\s*sat(?:uration)?|oxygen\s+saturation)\D{0,6}?(\d{2,3})\s*%?")
        .expect("Invalid SpO2 pattern")
});

/// Extract the seven clinical sections from a normalized note.
///
/// Deterministic: identical input always yields identical output.
pub fn extract(note: &NormalizedNote) -> SectionSet {
    let text = note.text();
    let mut sections = SectionSet::default();

    // Locate every label marker, earliest first; where markers overlap
    // (e.g. "allergies" inside "no known drug allergies"), keep the
    // longer, earlier one.
    let mut markers: Vec<(usize, usize, SectionKind)> = Vec::new();
    for lp in LABELS.iter() {
        for m in lp.regex.find_iter(text) {
            markers.push((m.start(), m.end(), lp.kind));
        }
    }
    markers.sort_by_key(|(start, end, _)| (*start, std::cmp::Reverse(*end)));
    let mut accepted: Vec<(usize, usize, SectionKind)> = Vec::new();
    for marker in markers {
        if accepted.last().map_or(true, |prev| marker.0 >= prev.1) {
            accepted.push(marker);
        }
    }

    for (i, (_, end, kind)) in accepted.iter().enumerate() {
        if sections.get(*kind).is_some() {
            continue; // first marker wins per field
        }
        let span_end = accepted.get(i + 1).map_or(text.len(), |next| next.0);
        let span = &text[*end..span_end];
        let content = tidy(span);
        let value = match kind {
            SectionKind::Demographics => canonical_demographics(span).or(nonempty(content)),
            SectionKind::Vitals => vitals_summary(span, true).or(nonempty(content)),
            _ => nonempty(content),
        };
        if let Some(value) = value {
            sections.set(*kind, value);
        }
    }

    // Per-field fallback heuristics over the whole text.
    if sections.get(SectionKind::Demographics).is_none() {
        if let Some(value) = canonical_demographics(text) {
            sections.set(SectionKind::Demographics, value);
        }
    }
    if sections.get(SectionKind::Allergies).is_none() && NKDA_RE.is_match(text) {
        sections.set(SectionKind::Allergies, "No known allergies".to_string());
    }
    if sections.get(SectionKind::Vitals).is_none() {
        if let Some(value) = vitals_summary(text, false) {
            sections.set(SectionKind::Vitals, value);
        }
    }

    tracing::debug!(
        sections_found = sections.found_count(),
        note_len = text.len(),
        "Section extraction complete"
    );

    sections
}

fn nonempty(content: String) -> Option<String> {
    // Very short residues ("y", "-") are marker noise, not content.
    if content.chars().count() > 2 {
        Some(content)
    } else {
        None
    }
}

/// Strip separator punctuation and cap the content length on a word
/// boundary.
fn tidy(span: &str) -> String {
    let trimmed = LEADING_SEP_RE.replace(span, "");
    let trimmed = TRAILING_SEP_RE.replace(&trimmed, "");
    if trimmed.chars().count() <= MAX_SECTION_CHARS {
        return trimmed.into_owned();
    }
    let cut: String = trimmed.chars().take(MAX_SECTION_CHARS).collect();
    match cut.rfind(' ') {
        Some(i) if i > 0 => format!("{}...", &cut[..i]),
        _ => format!("{cut}..."),
    }
}

/// Canonicalize an age+gender token sequence ("52yo male", "34 year old
/// woman") into "52-year-old male" form.
fn canonical_demographics(span: &str) -> Option<String> {
    let caps = AGE_RE.captures(span)?;
    let age = caps.get(1).map(|m| m.as_str())?;
    let after: String = span[caps.get(0)?.end()..].chars().take(60).collect();
    let gender = GENDER_RE.find(&after).map(|m| match m.as_str().to_lowercase().as_str() {
        "woman" => "female".to_string(),
        "man" => "male".to_string(),
        other => other.to_string(),
    });
    Some(match gender {
        Some(g) => format!("{age}-year-old {g}"),
        None => format!("{age}-year-old"),
    })
}

/// Pull BP / HR / SpO2 sub-fields out of a vitals span and normalize
/// them to unit-labeled strings. Bare "NNN/NN" readings count as blood
/// pressure only inside an explicitly labeled vitals span.
fn vitals_summary(span: &str, labeled_span: bool) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    let bp = BP_RE
        .captures(span)
        .or_else(|| if labeled_span { BARE_BP_RE.captures(span) } else { None });
    if let Some(caps) = bp {
        parts.push(format!("BP {}/{} mmHg", &caps[1], &caps[2]));
    }
    if let Some(caps) = HR_RE.captures(span) {
        parts.push(format!("HR {} bpm", &caps[1]));
    }
    if let Some(caps) = SPO2_RE.captures(span) {
        parts.push(format!("SpO2 {}%", &caps[1]));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
