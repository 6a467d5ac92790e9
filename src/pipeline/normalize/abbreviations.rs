//! Medical abbreviation expansion.
//!
//! Whole-word, case-insensitive, single pass. Expansion is deliberately
//! not recursive: each occurrence is replaced exactly once and the
//! replacement text is never re-scanned, so a second normalization pass
//! is a no-op. The dictionary upholds a closure invariant — no expansion
//! contains a dictionary key as a standalone word — which the tests check.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Word-shaped abbreviations (matched with `\b` boundaries).
static WORD_EXPANSIONS: &[(&str, &str)] = &[
    ("pt", "patient"),
    ("hx", "history"),
    ("dx", "diagnosis"),
    ("tx", "treatment"),
    ("rx", "prescription"),
    ("sx", "symptoms"),
    ("bp", "blood pressure"),
    ("hr", "heart rate"),
    ("rr", "respiratory rate"),
    ("temp", "temperature"),
    ("yo", "year old"),
    ("yoa", "year old"),
    ("sob", "shortness of breath"),
    ("cp", "chest pain"),
    ("abd", "abdominal"),
    ("htn", "hypertension"),
    ("dm", "diabetes mellitus"),
    ("cad", "coronary artery disease"),
    ("chf", "congestive heart failure"),
    ("copd", "chronic obstructive pulmonary disease"),
    ("uti", "urinary tract infection"),
    ("bid", "twice daily"),
    ("tid", "three times daily"),
    ("qid", "four times daily"),
    ("prn", "as needed"),
    ("po", "by mouth"),
    ("iv", "intravenous"),
    ("im", "intramuscular"),
    ("npo", "nothing by mouth"),
    ("wbc", "white blood cell"),
    ("rbc", "red blood cell"),
    ("hgb", "hemoglobin"),
    ("plt", "platelets"),
    ("bmp", "basic metabolic panel"),
    ("cbc", "complete blood count"),
    ("ekg", "electrocardiogram"),
    ("cxr", "chest x-ray"),
    ("ct", "computed tomography"),
    ("mri", "magnetic resonance imaging"),
    ("hpi", "history of present illness"),
    ("pmh", "past medical history"),
    ("psh", "past surgical history"),
    ("fhx", "family history"),
    ("pe", "physical examination"),
    ("nkda", "no known drug allergies"),
    ("fx", "fracture"),
    ("loc", "loss of consciousness"),
    ("gi", "gastrointestinal"),
    ("gu", "genitourinary"),
    ("ha", "headache"),
];

/// Slash-shaped shorthand. `w/o` must precede `w/` — alternatives are
/// tried in order and `w/` is a prefix of `w/o`.
static SLASH_EXPANSIONS: &[(&str, &str)] = &[
    ("c/o", "complaining of"),
    ("s/p", "status post"),
    ("n/v", "nausea and vomiting"),
    ("w/o", "without"),
    ("w/", "with "),
];

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut keys: Vec<&str> = WORD_EXPANSIONS.iter().map(|(k, _)| *k).collect();
    // Longest first so no key shadows a longer one at the same position.
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let alternation = keys.join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("Invalid abbreviation alternation")
});

static WORD_LOOKUP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| WORD_EXPANSIONS.iter().copied().collect());

static SLASH_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SLASH_EXPANSIONS
        .iter()
        .map(|(key, expansion)| {
            let escaped = regex::escape(key);
            // A trailing `\b` after "/" would demand a following word
            // character, which breaks "w/ fever"; keys ending in a slash
            // get no trailing boundary.
            let pattern = if key.ends_with('/') {
                format!(r"(?i)\b{escaped}")
            } else {
                format!(r"(?i)\b{escaped}\b")
            };
            (
                Regex::new(&pattern).expect("Invalid slash abbreviation pattern"),
                *expansion,
            )
        })
        .collect()
});

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("Invalid space-collapse pattern"));

/// Expand every recognized abbreviation exactly once.
pub fn expand_abbreviations(text: &str) -> String {
    let mut out = text.to_string();

    for (re, expansion) in SLASH_RES.iter() {
        out = re.replace_all(&out, *expansion).into_owned();
    }

    let out = WORD_RE
        .replace_all(&out, |caps: &regex::Captures| {
            let token = caps[0].to_lowercase();
            WORD_LOOKUP
                .get(token.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();

    // "w/" expands to "with " and may leave a doubled space behind.
    MULTI_SPACE_RE.replace_all(&out, " ").into_owned()
}
