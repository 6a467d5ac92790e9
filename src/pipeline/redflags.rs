//! Red-flag symptom scanning.
//!
//! A fixed phrase table per emergency category, matched case-insensitively
//! on word boundaries. A hit is suppressed when a negation cue appears
//! within the preceding token window ("denies chest pain"). The scanner
//! runs twice per request: on the normalized note before the model call,
//! and on the produced summary after it; [`merge`] unions the two scans.

use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::types::{RedFlagCategory, RedFlagMatch};

/// Tokens that negate a following symptom mention.
const NEGATION_CUES: [&str; 6] = ["no", "denies", "denied", "without", "not", "negative"];

struct FlagPattern {
    regex: Regex,
    category: RedFlagCategory,
    phrase: &'static str,
}

static PHRASE_TABLE: &[(RedFlagCategory, &[&str])] = &[
    (
        RedFlagCategory::Cardiovascular,
        &[
            "chest pain",
            "chest pressure",
            "chest tightness",
            "crushing sensation",
            "palpitations",
            "heart attack",
        ],
    ),
    (
        RedFlagCategory::Respiratory,
        &[
            "shortness of breath",
            "difficulty breathing",
            "cannot breathe",
            "can't breathe",
            "respiratory distress",
            "cyanosis",
            "gasping for air",
            "choking",
        ],
    ),
    (
        RedFlagCategory::Neurological,
        &[
            "stroke",
            "loss of consciousness",
            "unresponsive",
            "slurred speech",
            "facial droop",
            "seizure",
            "convulsion",
            "worst headache",
        ],
    ),
    (
        RedFlagCategory::Trauma,
        &[
            "severe bleeding",
            "uncontrolled bleeding",
            "head injury",
            "gunshot",
            "stab wound",
            "major trauma",
            "open fracture",
        ],
    ),
    (
        RedFlagCategory::Allergic,
        &[
            "anaphylaxis",
            "throat swelling",
            "tongue swelling",
            "difficulty swallowing",
            "severe allergic reaction",
            "widespread hives",
        ],
    ),
];

static PATTERNS: LazyLock<Vec<FlagPattern>> = LazyLock::new(|| {
    PHRASE_TABLE
        .iter()
        .flat_map(|(category, phrases)| {
            phrases.iter().map(|phrase| {
                let words: Vec<String> =
                    phrase.split_whitespace().map(regex::escape).collect();
                let pattern = format!(r"(?i)\b{}\b", words.join(r"\s+"));
                FlagPattern {
                    regex: Regex::new(&pattern).expect("Invalid red-flag phrase pattern"),
                    category: *category,
                    phrase,
                }
            })
        })
        .collect()
});

/// Scan a text for red-flag phrases, suppressing negated mentions.
///
/// `negation_window` is the number of whitespace tokens before the match
/// inspected for negation cues. Matches come back sorted by offset.
pub fn scan(text: &str, negation_window: usize) -> Vec<RedFlagMatch> {
    let mut matches: Vec<RedFlagMatch> = Vec::new();
    for pattern in PATTERNS.iter() {
        for m in pattern.regex.find_iter(text) {
            if is_negated(text, m.start(), negation_window) {
                tracing::debug!(
                    phrase = pattern.phrase,
                    offset = m.start(),
                    "Red-flag mention negated, skipping"
                );
                continue;
            }
            matches.push(RedFlagMatch {
                category: pattern.category,
                phrase: pattern.phrase.to_string(),
                offset: m.start(),
                length: m.len(),
            });
        }
    }
    matches.sort_by(|a, b| (a.offset, &a.phrase).cmp(&(b.offset, &b.phrase)));
    matches
}

/// Union two scans, deduplicating by (category, phrase). First occurrence
/// wins, so offsets from the earlier scan are kept.
pub fn merge(first: Vec<RedFlagMatch>, second: Vec<RedFlagMatch>) -> Vec<RedFlagMatch> {
    let mut seen: Vec<(RedFlagCategory, String)> = Vec::new();
    let mut merged = Vec::new();
    for m in first.into_iter().chain(second) {
        let key = (m.category, m.phrase.clone());
        if !seen.contains(&key) {
            seen.push(key);
            merged.push(m);
        }
    }
    merged
}

/// Distinct categories present, in first-hit order.
pub fn categories(matches: &[RedFlagMatch]) -> Vec<RedFlagCategory> {
    let mut out: Vec<RedFlagCategory> = Vec::new();
    for m in matches {
        if !out.contains(&m.category) {
            out.push(m.category);
        }
    }
    out
}

fn is_negated(text: &str, match_start: usize, window: usize) -> bool {
    text[..match_start]
        .split_whitespace()
        .rev()
        .take(window)
        .any(|token| {
            let bare = token
                .trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_lowercase();
            NEGATION_CUES.contains(&bare.as_str())
        })
}
