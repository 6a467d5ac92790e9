//! Note normalization: de-identification followed by abbreviation
//! expansion.
//!
//! Pure function of the input plus the static dictionaries; no state, no
//! I/O. De-identification runs first so the name pass still sees the
//! shorthand keywords, and runs once more after expansion: expansion can
//! surface keyword forms the first pass could not see ("pt ID" becomes
//! "patient ID"), and the second pass settles the text so the output is
//! already a fixed point. `normalize(normalize(x)) == normalize(x)`.

pub mod abbreviations;
pub mod deidentify;

use crate::pipeline::types::NormalizedNote;

pub use abbreviations::expand_abbreviations;
pub use deidentify::deidentify;

/// De-identify and expand a raw note.
///
/// Never fails for well-formed string input; empty/over-length inputs are
/// the summarizer's validation concern, not this function's.
pub fn normalize(raw: &str) -> NormalizedNote {
    let redacted = deidentify(raw);
    let expanded = expand_abbreviations(&redacted);
    NormalizedNote::new(deidentify(&expanded))
}
