//! The note-safety pipeline: normalization, extraction, red-flag
//! scanning, escalation, grounding, confidence, and the orchestrator
//! that runs them in fixed order.

pub mod confidence;
pub mod escalation;
pub mod extract;
pub mod hallucination;
pub mod normalize;
pub mod redflags;
pub mod summarizer;
pub mod types;

pub use summarizer::{Summarizer, ValidationError, DISCLAIMER};
pub use types::{SummaryResult, Verdict};
