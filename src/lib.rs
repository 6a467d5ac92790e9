//! clinscribe — deterministic safety pipeline for clinical notes.
//!
//! The pipeline turns a shorthand-laden clinical note into a de-identified,
//! structured, safety-checked summary. Every stage except the model call is
//! a pure function over static dictionaries loaded once at process start:
//!
//! normalize → red-flag scan → extract → model call (with template
//! fallback) → re-scan → escalation → confidence → `SummaryResult`.
//!
//! The model collaborator is an untrusted text source behind the narrow
//! [`model::ModelClient`] trait; its output is validated, never believed.

pub mod config;
pub mod model;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and tests that embed the pipeline.
///
/// Honors `RUST_LOG` when set; falls back to the crate default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
