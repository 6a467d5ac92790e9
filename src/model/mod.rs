//! Model collaborator boundary.
//!
//! The pipeline treats the language model as an untrusted text generator
//! behind the [`ModelClient`] trait: it receives only de-identified,
//! normalized text, and everything it returns is re-scanned and
//! grounding-checked by the caller. The trait is dyn-compatible so tests
//! can substitute deterministic fakes.

pub mod http;
pub mod prompt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::types::SectionSet;

pub use http::ChatCompletionsClient;

/// One summarization request: the normalized note, the sections already
/// extracted from it, the role directive for the model, and optional
/// few-shot note/summary pairs to anchor the output style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub note: String,
    pub sections: SectionSet,
    /// System-role instruction sent verbatim to the backend.
    pub directive: String,
    pub few_shot: Vec<FewShotExample>,
}

impl ModelRequest {
    /// Request with the standard summarization directive and no examples.
    pub fn new(note: String, sections: SectionSet) -> Self {
        Self {
            note,
            sections,
            directive: prompt::SUMMARY_SYSTEM_PROMPT.to_string(),
            few_shot: Vec::new(),
        }
    }
}

/// A worked note/summary pair included ahead of the real request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FewShotExample {
    pub note: String,
    pub summary: String,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Service returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse service response: {0}")]
    ResponseParsing(String),

    #[error("Model endpoint not configured: {0}")]
    NotConfigured(String),
}

/// A summarization backend. One attempt per request; the orchestrator
/// owns the failure policy and falls back on any error.
pub trait ModelClient {
    fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;
}
