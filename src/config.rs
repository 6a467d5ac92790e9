/// Application-level constants
pub const APP_NAME: &str = "clinscribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum accepted note length, in characters.
pub const MAX_NOTE_CHARS: usize = 5_000;

/// Minimum accepted note length, in characters.
pub const MIN_NOTE_CHARS: usize = 10;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinscribe=info"
}

/// Tunable pipeline parameters.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum note length in characters.
    pub max_note_chars: usize,
    /// Minimum note length in characters.
    pub min_note_chars: usize,
    /// How many tokens to look back for a negation cue before counting
    /// a red-flag phrase match.
    pub negation_window: usize,
    /// Confidence below this fires the high-uncertainty trigger (T-003).
    pub low_confidence_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_note_chars: MAX_NOTE_CHARS,
            min_note_chars: MIN_NOTE_CHARS,
            negation_window: 3,
            low_confidence_threshold: 0.50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_constants() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.max_note_chars, MAX_NOTE_CHARS);
        assert_eq!(cfg.min_note_chars, MIN_NOTE_CHARS);
    }

    #[test]
    fn default_thresholds_are_sane() {
        let cfg = PipelineConfig::default();
        assert!(cfg.min_note_chars < cfg.max_note_chars);
        assert!(cfg.negation_window >= 1);
        assert!(cfg.low_confidence_threshold > 0.0 && cfg.low_confidence_threshold < 1.0);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
