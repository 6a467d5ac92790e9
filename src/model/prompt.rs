//! Prompt assembly for the summarization request.

use crate::pipeline::types::SectionSet;

/// System role: documentation only, strictly grounded in the note.
pub const SUMMARY_SYSTEM_PROMPT: &str = "\
You are a clinical documentation specialist. Summarize the clinical note \
into concise, professional prose.

Strict rules:
- State only facts present in the note. Never add diagnoses, treatment \
suggestions, interpretations, or prognoses.
- Never invent measurements, dosages, or dates.
- Use the patient demographics exactly as given.
- Do not address the patient or give advice.
- Output plain prose, no headers or bullet lists.";

/// Build the user message: extracted sections first as anchors, then the
/// full normalized note.
pub fn build_summary_prompt(note: &str, sections: &SectionSet) -> String {
    let mut prompt = String::from("Extracted sections:\n");
    for (kind, value) in sections.iter() {
        if let Some(value) = value {
            prompt.push_str(&format!("- {}: {}\n", kind.label(), value));
        }
    }
    if sections.found_count() == 0 {
        prompt.push_str("(none)\n");
    }
    prompt.push_str("\nClinical note:\n");
    prompt.push_str(note);
    prompt.push_str("\n\nWrite the summary now.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::SectionKind;

    #[test]
    fn prompt_lists_found_sections_in_order() {
        let mut sections = SectionSet::default();
        sections.set(SectionKind::Vitals, "BP 120/80 mmHg".into());
        sections.set(SectionKind::Demographics, "52-year-old male".into());
        let prompt = build_summary_prompt("note body", &sections);
        let demo = prompt.find("Demographics:").unwrap();
        let vitals = prompt.find("Vitals:").unwrap();
        assert!(demo < vitals);
        assert!(prompt.contains("note body"));
    }

    #[test]
    fn empty_sections_are_marked_explicitly() {
        let prompt = build_summary_prompt("free text", &SectionSet::default());
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn system_prompt_forbids_advice() {
        assert!(SUMMARY_SYSTEM_PROMPT.contains("Never add diagnoses"));
    }
}
