//! Prompt templates and builders for the extraction, QA and translation
//! calls.
//!
//! Templates are loaded from markdown files when available and fall back to
//! compiled-in defaults. Builders turn templates plus run data into the
//! instruction string handed to [`LlmClient::call`](super::client::LlmClient::call).

use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Fixed persona sent as the system message on every call.
pub const SYSTEM_PROMPT: &str = "You are an expert analyst of tender and bid documents. \
You read procurement notices, bid documents and contract conditions carefully and report \
only what the text states. You never invent figures, dates or names.";

/// Per-chunk instruction for the labelled outline contract.
pub const EXTRACT_OUTLINE_PROMPT: &str = r"Extract the following information from the tender document text above. Use exactly these headings and labels. Write 'Not mentioned' for anything the text does not state.

**Basic Information**
- Tender Number/Reference:
- Name of Work/Project:
- Issuing Department/Organization:

**Financial Details**
- Estimated Contract Value:
- EMD (Earnest Money Deposit):
- EMD Exemption (if any):
- Performance Security:

**Timeline**
- Bid Submission Deadline:
- Technical Bid Opening:
- Contract Duration:

**Requirements**
- Key Eligibility Criteria:
- Required Documents:
- Technical Specifications (Brief):
- Payment Terms:

Return only the outline.";

/// Per-chunk instruction for the JSON contract.
pub const EXTRACT_JSON_PROMPT: &str = r#"Extract the following information from the tender document text above and return it as a single JSON object with exactly this structure. Use the string "Not mentioned" for any field the text does not state. Use plain strings for every value.

{
  "basic_information": {
    "tender_number_reference": "",
    "name_of_work_project": "",
    "issuing_department_organization": ""
  },
  "financial_details": {
    "estimated_contract_value": "",
    "emd_earnest_money_deposit": "",
    "emd_exemption_if_any": "",
    "performance_security": ""
  },
  "timeline": {
    "bid_submission_deadline": "",
    "technical_bid_opening": "",
    "contract_duration": ""
  },
  "requirements": {
    "key_eligibility_criteria": "",
    "required_documents": "",
    "technical_specifications_brief": "",
    "payment_terms": ""
  }
}

Return only the JSON object, with no explanation and no code fences."#;

/// Reduce instruction for the outline contract.
pub const CONSOLIDATE_OUTLINE_PROMPT: &str = r"The sections below are partial extractions from consecutive parts of one tender document. Merge them into one outline with the same headings and labels. Remove duplicates. Where sections disagree or one is more detailed, keep the most complete value for each field. Write 'Not mentioned' only when no section supplies a value. Return only the merged outline.";

/// Reduce instruction for the JSON contract.
pub const CONSOLIDATE_JSON_PROMPT: &str = r#"The sections below are partial JSON extractions from consecutive parts of one tender document. Merge them into one JSON object with exactly the same structure and keys. For each field keep the most complete value any section supplies; use "Not mentioned" only when no section supplies a value. Return only the merged JSON object, with no explanation and no code fences."#;

/// Merge instruction for per-chunk answers. `{question}` is substituted.
pub const MERGE_ANSWERS_PROMPT: &str = r"The answers below were produced from different parts of the same tender document for the question: {question}

Combine them into one clear, complete answer. Remove duplicate information and resolve contradictions in favour of the more specific statement. Do not mention the parts or answers themselves.";

/// Translation instruction. `{language}` is substituted.
pub const TRANSLATE_PROMPT: &str = r"Translate the text above into {language}. Translate it verbatim, keeping every heading, label, figure, date and line break. Do not add introductory phrases, explanations or quotation marks. Return only the translation.";

/// Default prompt directory under user config.
const DEFAULT_PROMPT_DIR: &str = ".config/bid-analyser/prompts";

const SYSTEM_FILENAME: &str = "system.md";
const EXTRACT_OUTLINE_FILENAME: &str = "extract_outline.md";
const EXTRACT_JSON_FILENAME: &str = "extract_json.md";
const CONSOLIDATE_OUTLINE_FILENAME: &str = "consolidate_outline.md";
const CONSOLIDATE_JSON_FILENAME: &str = "consolidate_json.md";
const MERGE_ANSWERS_FILENAME: &str = "merge_answers.md";
const TRANSLATE_FILENAME: &str = "translate.md";

const TEMPLATES: [(&str, &str); 7] = [
    (SYSTEM_FILENAME, SYSTEM_PROMPT),
    (EXTRACT_OUTLINE_FILENAME, EXTRACT_OUTLINE_PROMPT),
    (EXTRACT_JSON_FILENAME, EXTRACT_JSON_PROMPT),
    (CONSOLIDATE_OUTLINE_FILENAME, CONSOLIDATE_OUTLINE_PROMPT),
    (CONSOLIDATE_JSON_FILENAME, CONSOLIDATE_JSON_PROMPT),
    (MERGE_ANSWERS_FILENAME, MERGE_ANSWERS_PROMPT),
    (TRANSLATE_FILENAME, TRANSLATE_PROMPT),
];

/// The full set of prompt templates.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from CLI flags, environment variables, or the default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System persona.
    pub system: String,
    /// Per-chunk outline extraction instruction.
    pub extract_outline: String,
    /// Per-chunk JSON extraction instruction.
    pub extract_json: String,
    /// Outline reduce instruction.
    pub consolidate_outline: String,
    /// JSON reduce instruction.
    pub consolidate_json: String,
    /// Answer merge instruction.
    pub merge_answers: String,
    /// Translation instruction.
    pub translate: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from `--prompt-dir` or `BID_PROMPT_DIR`)
    /// 2. `~/.config/bid-analyser/prompts/`
    ///
    /// Each file is loaded independently; a missing or blank file uses its
    /// default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(PathBuf::from).or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            system: load_file(SYSTEM_FILENAME, SYSTEM_PROMPT),
            extract_outline: load_file(EXTRACT_OUTLINE_FILENAME, EXTRACT_OUTLINE_PROMPT),
            extract_json: load_file(EXTRACT_JSON_FILENAME, EXTRACT_JSON_PROMPT),
            consolidate_outline: load_file(CONSOLIDATE_OUTLINE_FILENAME, CONSOLIDATE_OUTLINE_PROMPT),
            consolidate_json: load_file(CONSOLIDATE_JSON_FILENAME, CONSOLIDATE_JSON_PROMPT),
            merge_answers: load_file(MERGE_ANSWERS_FILENAME, MERGE_ANSWERS_PROMPT),
            translate: load_file(TRANSLATE_FILENAME, TRANSLATE_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            extract_outline: EXTRACT_OUTLINE_PROMPT.to_string(),
            extract_json: EXTRACT_JSON_PROMPT.to_string(),
            consolidate_outline: CONSOLIDATE_OUTLINE_PROMPT.to_string(),
            consolidate_json: CONSOLIDATE_JSON_PROMPT.to_string(),
            merge_answers: MERGE_ANSWERS_PROMPT.to_string(),
            translate: TRANSLATE_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (filename, content) in &TEMPLATES {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Builds the reduce instruction: the template followed by every partial,
/// labelled `Section N` in document order.
#[must_use]
pub fn build_consolidation_prompt<'a>(
    template: &str,
    partials: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut prompt = template.trim_end().to_string();
    for (i, partial) in partials.into_iter().enumerate() {
        let _ = write!(prompt, "\n\nSection {}:\n{}", i + 1, partial.trim());
    }
    prompt
}

/// Builds the answer merge instruction for `question` over `answers`.
#[must_use]
pub fn build_answer_merge_prompt(template: &str, question: &str, answers: &[&str]) -> String {
    let mut prompt = template.replace("{question}", question.trim());
    for (i, answer) in answers.iter().enumerate() {
        let _ = write!(prompt, "\n\nAnswer {}:\n{}", i + 1, answer.trim());
    }
    prompt
}

/// Builds the translation instruction for `language`.
#[must_use]
pub fn build_translation_prompt(template: &str, language: &str) -> String {
    template.replace("{language}", language.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::schema::TENDER_SECTIONS;

    #[test]
    fn test_json_prompt_declares_every_field() {
        for section in &TENDER_SECTIONS {
            assert!(EXTRACT_JSON_PROMPT.contains(section.key), "{}", section.key);
            for field in section.fields {
                assert!(EXTRACT_JSON_PROMPT.contains(field.key), "{}", field.key);
            }
        }
    }

    #[test]
    fn test_outline_prompt_declares_every_label() {
        for section in &TENDER_SECTIONS {
            assert!(EXTRACT_OUTLINE_PROMPT.contains(section.title));
            for field in section.fields {
                assert!(EXTRACT_OUTLINE_PROMPT.contains(field.label), "{}", field.label);
            }
        }
    }

    #[test]
    fn test_consolidation_sections_numbered_in_order() {
        let prompt = build_consolidation_prompt("Merge.", ["first", "second", "third"]);
        let one = prompt.find("Section 1:\nfirst").unwrap_or(usize::MAX);
        let two = prompt.find("Section 2:\nsecond").unwrap_or(usize::MAX);
        let three = prompt.find("Section 3:\nthird").unwrap_or(usize::MAX);
        assert!(prompt.starts_with("Merge."));
        assert!(one < two && two < three && three < usize::MAX);
    }

    #[test]
    fn test_answer_merge_prompt() {
        let prompt = build_answer_merge_prompt(MERGE_ANSWERS_PROMPT, "What is the EMD?", &[
            "EMD is Rs 50,000.",
            "The EMD amount is fifty thousand rupees.",
        ]);
        assert!(prompt.contains("question: What is the EMD?"));
        assert!(prompt.contains("Answer 1:\nEMD is Rs 50,000."));
        assert!(prompt.contains("Answer 2:\nThe EMD amount"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_translation_prompt() {
        let prompt = build_translation_prompt(TRANSLATE_PROMPT, " Hindi ");
        assert!(prompt.contains("into Hindi."));
        assert!(!prompt.contains("{language}"));
    }

    #[test]
    fn test_load_falls_back_per_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join(SYSTEM_FILENAME), "Custom persona")
            .unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join(TRANSLATE_FILENAME), "   \n")
            .unwrap_or_else(|_| unreachable!());

        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.system, "Custom persona");
        assert_eq!(prompts.translate, TRANSLATE_PROMPT);
        assert_eq!(prompts.extract_json, EXTRACT_JSON_PROMPT);
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join(SYSTEM_FILENAME), "keep me")
            .unwrap_or_else(|_| unreachable!());

        let written = PromptSet::write_defaults(dir.path()).unwrap_or_default();
        assert_eq!(written.len(), TEMPLATES.len() - 1);
        let kept = std::fs::read_to_string(dir.path().join(SYSTEM_FILENAME)).unwrap_or_default();
        assert_eq!(kept, "keep me");
        assert_eq!(PromptSet::load(Some(dir.path())).extract_outline, EXTRACT_OUTLINE_PROMPT);
    }
}
