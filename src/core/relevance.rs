//! Relevance filter for per-chunk answers.
//!
//! This is a lexical heuristic, not a semantic one: a chunk answer counts
//! only if it is long enough to carry content and does not say the
//! information is missing.

use serde::{Deserialize, Serialize};

/// Minimum length (in characters) an answer must exceed to be kept.
pub const MIN_ANSWER_LEN: usize = 20;

/// Phrases that mark an answer as a non-answer (matched case-insensitively).
const NEGATIVE_PHRASES: [&str; 2] = ["not found", "not mentioned"];

/// Classification of a single chunk's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerRelevance {
    /// Usable answer; goes into the merge step.
    Relevant,
    /// The model said the chunk does not contain the information.
    NotFound,
    /// Too short to carry an answer.
    TooShort,
    /// The call for this chunk failed.
    Failed,
}

impl AnswerRelevance {
    /// Returns `true` for [`AnswerRelevance::Relevant`].
    #[must_use]
    pub const fn is_relevant(self) -> bool {
        matches!(self, Self::Relevant)
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Relevant => "relevant",
            Self::NotFound => "not_found",
            Self::TooShort => "too_short",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AnswerRelevance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a successful chunk answer.
#[must_use]
pub fn classify_answer(answer: &str) -> AnswerRelevance {
    if crate::error::is_error_text(answer) {
        return AnswerRelevance::Failed;
    }
    let lowered = answer.to_lowercase();
    if NEGATIVE_PHRASES.iter().any(|p| lowered.contains(p)) {
        return AnswerRelevance::NotFound;
    }
    if answer.trim().chars().count() <= MIN_ANSWER_LEN {
        return AnswerRelevance::TooShort;
    }
    AnswerRelevance::Relevant
}
