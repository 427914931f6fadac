//! Result types produced by the orchestrators.

use serde::Serialize;
use std::time::Duration;

use super::schema::{ExtractionSchema, TenderExtraction};

/// Text shown when no chunk produced a relevant answer.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found in the document.";

/// One chunk's map-phase output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialResult {
    /// 0-based index of the source chunk.
    pub chunk_index: usize,
    /// Model reply for the chunk.
    pub content: String,
}

/// A chunk whose map-phase call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedChunk {
    /// 0-based index of the source chunk.
    pub chunk_index: usize,
    /// Rendered failure.
    pub reason: String,
}

/// The combined output of an extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MergedResult {
    /// Labelled outline text.
    Outline(String),
    /// Parsed JSON contract.
    Structured(TenderExtraction),
    /// JSON was requested but the reply held no parseable object.
    Unparsed(String),
}

impl MergedResult {
    /// Plain-text form, used for display and translation.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Outline(text) | Self::Unparsed(text) => text.trim().to_string(),
            Self::Structured(extraction) => extraction.to_string().trim_end().to_string(),
        }
    }

    /// The structured extraction, when one was parsed.
    #[must_use]
    pub const fn structured(&self) -> Option<&TenderExtraction> {
        match self {
            Self::Structured(extraction) => Some(extraction),
            _ => None,
        }
    }
}

/// Final result of [`Orchestrator::summarize`](super::orchestrator::Orchestrator::summarize).
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    /// Contract used for the run.
    #[serde(serialize_with = "serialize_schema")]
    pub schema: ExtractionSchema,
    /// Combined result.
    pub merged: MergedResult,
    /// Reduce reply, or the fallback partial, before parsing.
    #[serde(skip)]
    pub raw_text: String,
    /// Chunks in the document.
    pub chunks_total: usize,
    /// Chunks whose map call succeeded.
    pub chunks_used: usize,
    /// Chunks whose map call failed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedChunk>,
    /// The reduce call failed and the first partial was used instead.
    pub reduce_fallback: bool,
    /// Fields restored from partials after the reduce step.
    pub backfilled_fields: usize,
    /// Wall-clock time of the run.
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
}

/// Outcome of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Answer {
    /// A relevant answer was found.
    Answered(String),
    /// Every chunk's reply was filtered out.
    NoRelevantInformation,
}

impl Answer {
    /// Text shown to the user.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Answered(text) => text,
            Self::NoRelevantInformation => NO_RELEVANT_INFORMATION,
        }
    }
}

/// Final result of [`Orchestrator::answer`](super::orchestrator::Orchestrator::answer).
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReport {
    /// The question as asked.
    pub question: String,
    /// The answer.
    pub answer: Answer,
    /// Chunks in the document.
    pub chunks_total: usize,
    /// Indices of chunks whose reply passed the relevance filter.
    pub relevant_chunks: Vec<usize>,
    /// The merge call failed and the first relevant reply was used.
    pub merge_fallback: bool,
    /// Wall-clock time of the run.
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_duration<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_f64(d.as_secs_f64())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_schema<S>(schema: &ExtractionSchema, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(schema.as_str())
}
