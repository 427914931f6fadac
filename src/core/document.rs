//! Loaded documents and text cleaning.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::chunking::{self, Chunk};
use crate::error::ChunkingError;

/// Control characters stripped by [`clean_text`]. Tab, newline and carriage
/// return are kept here and folded by the whitespace pass instead.
static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap_or_else(|_| unreachable!())
});

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap_or_else(|_| unreachable!()));

/// Strips control characters and collapses every whitespace run to a single
/// space. Non-Latin scripts are preserved untouched.
///
/// Idempotent: `clean_text(&clean_text(s)) == clean_text(s)`.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let stripped = CONTROL_CHARS.replace_all(text, "");
    WHITESPACE_RUNS
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// A document loaded into a session.
///
/// Holds the raw extracted text, its cleaned derivative, and the ordered
/// chunks cut from the cleaned text. Built once per loaded file.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Display name (usually the file name).
    pub name: String,
    /// Text as returned by the extractor.
    #[serde(skip)]
    pub raw: String,
    /// Cleaned text the chunks were cut from.
    #[serde(skip)]
    pub cleaned: String,
    /// Ordered chunks.
    pub chunks: Vec<Chunk>,
}

impl Document {
    /// Cleans `raw` and chunks it with the given window parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError`] for invalid window parameters.
    pub fn new(
        name: impl Into<String>,
        raw: String,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<Self, ChunkingError> {
        let cleaned = clean_text(&raw);
        let chunks = chunking::split(&cleaned, chunk_size, overlap)?;
        Ok(Self {
            name: name.into(),
            raw,
            cleaned,
            chunks,
        })
    }

    /// Cleaned length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.cleaned.chars().count()
    }

    /// Returns `true` when cleaning left nothing to analyse.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cleaned.is_empty()
    }
}
