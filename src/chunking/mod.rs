//! Text chunking.
//!
//! Splits cleaned document text into overlapping fixed-size windows for the
//! map phase, and regroups paragraphs into size-bounded groups for
//! translation. All lengths are counted in characters, never bytes, so a
//! window boundary can not fall inside a multi-byte UTF-8 sequence.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ChunkingError;

/// Default window length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// Default overlap between consecutive windows in characters.
pub const DEFAULT_OVERLAP: usize = 300;

/// A contiguous, trimmed window of document text.
///
/// Chunks are produced once and never re-split. `index` is the 0-based
/// position in document order and is used to number sections in merge
/// prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in document order.
    pub index: usize,
    /// Trimmed window content.
    pub content: String,
}

impl Chunk {
    /// Length of the content in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Splits `text` into overlapping windows of `chunk_size` characters.
///
/// Consecutive windows start `chunk_size - overlap` characters apart. Each
/// window is trimmed and dropped if blank. Text no longer than `chunk_size`
/// short-circuits to a single chunk holding the trimmed input.
///
/// # Errors
///
/// Returns [`ChunkingError`] if `chunk_size` is zero or `overlap` is not
/// smaller than `chunk_size`.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::InvalidOverlap {
            size: chunk_size,
            overlap,
        });
    }

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    if char_len <= chunk_size {
        return Ok(vec![Chunk {
            index: 0,
            content: text.trim().to_string(),
        }]);
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(char_len.div_ceil(step));
    let mut start = 0;

    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        let window = text[boundaries[start]..boundaries[end]].trim();
        if !window.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                content: window.to_string(),
            });
        }
        if end >= char_len {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

/// Greedily regroups blank-line separated paragraphs into groups of at most
/// `budget` characters.
///
/// Paragraphs are never split across groups unless a single paragraph is
/// longer than `budget` on its own; such a paragraph is hard-split near the
/// budget (at whitespace when possible) and each piece becomes its own group.
/// Paragraphs inside a group are joined with a blank line.
#[must_use]
pub fn group_paragraphs(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in paragraphs(text) {
        let para_len = paragraph.chars().count();

        if para_len > budget {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
                current_len = 0;
            }
            groups.extend(hard_split(paragraph, budget));
            continue;
        }

        // +2 for the blank line joining two paragraphs.
        let joined_len = if current.is_empty() {
            para_len
        } else {
            current_len + 2 + para_len
        };

        if joined_len > budget {
            groups.push(std::mem::take(&mut current));
            current.push_str(paragraph);
            current_len = para_len;
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            current_len = joined_len;
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Non-blank paragraphs separated by one or more blank lines.
fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    static BLANK_LINE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").unwrap_or_else(|_| unreachable!()));

    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// Splits an oversized paragraph into pieces of at most `budget` characters,
/// preferring the last whitespace inside each window.
fn hard_split(paragraph: &str, budget: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + budget).min(chars.len());
        if end < chars.len()
            && let Some(ws) = chars[start..end].iter().rposition(|c| c.is_whitespace())
            && ws > 0
        {
            end = start + ws;
        }
        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        start = end;
    }

    pieces
}
