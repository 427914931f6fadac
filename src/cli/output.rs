//! Output rendering for CLI commands.
//!
//! Every command renders either human-readable text or pretty JSON. Text
//! rendering of model outlines is normalized here: bold headings become
//! plain headings, bullet styles are unified, and absent values read
//! `Not mentioned`.

use std::fmt::Write;

use serde::Serialize;
use serde_json::json;

use crate::agent::report::{AnswerReport, ExtractionReport, MergedResult};
use crate::agent::schema::{NOT_MENTIONED, is_absent};
use crate::core::{Document, QaEntry, Translation};

/// Characters of each chunk shown by `chunks` in text mode.
const CHUNK_PREVIEW_CHARS: usize = 120;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything but `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    /// Serializes `value` as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
            json!({ "error": format!("serialization failed: {e}") }).to_string()
        });
        out.push('\n');
        out
    }
}

/// Renders the chunk preview of a document.
#[must_use]
pub fn format_chunks(doc: &Document, chunk_size: usize, overlap: usize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "Document: {} ({} chars, {} chunk(s), size {chunk_size}, overlap {overlap})\n",
                doc.name,
                doc.char_len(),
                doc.chunks.len()
            );
            for chunk in &doc.chunks {
                let preview: String = chunk.content.chars().take(CHUNK_PREVIEW_CHARS).collect();
                let ellipsis = if chunk.char_len() > CHUNK_PREVIEW_CHARS { "..." } else { "" };
                let _ = write!(
                    out,
                    "\n[{}] {} chars\n  {preview}{ellipsis}\n",
                    chunk.index,
                    chunk.char_len()
                );
            }
            out
        }
        OutputFormat::Json => {
            let chunks: Vec<_> = doc
                .chunks
                .iter()
                .map(|c| json!({ "index": c.index, "chars": c.char_len(), "content": c.content }))
                .collect();
            format.to_json(&json!({
                "document": doc.name,
                "chars": doc.char_len(),
                "chunk_size": chunk_size,
                "overlap": overlap,
                "chunks": chunks,
            }))
        }
    }
}

/// Renders an extraction, with its translation when one was made.
#[must_use]
pub fn format_extraction(
    document: &str,
    report: &ExtractionReport,
    translation: Option<&Translation>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = render_merged(&report.merged);
            let skipped_hint = if report.skipped.is_empty() {
                String::new()
            } else {
                format!(" ({} skipped)", report.skipped.len())
            };
            let _ = write!(
                out,
                "\n\n---\nDocument: {document} | Schema: {} | Chunks: {}/{} used{skipped_hint} | Time: {:.1}s",
                report.schema,
                report.chunks_used,
                report.chunks_total,
                report.elapsed.as_secs_f64()
            );
            if report.backfilled_fields > 0 {
                let _ = write!(out, "\nRestored {} field(s) from chunk results", report.backfilled_fields);
            }
            if report.reduce_fallback {
                out.push_str("\nConsolidation failed; showing the first chunk result");
            }
            if matches!(report.merged, MergedResult::Unparsed(_)) {
                out.push_str("\nThe model reply held no parseable JSON; showing it verbatim");
            }
            for skipped in &report.skipped {
                let _ = write!(out, "\nSkipped chunk {}: {}", skipped.chunk_index, skipped.reason);
            }
            if let Some(t) = translation {
                let _ = write!(out, "\n\n=== Translation ({}) ===\n{}", t.language, t.text);
            }
            out.push('\n');
            out
        }
        OutputFormat::Json => format.to_json(&json!({
            "document": document,
            "report": report,
            "translation": translation,
        })),
    }
}

/// Renders the answer to one question.
#[must_use]
pub fn format_answer(report: &AnswerReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = report.answer.text().to_string();
            let _ = write!(
                out,
                "\n\n---\nRelevant chunks: {}/{}{} | Time: {:.1}s\n",
                report.relevant_chunks.len(),
                report.chunks_total,
                if report.merge_fallback { " (merge failed)" } else { "" },
                report.elapsed.as_secs_f64()
            );
            out
        }
        OutputFormat::Json => format.to_json(report),
    }
}

/// Renders a translation.
#[must_use]
pub fn format_translation(document: &str, translation: &Translation, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{}\n", translation.text),
        OutputFormat::Json => format.to_json(&json!({
            "document": document,
            "language": translation.language,
            "text": translation.text,
        })),
    }
}

/// Renders the QA history of a session.
#[must_use]
pub fn format_history(entries: &[QaEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                return "No questions asked yet.\n".to_string();
            }
            let mut out = String::new();
            for (i, entry) in entries.iter().enumerate() {
                let _ = write!(out, "Q{}: {}\nA{}: {}\n\n", i + 1, entry.question, i + 1, entry.answer);
            }
            out
        }
        OutputFormat::Json => format.to_json(entries),
    }
}

/// Text form of a merged result.
#[must_use]
pub fn render_merged(merged: &MergedResult) -> String {
    match merged {
        MergedResult::Outline(text) => render_outline(text),
        other => other.to_text(),
    }
}

/// Normalizes a model-written outline for terminal display.
///
/// Any preamble before the first bold heading is dropped, `**Heading**`
/// lines become plain headings preceded by a blank line, `*` and `•`
/// bullets become `-`, and `Label: value` lines whose value means "absent"
/// read `Label: Not mentioned`.
#[must_use]
pub fn render_outline(text: &str) -> String {
    let body = text.find("**").map_or(text, |i| &text[i..]);
    let mut lines: Vec<String> = Vec::new();

    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = bold_heading(line) {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(heading.to_string());
            continue;
        }

        let (bullet, item) = ["* ", "• ", "- "]
            .iter()
            .find_map(|b| line.strip_prefix(b))
            .map_or((false, line), |rest| (true, rest.trim()));
        let item = item.replace("**", "");
        let item = match item.split_once(':') {
            Some((label, value)) if is_absent(value) => format!("{}: {NOT_MENTIONED}", label.trim()),
            Some((label, value)) => format!("{}: {}", label.trim(), value.trim()),
            None => item,
        };

        lines.push(if bullet { format!("- {item}") } else { item });
    }

    lines.join("\n")
}

/// Returns the heading text of a `**Heading**` line.
fn bold_heading(line: &str) -> Option<&str> {
    let inner = line
        .trim_end_matches(':')
        .strip_prefix("**")?
        .strip_suffix("**")?
        .trim()
        .trim_end_matches(':')
        .trim();
    (!inner.is_empty() && !inner.contains("**")).then_some(inner)
}
