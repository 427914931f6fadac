//! Document ingestion.
//!
//! PDF files go through `pdf-extract` (feature `pdf`); anything else is read
//! as UTF-8 text, replacing invalid sequences.

use std::fmt::Write;
use std::path::Path;

use crate::core::Document;
use crate::error::{CommandError, IoError, Result};

/// Cleaned documents shorter than this (in characters) are rejected.
pub const MIN_DOCUMENT_CHARS: usize = 50;

const FORM_FEED: char = '\x0C';

/// Reads the raw text of `path`.
///
/// # Errors
///
/// Returns [`IoError::ReadFailed`] when the file cannot be read, and
/// [`IoError::PdfExtraction`] / [`IoError::PdfUnsupported`] for PDFs that
/// cannot be decoded.
pub fn read_document(path: &Path) -> std::result::Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if is_pdf(path) {
        return extract_pdf(path, &bytes);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads, cleans and chunks `path` into a [`Document`].
///
/// # Errors
///
/// Returns [`IoError`] on read failures, a chunking error for invalid
/// window parameters, and [`CommandError::InvalidInput`] when the cleaned
/// text is shorter than [`MIN_DOCUMENT_CHARS`].
pub fn load_document(path: &Path, chunk_size: usize, overlap: usize) -> Result<Document> {
    let raw = read_document(path)?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let document = Document::new(name, raw, chunk_size, overlap)?;

    if document.char_len() < MIN_DOCUMENT_CHARS {
        return Err(CommandError::InvalidInput(format!(
            "{} contains too little text to analyse ({} characters, minimum {MIN_DOCUMENT_CHARS})",
            path.display(),
            document.char_len()
        ))
        .into());
    }

    tracing::debug!(
        path = %path.display(),
        chars = document.char_len(),
        chunks = document.chunks.len(),
        "document loaded"
    );
    Ok(document)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path, bytes: &[u8]) -> std::result::Result<String, IoError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| IoError::PdfExtraction {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if text.trim().is_empty() {
        return Err(IoError::PdfExtraction {
            path: path.display().to_string(),
            reason: "no text layer found; the PDF may be scanned or password-protected"
                .to_string(),
        });
    }

    Ok(with_page_markers(&text))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path, _bytes: &[u8]) -> std::result::Result<String, IoError> {
    Err(IoError::PdfUnsupported {
        path: path.display().to_string(),
    })
}

/// Prefixes every non-blank page with a `--- Page N ---` marker when the
/// text carries form-feed page breaks. Numbering counts blank pages too.
#[must_use]
pub fn with_page_markers(text: &str) -> String {
    if !text.contains(FORM_FEED) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 32);
    for (i, page) in text.split(FORM_FEED).enumerate() {
        let page = page.trim();
        if page.is_empty() {
            continue;
        }
        let _ = write!(out, "\n--- Page {} ---\n{page}\n", i + 1);
    }
    out
}
