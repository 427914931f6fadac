//! Per-user analysis session.
//!
//! A [`Session`] owns everything derived from one loaded document: its
//! chunks, the extraction, the QA history and the latest translation.
//! Loading another document replaces the whole value, so no derived state
//! from the previous file can survive.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::document::Document;
use crate::agent::orchestrator::Orchestrator;
use crate::agent::report::{AnswerReport, ExtractionReport};
use crate::chunking::Chunk;
use crate::error::AgentError;

/// One question and the text shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaEntry {
    /// Question as asked.
    pub question: String,
    /// Rendered answer, or the rendered error.
    pub answer: String,
}

/// The latest translation of the extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    /// Target language.
    pub language: String,
    /// Translated text.
    pub text: String,
}

/// State for one loaded document.
#[derive(Debug, Default)]
pub struct Session {
    document: Option<Document>,
    extraction: Option<ExtractionReport>,
    history: Vec<QaEntry>,
    translation: Option<Translation>,
}

impl Session {
    /// A session over `document` with no derived state.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document: Some(document),
            ..Self::default()
        }
    }

    /// A session with no document.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces the whole session with a fresh one over `document`.
    pub fn load(&mut self, document: Document) {
        tracing::info!(name = %document.name, chunks = document.chunks.len(), "loading document");
        *self = Self::new(document);
    }

    /// The loaded document, if any.
    #[must_use]
    pub const fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The latest extraction, if any.
    #[must_use]
    pub const fn extraction(&self) -> Option<&ExtractionReport> {
        self.extraction.as_ref()
    }

    /// The latest translation, if any.
    #[must_use]
    pub const fn translation(&self) -> Option<&Translation> {
        self.translation.as_ref()
    }

    /// QA history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[QaEntry] {
        &self.history
    }

    /// Clears the QA history.
    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    fn chunks(&self) -> &[Chunk] {
        self.document.as_ref().map_or(&[], |d| d.chunks.as_slice())
    }

    /// Runs extraction and stores the result.
    ///
    /// A new extraction discards the previous translation.
    ///
    /// # Errors
    ///
    /// Propagates [`Orchestrator::summarize`] errors; the stored state is
    /// left unchanged on failure.
    pub async fn summarize(
        &mut self,
        orchestrator: &Orchestrator,
        cancel: &CancellationToken,
    ) -> Result<&ExtractionReport, AgentError> {
        let report = orchestrator.summarize(self.chunks(), cancel).await?;
        self.translation = None;
        Ok(self.extraction.insert(report))
    }

    /// Answers `question` and appends it to the history.
    ///
    /// The history entry is written whatever the outcome; a failure is
    /// recorded as its rendered error text.
    ///
    /// # Errors
    ///
    /// Propagates [`Orchestrator::answer`] errors.
    pub async fn ask(
        &mut self,
        orchestrator: &Orchestrator,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<AnswerReport, AgentError> {
        let result = orchestrator.answer(question, self.chunks(), cancel).await;
        let answer = match &result {
            Ok(report) => report.answer.text().to_string(),
            Err(e) => e.to_string(),
        };
        self.history.push(QaEntry {
            question: question.trim().to_string(),
            answer,
        });
        result
    }

    /// Translates the stored extraction into `language`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] when nothing has been
    /// summarized yet, otherwise propagates translator errors.
    pub async fn translate_summary(
        &mut self,
        orchestrator: &Orchestrator,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<&Translation, AgentError> {
        let Some(extraction) = &self.extraction else {
            return Err(AgentError::Orchestration {
                message: "no summary to translate; summarize the document first".to_string(),
            });
        };
        let text = orchestrator
            .translator()
            .translate(&extraction.merged.to_text(), language, cancel)
            .await?;
        Ok(self.translation.insert(Translation {
            language: language.trim().to_string(),
            text,
        }))
    }
}
