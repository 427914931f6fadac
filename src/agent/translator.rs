//! Translation of result text into a target language.
//!
//! Short texts go out in one call. Longer texts are regrouped on paragraph
//! boundaries into budget-sized pieces translated in order; unlike the
//! extraction pipeline, the first failed piece aborts the whole translation
//! so a partial document is never returned.

use tokio_util::sync::CancellationToken;

use super::client::{CallOptions, LlmClient};
use super::config::AgentConfig;
use super::prompt::build_translation_prompt;
use crate::chunking::group_paragraphs;
use crate::error::AgentError;

/// Translates text with its own, larger attempt budget.
#[derive(Debug, Clone)]
pub struct Translator {
    client: LlmClient,
    template: String,
    single_call_limit: usize,
    chunk_budget: usize,
    options: CallOptions,
}

impl Translator {
    /// Creates a translator sharing `client`'s provider and throttle.
    #[must_use]
    pub fn new(client: &LlmClient, config: &AgentConfig, template: &str) -> Self {
        Self {
            client: client.with_max_attempts(config.translate_max_retries),
            template: template.to_string(),
            single_call_limit: config.translate_single_call_limit,
            chunk_budget: config.translate_chunk_budget,
            options: CallOptions::with_max_tokens(config.translate_max_tokens),
        }
    }

    /// Translates `text` into `language`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] for a blank target language,
    /// [`AgentError::Cancelled`] when `cancel` fires between pieces, and the
    /// first failing piece's error otherwise.
    pub async fn translate(
        &self,
        text: &str,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }
        let language = language.trim();
        if language.is_empty() {
            return Err(AgentError::Orchestration {
                message: "target language cannot be empty".to_string(),
            });
        }

        let instruction = build_translation_prompt(&self.template, language);

        if text.chars().count() < self.single_call_limit {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled {
                    completed: 0,
                    total: 1,
                });
            }
            tracing::info!(language, "translating in a single call");
            let translated = self.client.call(&instruction, Some(text), &self.options).await?;
            return Ok(translated.trim().to_string());
        }

        let groups = group_paragraphs(text, self.chunk_budget);
        tracing::info!(language, pieces = groups.len(), "translating in pieces");

        let mut translated = Vec::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled {
                    completed: i,
                    total: groups.len(),
                });
            }
            match self.client.call(&instruction, Some(group), &self.options).await {
                Ok(piece) => translated.push(piece.trim().to_string()),
                Err(e) => {
                    tracing::error!(piece = i + 1, total = groups.len(), error = %e, "translation aborted");
                    return Err(e);
                }
            }
        }

        Ok(translated.join("\n\n"))
    }
}
