//! Map-reduce orchestration over document chunks.
//!
//! Both pipelines walk the chunks strictly in document order, one call per
//! chunk, then issue a single combining call:
//!
//! ```text
//! summarize: chunks → per-chunk extraction (map) → consolidation (reduce)
//!            → JSON recovery + field backfill (JSON contract only)
//! answer:    chunks → per-chunk answer (map) → relevance filter
//!            → 0: no answer | 1: verbatim | ≥2: merge call
//! ```
//!
//! Map-phase failures are recorded and skipped; a failed combining call
//! falls back to the first usable map result. Cancellation is checked
//! between chunks.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::client::{CallOptions, LlmClient, create_provider};
use super::config::AgentConfig;
use super::prompt::{PromptSet, build_answer_merge_prompt, build_consolidation_prompt};
use super::provider::LlmProvider;
use super::report::{Answer, AnswerReport, ExtractionReport, MergedResult, PartialResult, SkippedChunk};
use super::schema::{ExtractionSchema, TenderExtraction};
use super::structured::parse_tender_extraction;
use super::translator::Translator;
use crate::chunking::Chunk;
use crate::core::relevance::classify_answer;
use crate::error::{AgentError, is_error_text};

/// Runs extraction and question answering against one provider.
pub struct Orchestrator {
    client: LlmClient,
    config: AgentConfig,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given provider and configuration.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self::with_prompts(provider, config, prompts)
    }

    /// Creates an orchestrator with an explicit prompt set.
    #[must_use]
    pub fn with_prompts(
        provider: Arc<dyn LlmProvider>,
        config: AgentConfig,
        prompts: PromptSet,
    ) -> Self {
        let client = LlmClient::new(provider, &config, prompts.system.as_str());
        Self {
            client,
            config,
            prompts,
        }
    }

    /// Builds the configured provider and an orchestrator around it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
    pub fn from_config(config: AgentConfig) -> Result<Self, AgentError> {
        let provider = create_provider(&config)?;
        Ok(Self::new(provider, config))
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// A translator sharing this orchestrator's provider and throttle.
    #[must_use]
    pub fn translator(&self) -> Translator {
        Translator::new(&self.client, &self.config, &self.prompts.translate)
    }

    /// Extracts tender information from `chunks` by map-reduce.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NoChunks`] for an empty document,
    /// [`AgentError::NoUsableChunks`] when every map call failed,
    /// [`AgentError::Cancelled`] when `cancel` fires between chunks, and
    /// [`AgentError::Authentication`] as soon as the provider rejects the key.
    pub async fn summarize(
        &self,
        chunks: &[Chunk],
        cancel: &CancellationToken,
    ) -> Result<ExtractionReport, AgentError> {
        if chunks.is_empty() {
            return Err(AgentError::NoChunks);
        }

        let start = Instant::now();
        let schema = self.config.schema;
        let (extract, consolidate) = match schema {
            ExtractionSchema::Outline => (
                &self.prompts.extract_outline,
                &self.prompts.consolidate_outline,
            ),
            ExtractionSchema::Json => (&self.prompts.extract_json, &self.prompts.consolidate_json),
        };

        tracing::info!(chunks = chunks.len(), %schema, "starting extraction");

        // Map
        let map_options = CallOptions::with_max_tokens(self.config.chunk_max_tokens);
        let mut partials: Vec<PartialResult> = Vec::with_capacity(chunks.len());
        let mut skipped: Vec<SkippedChunk> = Vec::new();

        for (done, chunk) in chunks.iter().enumerate() {
            Self::check_cancelled(cancel, done, chunks.len())?;

            match self.client.call(extract, Some(&chunk.content), &map_options).await {
                Ok(text) if is_usable(&text) => {
                    tracing::debug!(chunk = chunk.index, len = text.len(), "chunk extracted");
                    partials.push(PartialResult {
                        chunk_index: chunk.index,
                        content: text,
                    });
                }
                Ok(_) => {
                    tracing::warn!(chunk = chunk.index, "chunk returned an unusable reply");
                    skipped.push(SkippedChunk {
                        chunk_index: chunk.index,
                        reason: "Error: empty or error reply from model".to_string(),
                    });
                }
                Err(e @ AgentError::Authentication { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(chunk = chunk.index, error = %e, "skipping chunk");
                    skipped.push(SkippedChunk {
                        chunk_index: chunk.index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if partials.is_empty() {
            return Err(AgentError::NoUsableChunks {
                attempted: chunks.len(),
            });
        }

        // Reduce
        Self::check_cancelled(cancel, chunks.len(), chunks.len())?;
        let prompt =
            build_consolidation_prompt(consolidate, partials.iter().map(|p| p.content.as_str()));
        let merge_options = CallOptions::with_max_tokens(self.config.merge_max_tokens);
        let (raw_text, reduce_fallback) = match self.client.call(&prompt, None, &merge_options).await {
            Ok(text) if is_usable(&text) => (text, false),
            Ok(_) => {
                tracing::warn!("consolidation returned an empty reply; using first partial");
                (partials[0].content.clone(), true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "consolidation failed; using first partial");
                (partials[0].content.clone(), true)
            }
        };

        let (merged, backfilled_fields) = match schema {
            ExtractionSchema::Outline => (MergedResult::Outline(raw_text.trim().to_string()), 0),
            ExtractionSchema::Json => Self::recover_structured(&raw_text, &partials),
        };

        let elapsed = start.elapsed();
        tracing::info!(
            chunks_used = partials.len(),
            skipped = skipped.len(),
            reduce_fallback,
            backfilled_fields,
            elapsed_ms = elapsed.as_millis(),
            "extraction complete"
        );

        Ok(ExtractionReport {
            schema,
            merged,
            raw_text,
            chunks_total: chunks.len(),
            chunks_used: partials.len(),
            skipped,
            reduce_fallback,
            backfilled_fields,
            elapsed,
        })
    }

    /// Parses the reduce reply and restores fields the merge dropped.
    fn recover_structured(raw: &str, partials: &[PartialResult]) -> (MergedResult, usize) {
        let Some(mut extraction) = parse_tender_extraction(raw) else {
            tracing::warn!("merged reply holds no JSON object; returning raw text");
            return (MergedResult::Unparsed(raw.trim().to_string()), 0);
        };

        let parsed: Vec<TenderExtraction> = partials
            .iter()
            .filter_map(|p| parse_tender_extraction(&p.content))
            .collect();
        let best = TenderExtraction::most_complete(&parsed);
        let filled = extraction.backfill_from(&best);
        if filled > 0 {
            tracing::debug!(filled, "backfilled fields dropped by consolidation");
        }

        (MergedResult::Structured(extraction), filled)
    }

    /// Answers `question` from `chunks` by map-reduce with relevance filtering.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyQuestion`] for a blank question,
    /// [`AgentError::NoChunks`] for an empty document,
    /// [`AgentError::Cancelled`] when `cancel` fires between chunks, and
    /// [`AgentError::Authentication`] as soon as the provider rejects the key.
    pub async fn answer(
        &self,
        question: &str,
        chunks: &[Chunk],
        cancel: &CancellationToken,
    ) -> Result<AnswerReport, AgentError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AgentError::EmptyQuestion);
        }
        if chunks.is_empty() {
            return Err(AgentError::NoChunks);
        }

        let start = Instant::now();
        let options = CallOptions::with_max_tokens(self.config.chunk_max_tokens);
        let mut relevant: Vec<(usize, String)> = Vec::new();

        tracing::info!(chunks = chunks.len(), "answering question");

        for (done, chunk) in chunks.iter().enumerate() {
            Self::check_cancelled(cancel, done, chunks.len())?;

            let reply = match self.client.call(question, Some(&chunk.content), &options).await {
                Ok(text) => text,
                Err(e @ AgentError::Authentication { .. }) => return Err(e),
                Err(e) => e.to_string(),
            };

            let relevance = classify_answer(&reply);
            tracing::debug!(chunk = chunk.index, %relevance, "chunk answer classified");
            if relevance.is_relevant() {
                relevant.push((chunk.index, reply.trim().to_string()));
            }
        }

        let relevant_chunks: Vec<usize> = relevant.iter().map(|(i, _)| *i).collect();
        let mut merge_fallback = false;

        let answer = match relevant.as_slice() {
            [] => Answer::NoRelevantInformation,
            [(_, only)] => Answer::Answered(only.clone()),
            [(_, first), ..] => {
                Self::check_cancelled(cancel, chunks.len(), chunks.len())?;
                let answers: Vec<&str> = relevant.iter().map(|(_, a)| a.as_str()).collect();
                let prompt = build_answer_merge_prompt(&self.prompts.merge_answers, question, &answers);
                let merge_options = CallOptions::with_max_tokens(self.config.merge_max_tokens);
                match self.client.call(&prompt, None, &merge_options).await {
                    Ok(text) if is_usable(&text) => Answer::Answered(text.trim().to_string()),
                    outcome => {
                        if let Err(e) = outcome {
                            tracing::warn!(error = %e, "answer merge failed; using first answer");
                        }
                        merge_fallback = true;
                        Answer::Answered(first.clone())
                    }
                }
            }
        };

        let elapsed = start.elapsed();
        tracing::info!(
            relevant = relevant_chunks.len(),
            merge_fallback,
            elapsed_ms = elapsed.as_millis(),
            "question answered"
        );

        Ok(AnswerReport {
            question: question.to_string(),
            answer,
            chunks_total: chunks.len(),
            relevant_chunks,
            merge_fallback,
            elapsed,
        })
    }

    fn check_cancelled(
        cancel: &CancellationToken,
        completed: usize,
        total: usize,
    ) -> Result<(), AgentError> {
        if cancel.is_cancelled() {
            tracing::warn!(completed, total, "run cancelled");
            return Err(AgentError::Cancelled { completed, total });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("client", &self.client)
            .field("schema", &self.config.schema)
            .finish_non_exhaustive()
    }
}

/// A reply the pipeline can carry forward.
fn is_usable(text: &str) -> bool {
    !text.trim().is_empty() && !is_error_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::{CONSOLIDATE_JSON_PROMPT, MERGE_ANSWERS_PROMPT};
    use crate::agent::providers::scripted::ScriptedProvider;
    use crate::agent::schema::NOT_MENTIONED;
    use crate::chunking::split;

    fn config(schema: ExtractionSchema) -> AgentConfig {
        AgentConfig::builder()
            .api_key("test")
            .schema(schema)
            .without_delays()
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    fn orchestrator(provider: &Arc<ScriptedProvider>, schema: ExtractionSchema) -> Orchestrator {
        Orchestrator::with_prompts(provider.clone(), config(schema), PromptSet::defaults())
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| Chunk {
                index,
                content: (*t).to_string(),
            })
            .collect()
    }

    fn is_merge(user: &str, template: &str) -> bool {
        user.starts_with(template.trim_end())
    }

    #[tokio::test]
    async fn test_extraction_completeness() {
        // Each chunk supplies one field; the consolidation reply drops two.
        let provider = Arc::new(ScriptedProvider::from_fn(|req| {
            let user = &req.messages[1].content;
            let reply = if is_merge(user, CONSOLIDATE_JSON_PROMPT) {
                r#"{"basic_information": {"tender_number_reference": "PWD/2024/117"}}"#
            } else if user.starts_with("chunk one") {
                r#"{"basic_information": {"tender_number_reference": "PWD/2024/117"}}"#
            } else if user.starts_with("chunk two") {
                r#"Here you go: {"financial_details": {"emd_earnest_money_deposit": "Rs 2,50,000"}}"#
            } else {
                r#"{"timeline": {"contract_duration": "18 months"}}"#
            };
            Ok(reply.to_string())
        }));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .summarize(
                &chunks(&["chunk one", "chunk two", "chunk three"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(provider.calls(), 4);
        let ex = report.merged.structured().cloned().unwrap_or_default();
        assert_eq!(
            ex.get("basic_information", "tender_number_reference"),
            Some("PWD/2024/117")
        );
        assert_eq!(
            ex.get("financial_details", "emd_earnest_money_deposit"),
            Some("Rs 2,50,000")
        );
        assert_eq!(ex.get("timeline", "contract_duration"), Some("18 months"));
        assert_eq!(ex.get("requirements", "payment_terms"), Some(NOT_MENTIONED));
        assert_eq!(ex.populated_count(), 3);
        assert_eq!(report.backfilled_fields, 2);
        assert!(!report.reduce_fallback);
    }

    #[tokio::test]
    async fn test_consolidation_prompt_numbers_sections_in_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("alpha".to_string()),
            Ok("beta".to_string()),
            Ok("merged outline".to_string()),
        ]));
        let orch = orchestrator(&provider, ExtractionSchema::Outline);

        let report = orch
            .summarize(&chunks(&["a", "b"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(report.merged, MergedResult::Outline("merged outline".to_string()));
        let merge = provider.user_messages().pop().unwrap_or_default();
        assert!(merge.contains("Section 1:\nalpha\n\nSection 2:\nbeta"));
    }

    #[tokio::test]
    async fn test_failed_chunk_is_skipped() {
        let provider = Arc::new(ScriptedProvider::from_fn(|req| {
            let user = &req.messages[1].content;
            if user.starts_with("bad") {
                Err(AgentError::ApiRequest {
                    message: "bad gateway".to_string(),
                    status: Some(502),
                })
            } else {
                Ok(format!("outline for {}", &user[..4]))
            }
        }));
        let orch = orchestrator(&provider, ExtractionSchema::Outline);

        let report = orch
            .summarize(&chunks(&["good", "bad!", "good"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(report.chunks_total, 3);
        assert_eq!(report.chunks_used, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].chunk_index, 1);
        assert!(report.skipped[0].reason.starts_with("Error"));
        // 3 attempts on the failing chunk, one each on the others, one merge.
        assert_eq!(provider.calls(), 3 + 2 + 1);
    }

    #[tokio::test]
    async fn test_single_surviving_partial_is_still_reduced() {
        let provider = Arc::new(ScriptedProvider::from_fn(|req| {
            let user = &req.messages[1].content;
            if is_merge(user, CONSOLIDATE_JSON_PROMPT) {
                Ok(r#"{"basic_information": {"tender_number_reference": "PWD/2024/117"}}"#
                    .to_string())
            } else if user.starts_with("bad") {
                Err(AgentError::ApiRequest {
                    message: "internal server error".to_string(),
                    status: Some(500),
                })
            } else {
                Ok(r#"Found: {"basic_information": {"tender_number_reference": "PWD/2024/117"}} done"#
                    .to_string())
            }
        }));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .summarize(&chunks(&["good", "bad"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        // One call for the good chunk, three attempts on the bad one, one merge.
        assert_eq!(provider.calls(), 1 + 3 + 1);
        assert_eq!(report.chunks_used, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(!report.reduce_fallback);
        assert!(report.raw_text.starts_with('{'));
        let merge = provider.user_messages().pop().unwrap_or_default();
        assert!(merge.contains("Section 1:"));
        assert!(!merge.contains("Section 2:"));
    }

    #[tokio::test]
    async fn test_single_partial_reduce_failure_falls_back() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("- Tender Number/Reference: PWD/2024/117".to_string()),
            Ok("   ".to_string()),
        ]));
        let orch = orchestrator(&provider, ExtractionSchema::Outline);

        let report = orch
            .summarize(&chunks(&["only chunk"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(provider.calls(), 2);
        assert!(report.reduce_fallback);
        assert_eq!(
            report.merged,
            MergedResult::Outline("- Tender Number/Reference: PWD/2024/117".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_usable_chunks() {
        let provider = Arc::new(ScriptedProvider::from_fn(|_| Err(AgentError::EmptyResponse)));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let result = orch
            .summarize(&chunks(&["x", "y"]), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(AgentError::NoUsableChunks { attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_reduce_failure_falls_back_to_first_partial() {
        let provider = Arc::new(ScriptedProvider::from_fn(|req| {
            let user = &req.messages[1].content;
            if is_merge(user, CONSOLIDATE_JSON_PROMPT) {
                Err(AgentError::Transport {
                    message: "connection reset".to_string(),
                })
            } else if user.starts_with("first") {
                Ok(r#"{"timeline": {"contract_duration": "12 months"}}"#.to_string())
            } else {
                Ok(r#"{"timeline": {"technical_bid_opening": "16-03-2024"}}"#.to_string())
            }
        }));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .summarize(&chunks(&["first", "second"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert!(report.reduce_fallback);
        assert!(report.raw_text.contains("12 months"));
        let ex = report.merged.structured().cloned().unwrap_or_default();
        assert_eq!(ex.get("timeline", "contract_duration"), Some("12 months"));
        assert_eq!(ex.get("timeline", "technical_bid_opening"), Some("16-03-2024"));
    }

    #[tokio::test]
    async fn test_unparseable_merge_is_surfaced_raw() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("Road works on NH-44.".to_string()),
            Ok("The tender is for road works.".to_string()),
        ]));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .summarize(&chunks(&["only chunk"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(provider.calls(), 2);
        assert!(!report.reduce_fallback);
        assert_eq!(
            report.merged,
            MergedResult::Unparsed("The tender is for road works.".to_string())
        );
    }

    #[tokio::test]
    async fn test_authentication_aborts_run() {
        let provider = Arc::new(ScriptedProvider::from_fn(|_| {
            Err(AgentError::Authentication {
                message: "Invalid API Key".to_string(),
            })
        }));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let result = orch
            .summarize(&chunks(&["a", "b", "c"]), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(AgentError::Authentication { .. })));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_chunk() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let orch = orchestrator(&provider, ExtractionSchema::Json);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = orch.summarize(&chunks(&["a", "b"]), &cancel).await;

        assert!(matches!(
            result,
            Err(AgentError::Cancelled {
                completed: 0,
                total: 2
            })
        ));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_qa_relevance_filter() {
        let provider = Arc::new(ScriptedProvider::from_fn(|req| {
            let user = &req.messages[1].content;
            let reply = if is_merge(user, MERGE_ANSWERS_PROMPT.split('{').next().unwrap_or("")) {
                "The EMD is Rs 2,50,000, payable by demand draft."
            } else if user.starts_with("c1") {
                "The EMD is Rs 2,50,000 as per clause 4."
            } else if user.starts_with("c3") {
                "EMD must be paid by demand draft in favour of the EE."
            } else {
                "The EMD is not mentioned in this section."
            };
            Ok(reply.to_string())
        }));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .answer(
                "What is the EMD?",
                &chunks(&["c0", "c1", "c2", "c3", "c4"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(provider.calls(), 6);
        assert_eq!(report.relevant_chunks, vec![1, 3]);
        let merge = provider.user_messages().pop().unwrap_or_default();
        assert!(merge.contains("Rs 2,50,000 as per clause 4"));
        assert!(merge.contains("demand draft in favour of the EE"));
        assert!(!merge.contains("not mentioned"));
        assert_eq!(
            report.answer,
            Answer::Answered("The EMD is Rs 2,50,000, payable by demand draft.".to_string())
        );
    }

    #[tokio::test]
    async fn test_qa_zero_relevant() {
        let provider = Arc::new(ScriptedProvider::from_fn(|_| {
            Ok("Not found in the provided text.".to_string())
        }));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .answer("Who is the engineer?", &chunks(&["a", "b", "c"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(report.answer, Answer::NoRelevantInformation);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_qa_single_relevant_skips_merge() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("short".to_string()),
            Ok("Bids close on 15 March 2024 at 3 PM.".to_string()),
            Ok(AgentError::EmptyResponse.to_string()),
        ]));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .answer("Deadline?", &chunks(&["a", "b", "c"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(provider.calls(), 3);
        assert_eq!(
            report.answer,
            Answer::Answered("Bids close on 15 March 2024 at 3 PM.".to_string())
        );
    }

    #[tokio::test]
    async fn test_qa_merge_failure_uses_first_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("Completion period is 18 months.".to_string()),
            Ok("Work must finish within 540 days.".to_string()),
            Err(AgentError::Authentication {
                message: "revoked".to_string(),
            }),
        ]));
        let orch = orchestrator(&provider, ExtractionSchema::Json);

        let report = orch
            .answer("Duration?", &chunks(&["a", "b"]), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert!(report.merge_fallback);
        assert_eq!(
            report.answer,
            Answer::Answered("Completion period is 18 months.".to_string())
        );
    }

    #[tokio::test]
    async fn test_qa_input_validation() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let orch = orchestrator(&provider, ExtractionSchema::Json);
        let cancel = CancellationToken::new();

        let empty_q = orch.answer("   ", &chunks(&["a"]), &cancel).await;
        assert!(matches!(empty_q, Err(AgentError::EmptyQuestion)));

        let no_chunks = orch.answer("EMD?", &[], &cancel).await;
        assert!(matches!(no_chunks, Err(AgentError::NoChunks)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_summarize_real_chunks() {
        let text = "Tender notice. ".repeat(40);
        let doc_chunks = split(&text, 200, 20).unwrap_or_default();
        assert!(doc_chunks.len() > 2);
        let provider = Arc::new(ScriptedProvider::from_fn(|_| Ok("outline".to_string())));
        let orch = orchestrator(&provider, ExtractionSchema::Outline);

        let report = orch
            .summarize(&doc_chunks, &CancellationToken::new())
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(report.chunks_used, doc_chunks.len());
        assert_eq!(provider.calls(), doc_chunks.len() + 1);
    }
}
