//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into one vendor round-trip. Retries, backoff and throttling live in
//! [`LlmClient`](super::client::LlmClient), so a provider performs exactly one
//! attempt per call and reports failures as classified [`AgentError`]s.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// Trait for LLM provider backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes one chat completion attempt.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RateLimited`] on HTTP 429,
    /// [`AgentError::Authentication`] on HTTP 401,
    /// [`AgentError::ApiRequest`] on other error statuses,
    /// [`AgentError::EmptyResponse`] when no choice is returned, and
    /// [`AgentError::Transport`] on network or decoding failures.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}
