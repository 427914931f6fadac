//! Provider registry and the retrying LLM client.
//!
//! [`create_provider`] maps provider names to concrete [`LlmProvider`]
//! implementations. [`LlmClient`] wraps a provider with the request policy
//! every orchestrator shares: a fixed system persona, throttled sends, and
//! bounded retries with rate-limit backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatRequest, compose_user_content, system_message, user_message};
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::agent::throttle::Throttle;
use crate::error::AgentError;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openai"` (default): any OpenAI-compatible chat-completion API,
///   Groq included
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.as_str() {
        "openai" | "groq" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}

/// Attempt budget and sleep schedule for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least one.
    pub max_attempts: u32,
    /// First rate-limit backoff; doubles per attempt.
    pub backoff_base: Duration,
    /// Upper bound on rate-limit backoff.
    pub backoff_ceiling: Duration,
    /// Pause after any other retryable failure.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// Builds the policy from configuration.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            backoff_base: config.backoff_base,
            backoff_ceiling: config.backoff_ceiling,
            retry_delay: config.retry_delay,
        }
    }

    /// Exponential rate-limit backoff for a 0-based attempt, capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_ceiling)
    }

    /// How long to sleep after `error` on a 0-based attempt.
    ///
    /// A server `Retry-After` replaces the computed backoff but never
    /// exceeds the ceiling.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &AgentError) -> Duration {
        match error {
            AgentError::RateLimited { retry_after, .. } => retry_after
                .map_or_else(|| self.backoff(attempt), |d| d.min(self.backoff_ceiling)),
            _ => self.retry_delay,
        }
    }
}

/// Per-call request options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    /// Overrides the configured model.
    pub model: Option<String>,
    /// Overrides the configured temperature.
    pub temperature: Option<f32>,
    /// Token budget for the reply.
    pub max_tokens: Option<u32>,
}

impl CallOptions {
    /// Options with only a token budget.
    #[must_use]
    pub const fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            model: None,
            temperature: None,
            max_tokens: Some(max_tokens),
        }
    }
}

/// Retrying, throttled chat client with a fixed system persona.
///
/// Clones share the provider and the throttle, so requests issued through
/// any clone are spaced against each other.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    throttle: Arc<Throttle>,
    policy: RetryPolicy,
    system_prompt: Arc<str>,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider.name())
            .field("policy", &self.policy)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Wraps an existing provider.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: &AgentConfig,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            provider,
            throttle: Arc::new(Throttle::new(config.request_delay)),
            policy: RetryPolicy::from_config(config),
            system_prompt: system_prompt.into(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Builds the configured provider and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedProvider`] or a provider construction
    /// error.
    pub fn from_config(
        config: &AgentConfig,
        system_prompt: impl Into<Arc<str>>,
    ) -> Result<Self, AgentError> {
        Ok(Self::new(create_provider(config)?, config, system_prompt))
    }

    /// Returns a client with a different attempt budget sharing this
    /// client's provider and throttle.
    #[must_use]
    pub fn with_max_attempts(&self, max_attempts: u32) -> Self {
        let mut client = self.clone();
        client.policy.max_attempts = max_attempts.max(1);
        client
    }

    /// Sends one instruction with optional context and returns the reply.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Authentication`] immediately on HTTP 401, the
    /// underlying error for other non-retryable failures, and
    /// [`AgentError::RetriesExhausted`] once every attempt has failed.
    pub async fn call(
        &self,
        instruction: &str,
        context: Option<&str>,
        options: &CallOptions,
    ) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: options.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: vec![
                system_message(&self.system_prompt),
                user_message(&compose_user_content(instruction, context)),
            ],
            temperature: Some(options.temperature.unwrap_or(self.temperature)),
            max_tokens: options.max_tokens,
        };

        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            self.throttle.wait().await;
            let started = Instant::now();
            tracing::debug!(
                provider = self.provider.name(),
                attempt = attempt + 1,
                max_attempts = attempts,
                "sending chat request"
            );

            match self.provider.chat(&request).await {
                Ok(response) => {
                    tracing::debug!(
                        attempt = attempt + 1,
                        elapsed_ms = started.elapsed().as_millis(),
                        total_tokens = response.usage.total_tokens,
                        "chat request succeeded"
                    );
                    if response.finish_reason.as_deref() == Some("length") {
                        tracing::warn!(
                            max_tokens = ?request.max_tokens,
                            "reply truncated at the token limit"
                        );
                    }
                    return Ok(response.content);
                }
                Err(e) if !e.is_retryable() => {
                    tracing::error!(attempt = attempt + 1, error = %e, "non-retryable failure");
                    return Err(e);
                }
                Err(e) => {
                    if attempt + 1 < attempts {
                        let delay = self.policy.delay_for(attempt, &e);
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis(),
                            error = %e,
                            "retryable failure"
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        let source = last_error.unwrap_or(AgentError::EmptyResponse);
        tracing::error!(attempts, error = %source, "retries exhausted");
        Err(AgentError::RetriesExhausted {
            attempts,
            source: Box::new(source),
        })
    }
}
