//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use super::schema::ExtractionSchema;
use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::error::AgentError;

/// Default chat-completion endpoint base (Groq's OpenAI-compatible API).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.1;
/// Default max tokens for per-chunk calls.
const DEFAULT_CHUNK_MAX_TOKENS: u32 = 2048;
/// Default max tokens for merge (reduce) calls.
const DEFAULT_MERGE_MAX_TOKENS: u32 = 4096;
/// Default max tokens for translation calls.
const DEFAULT_TRANSLATE_MAX_TOKENS: u32 = 4096;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default attempts per call.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default attempts per translation call.
const DEFAULT_TRANSLATE_MAX_RETRIES: u32 = 6;
/// Default first rate-limit backoff.
const DEFAULT_BACKOFF_BASE_MS: u64 = 2_000;
/// Default rate-limit backoff ceiling.
const DEFAULT_BACKOFF_CEILING_SECS: u64 = 60;
/// Default pause after a non rate-limit failure.
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
/// Default minimum spacing between consecutive requests.
const DEFAULT_REQUEST_DELAY_MS: u64 = 1_000;
/// Texts shorter than this (in characters) are translated in one call.
const DEFAULT_TRANSLATE_SINGLE_CALL_LIMIT: usize = 3_000;
/// Character budget for each regrouped translation chunk.
const DEFAULT_TRANSLATE_CHUNK_BUDGET: usize = 2_500;

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Chat-completion API base URL.
    pub base_url: String,
    /// Model used for every call.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens for per-chunk extraction and answer calls.
    pub chunk_max_tokens: u32,
    /// Maximum tokens for merge calls.
    pub merge_max_tokens: u32,
    /// Maximum tokens for translation calls.
    pub translate_max_tokens: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// Attempts per call before giving up.
    pub max_retries: u32,
    /// Attempts per translation call before giving up.
    pub translate_max_retries: u32,
    /// First backoff after HTTP 429 when no `Retry-After` is supplied.
    pub backoff_base: Duration,
    /// Upper bound on rate-limit backoff.
    pub backoff_ceiling: Duration,
    /// Pause after any other retryable failure.
    pub retry_delay: Duration,
    /// Minimum spacing between consecutive requests.
    ///
    /// Set to `Duration::ZERO` to disable throttling.
    pub request_delay: Duration,
    /// Output contract for extraction runs.
    pub schema: ExtractionSchema,
    /// Chunk window length in characters.
    pub chunk_size: usize,
    /// Overlap between chunk windows in characters.
    pub overlap: usize,
    /// Below this length (characters) translation is a single call.
    pub translate_single_call_limit: usize,
    /// Character budget for each regrouped translation chunk.
    pub translate_chunk_budget: usize,
    /// Directory containing prompt template files.
    ///
    /// When set, prompts are loaded from markdown files in this directory,
    /// falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    chunk_max_tokens: Option<u32>,
    merge_max_tokens: Option<u32>,
    translate_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    translate_max_retries: Option<u32>,
    backoff_base: Option<Duration>,
    backoff_ceiling: Option<Duration>,
    retry_delay: Option<Duration>,
    request_delay: Option<Duration>,
    schema: Option<ExtractionSchema>,
    chunk_size: Option<usize>,
    overlap: Option<usize>,
    translate_single_call_limit: Option<usize>,
    translate_chunk_budget: Option<usize>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("BID_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("GROQ_API_KEY")
                .or_else(|_| std::env::var("BID_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("BID_BASE_URL").ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("BID_MODEL").ok();
        }
        if self.max_retries.is_none() {
            self.max_retries = std::env::var("BID_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.request_delay.is_none() {
            self.request_delay = std::env::var("BID_REQUEST_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("BID_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the per-chunk max tokens.
    #[must_use]
    pub const fn chunk_max_tokens(mut self, n: u32) -> Self {
        self.chunk_max_tokens = Some(n);
        self
    }

    /// Sets the merge max tokens.
    #[must_use]
    pub const fn merge_max_tokens(mut self, n: u32) -> Self {
        self.merge_max_tokens = Some(n);
        self
    }

    /// Sets the translation max tokens.
    #[must_use]
    pub const fn translate_max_tokens(mut self, n: u32) -> Self {
        self.translate_max_tokens = Some(n);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the attempts per call.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Sets the attempts per translation call.
    #[must_use]
    pub const fn translate_max_retries(mut self, n: u32) -> Self {
        self.translate_max_retries = Some(n);
        self
    }

    /// Sets the first rate-limit backoff.
    #[must_use]
    pub const fn backoff_base(mut self, d: Duration) -> Self {
        self.backoff_base = Some(d);
        self
    }

    /// Sets the rate-limit backoff ceiling.
    #[must_use]
    pub const fn backoff_ceiling(mut self, d: Duration) -> Self {
        self.backoff_ceiling = Some(d);
        self
    }

    /// Sets the pause after non rate-limit failures.
    #[must_use]
    pub const fn retry_delay(mut self, d: Duration) -> Self {
        self.retry_delay = Some(d);
        self
    }

    /// Sets the minimum spacing between consecutive requests.
    #[must_use]
    pub const fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    /// Sets the extraction output contract.
    #[must_use]
    pub const fn schema(mut self, schema: ExtractionSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the chunk window length.
    #[must_use]
    pub const fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = Some(n);
        self
    }

    /// Sets the chunk overlap.
    #[must_use]
    pub const fn overlap(mut self, n: usize) -> Self {
        self.overlap = Some(n);
        self
    }

    /// Sets the single-call translation limit.
    #[must_use]
    pub const fn translate_single_call_limit(mut self, n: usize) -> Self {
        self.translate_single_call_limit = Some(n);
        self
    }

    /// Sets the translation chunk budget.
    #[must_use]
    pub const fn translate_chunk_budget(mut self, n: usize) -> Self {
        self.translate_chunk_budget = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Disables every sleep: backoff, retry pause and throttle.
    ///
    /// Intended for tests and offline tooling driving scripted providers.
    #[must_use]
    pub const fn without_delays(self) -> Self {
        self.backoff_base(Duration::ZERO)
            .backoff_ceiling(Duration::ZERO)
            .retry_delay(Duration::ZERO)
            .request_delay(Duration::ZERO)
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            chunk_max_tokens: self.chunk_max_tokens.unwrap_or(DEFAULT_CHUNK_MAX_TOKENS),
            merge_max_tokens: self.merge_max_tokens.unwrap_or(DEFAULT_MERGE_MAX_TOKENS),
            translate_max_tokens: self
                .translate_max_tokens
                .unwrap_or(DEFAULT_TRANSLATE_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES).max(1),
            translate_max_retries: self
                .translate_max_retries
                .unwrap_or(DEFAULT_TRANSLATE_MAX_RETRIES)
                .max(1),
            backoff_base: self
                .backoff_base
                .unwrap_or(Duration::from_millis(DEFAULT_BACKOFF_BASE_MS)),
            backoff_ceiling: self
                .backoff_ceiling
                .unwrap_or(Duration::from_secs(DEFAULT_BACKOFF_CEILING_SECS)),
            retry_delay: self
                .retry_delay
                .unwrap_or(Duration::from_millis(DEFAULT_RETRY_DELAY_MS)),
            request_delay: self
                .request_delay
                .unwrap_or(Duration::from_millis(DEFAULT_REQUEST_DELAY_MS)),
            schema: self.schema.unwrap_or_default(),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            overlap: self.overlap.unwrap_or(DEFAULT_OVERLAP),
            translate_single_call_limit: self
                .translate_single_call_limit
                .unwrap_or(DEFAULT_TRANSLATE_SINGLE_CALL_LIMIT),
            translate_chunk_budget: self
                .translate_chunk_budget
                .unwrap_or(DEFAULT_TRANSLATE_CHUNK_BUDGET),
            prompt_dir: self.prompt_dir,
        })
    }
}
