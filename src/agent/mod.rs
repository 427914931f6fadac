//! LLM layer: client, orchestrators and translation.
//!
//! Every model call goes through [`LlmClient`], which applies the request
//! throttle and the retry policy on top of a pluggable [`LlmProvider`]
//! speaking the OpenAI-compatible chat-completion protocol.
//!
//! # Architecture
//!
//! ```text
//! Document chunks → Orchestrator
//!   ├── summarize: map each chunk → partial extraction
//!   │     └── reduce partials → merged result (+ JSON recovery/backfill)
//!   ├── answer: map each chunk → reply → relevance filter
//!   │     └── merge relevant replies → final answer
//!   └── Translator: paragraph-grouped, fail-fast translation
//! ```

pub mod client;
pub mod config;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod report;
pub mod schema;
pub mod structured;
pub mod throttle;
pub mod translator;

pub use client::{CallOptions, LlmClient, RetryPolicy, create_provider};
pub use config::AgentConfig;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::Orchestrator;
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use report::{Answer, AnswerReport, ExtractionReport, MergedResult, SkippedChunk};
pub use schema::{ExtractionSchema, TenderExtraction};
pub use translator::Translator;
